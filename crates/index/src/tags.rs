use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Multimap from tag to the paths carrying it.
///
/// A path may carry many tags and a tag may cover many paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagIndex {
    tags: BTreeMap<String, BTreeSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `tag<TAB>path` lines.
    ///
    /// Each trimmed, non-empty line is split on its first tab. Lines without a
    /// tab or with an empty side are skipped; tag sources are hand-edited and
    /// noisy, so this is not an error.
    pub fn parse(buffer: &[u8]) -> Self {
        let text = String::from_utf8_lossy(buffer);
        let mut index = Self::new();
        let mut skipped = 0usize;

        for line in text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once('\t') {
                Some((tag, path)) if !tag.is_empty() && !path.is_empty() => {
                    index.insert(tag, path);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::trace!("Skipped {skipped} malformed tag lines");
        }
        index
    }

    /// Returns `true` when the pair was not present yet.
    pub fn insert(&mut self, tag: impl Into<String>, path: impl Into<String>) -> bool {
        self.tags.entry(tag.into()).or_default().insert(path.into())
    }

    pub fn paths_for(&self, tag: &str) -> impl Iterator<Item = &str> + '_ {
        self.tags
            .get(tag)
            .into_iter()
            .flat_map(|paths| paths.iter().map(String::as_str))
    }

    /// Tags attached to `path`. Linear in the number of tags.
    pub fn tags_for(&self, path: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(_, paths)| paths.contains(path))
            .map(|(tag, _)| tag.as_str())
            .collect()
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.tags.iter().map(|(tag, paths)| (tag.as_str(), paths.len()))
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Number of distinct `(tag, path)` pairs.
    pub fn len(&self) -> usize {
        self.tags.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
