use homemap_index::PathIndex;
use homemap_protocol::ChildEntry;
use std::collections::BTreeMap;

/// Read-only query engine over a [`PathIndex`].
///
/// Keeps the index positions sorted by path so prefix listing is a binary
/// search plus a scan of the matching range, and a lowercase copy of every
/// path for case-insensitive substring search.
pub struct SearchEngine<'a> {
    index: &'a PathIndex,
    sorted: Vec<usize>,
    lowered: Vec<String>,
}

impl<'a> SearchEngine<'a> {
    pub fn build(index: &'a PathIndex) -> Self {
        let records = index.records();
        let mut sorted: Vec<usize> = (0..records.len()).collect();
        sorted.sort_unstable_by(|&a, &b| records[a].path.cmp(&records[b].path));
        let lowered = records.iter().map(|r| r.path.to_lowercase()).collect();

        log::debug!("Search engine built over {} paths", records.len());
        Self {
            index,
            sorted,
            lowered,
        }
    }

    pub fn index(&self) -> &'a PathIndex {
        self.index
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains(path)
    }

    fn path(&self, position: usize) -> &'a str {
        self.index.records()[position].path.as_str()
    }

    /// Index positions whose path starts with `prefix`, in sorted-path order.
    fn prefix_range(&self, prefix: &str) -> impl Iterator<Item = usize> + '_ {
        let start = self
            .sorted
            .partition_point(|&pos| self.path(pos) < prefix);
        let prefix = prefix.to_string();
        self.sorted[start..]
            .iter()
            .copied()
            .take_while(move |&pos| self.path(pos).starts_with(prefix.as_str()))
    }

    /// Every path starting with `prefix` (case-sensitive), in index order.
    pub fn list_prefix(&self, prefix: &str) -> Vec<&'a str> {
        let mut positions: Vec<usize> = self.prefix_range(prefix).collect();
        positions.sort_unstable();
        positions.into_iter().map(|pos| self.path(pos)).collect()
    }

    /// Names directly under `folder`, sorted by name.
    ///
    /// `""` is the root. A name is a leaf unless some indexed path lies
    /// strictly below `folder/name`.
    pub fn list_immediate_children(&self, folder: &str) -> Vec<ChildEntry> {
        let base = folder_prefix(folder);
        let mut children: BTreeMap<&'a str, bool> = BTreeMap::new();

        for pos in self.prefix_range(&base) {
            let rest = &self.path(pos)[base.len()..];
            let (name, is_leaf) = match rest.split_once('/') {
                Some((name, _)) => (name, false),
                None => (rest, true),
            };
            if name.is_empty() {
                continue;
            }
            children
                .entry(name)
                .and_modify(|leaf| *leaf &= is_leaf)
                .or_insert(is_leaf);
        }

        children
            .into_iter()
            .map(|(name, is_leaf)| ChildEntry {
                name: name.to_string(),
                is_leaf,
            })
            .collect()
    }

    /// Up to `limit` paths containing `term`, ignoring case, in index order.
    pub fn substring_search(&self, term: &str, limit: usize) -> Vec<&'a str> {
        if limit == 0 {
            return Vec::new();
        }
        let needle = term.to_lowercase();
        self.lowered
            .iter()
            .enumerate()
            .filter(|(_, path)| path.contains(needle.as_str()))
            .take(limit)
            .map(|(pos, _)| self.path(pos))
            .collect()
    }
}

/// `folder` as a listing prefix: root stays empty, otherwise one trailing `/`.
pub(crate) fn folder_prefix(folder: &str) -> String {
    if folder.is_empty() || folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{folder}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homemap_index::IndexRecord;
    use pretty_assertions::assert_eq;

    fn index(paths: &[&str]) -> PathIndex {
        PathIndex::from_records(
            paths
                .iter()
                .enumerate()
                .map(|(i, p)| IndexRecord::new(*p, i as u32, 1))
                .collect(),
        )
    }

    fn child(name: &str, is_leaf: bool) -> ChildEntry {
        ChildEntry {
            name: name.to_string(),
            is_leaf,
        }
    }

    #[test]
    fn list_prefix_keeps_index_order() {
        let index = index(&["src/b.txt", "docs/readme.md", "src/a.txt"]);
        let engine = SearchEngine::build(&index);
        assert_eq!(engine.list_prefix("src/"), vec!["src/b.txt", "src/a.txt"]);
        assert_eq!(engine.list_prefix("src/a.txt"), vec!["src/a.txt"]);
        assert!(engine.list_prefix("lib").is_empty());
        assert!(engine.list_prefix("SRC").is_empty());
        assert_eq!(engine.list_prefix("").len(), 3);
    }

    #[test]
    fn children_mark_folders_and_leaves() {
        let index = index(&["src/a.txt", "src/sub/x.rs", "src/sub", "docs/readme.md", "top"]);
        let engine = SearchEngine::build(&index);

        assert_eq!(
            engine.list_immediate_children(""),
            vec![child("docs", false), child("src", false), child("top", true)]
        );
        assert_eq!(
            engine.list_immediate_children("src"),
            vec![child("a.txt", true), child("sub", false)]
        );
        assert_eq!(engine.list_immediate_children("src/"), engine.list_immediate_children("src"));
        assert!(engine.list_immediate_children("src/a.txt").is_empty());
        assert!(engine.list_immediate_children("nope").is_empty());
    }

    #[test]
    fn empty_segments_are_not_children() {
        let index = index(&["a//b", "/abs/path"]);
        let engine = SearchEngine::build(&index);
        assert!(engine.list_immediate_children("a").is_empty());
        assert_eq!(engine.list_immediate_children("/"), vec![child("abs", false)]);
    }

    #[test]
    fn substring_search_is_case_insensitive_and_limited() {
        let index = index(&["Src/Main.rs", "docs/MAIN.md", "lib/util.rs"]);
        let engine = SearchEngine::build(&index);
        assert_eq!(engine.substring_search("main", 10), vec!["Src/Main.rs", "docs/MAIN.md"]);
        assert_eq!(engine.substring_search("main", 1), vec!["Src/Main.rs"]);
        assert!(engine.substring_search("main", 0).is_empty());
        assert_eq!(engine.substring_search("", 2).len(), 2);
    }

    #[test]
    fn empty_index_answers_empty() {
        let index = PathIndex::default();
        let engine = SearchEngine::build(&index);
        assert!(engine.is_empty());
        assert!(engine.list_prefix("a").is_empty());
        assert!(engine.list_immediate_children("").is_empty());
        assert!(engine.substring_search("a", 5).is_empty());
    }
}
