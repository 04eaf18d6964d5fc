use crate::engine::SearchEngine;
use homemap_index::{PathIndex, TagIndex};
use homemap_protocol::{Comparison, DirCount, SourceSummary};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Segments of a path that identify its region.
const GROUP_DEPTH: usize = 2;
const TOP_DIRS: usize = 5;

fn group_key(path: &str) -> String {
    let key = path
        .split('/')
        .filter(|s| !s.is_empty())
        .take(GROUP_DEPTH)
        .collect::<Vec<_>>()
        .join("/");
    if key.is_empty() {
        "/".to_string()
    } else {
        key
    }
}

/// Count paths and tags, and find the most populated regions.
pub fn summarize(engine: &SearchEngine<'_>, tags: Option<&TagIndex>) -> SourceSummary {
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    for path in engine.index().paths() {
        *groups.entry(group_key(path)).or_default() += 1;
    }

    let mut largest_dirs: Vec<DirCount> = groups
        .into_iter()
        .map(|(dir, count)| DirCount { dir, count })
        .collect();
    // Groups arrive sorted by name, so the stable sort breaks ties by name.
    largest_dirs.sort_by(|a, b| b.count.cmp(&a.count));
    largest_dirs.truncate(TOP_DIRS);

    SourceSummary {
        path_count: engine.len(),
        tag_count: tags.map_or(0, TagIndex::tag_count),
        largest_dirs,
    }
}

/// Plain-text description of a summary.
pub fn explain(summary: &SourceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "This source contains {} indexed paths.", summary.path_count);
    let _ = writeln!(out, "It uses {} semantic tags.", summary.tag_count);

    if !summary.largest_dirs.is_empty() {
        out.push_str("\nMajor structural regions:\n");
        for dir in &summary.largest_dirs {
            let _ = writeln!(out, "  {}/ ({} items)", dir.dir.trim_end_matches('/'), dir.count);
        }
    }

    out.push('\n');
    if summary.tag_count > 0 {
        out.push_str("Tags describe semantic groupings over paths.\n");
    } else {
        out.push_str("No semantic tags were detected in this source.\n");
    }
    out
}

/// Count paths in each source and how many they share.
pub fn compare(a_name: &str, a: &PathIndex, b_name: &str, b: &PathIndex) -> Comparison {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let shared = small.paths().filter(|p| large.contains(p)).count();
    Comparison {
        a_name: a_name.to_string(),
        b_name: b_name.to_string(),
        a_paths: a.len(),
        b_paths: b.len(),
        shared,
    }
}

pub fn describe_comparison(comparison: &Comparison) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Comparison between {} and {}:\n",
        comparison.a_name, comparison.b_name
    );
    let _ = writeln!(out, "  {} paths: {}", comparison.a_name, comparison.a_paths);
    let _ = writeln!(out, "  {} paths: {}", comparison.b_name, comparison.b_paths);
    let _ = writeln!(out, "  Shared paths: {}", comparison.shared);
    out
}

/// Paths present in both indexes, in `a`'s order.
pub fn shared_paths<'a>(a: &'a PathIndex, b: &PathIndex) -> Vec<&'a str> {
    a.paths().filter(|p| b.contains(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use homemap_index::IndexRecord;
    use pretty_assertions::assert_eq;

    fn index(paths: &[&str]) -> PathIndex {
        PathIndex::from_records(paths.iter().map(|p| IndexRecord::new(*p, 0, 0)).collect())
    }

    fn dir(dir: &str, count: usize) -> DirCount {
        DirCount {
            dir: dir.to_string(),
            count,
        }
    }

    #[test]
    fn groups_by_first_two_segments() {
        let index = index(&[
            "/home/u/a",
            "/home/u/b",
            "/home/v/c",
            "etc/x",
            "top",
            "/",
        ]);
        let engine = SearchEngine::build(&index);
        let tags = TagIndex::parse(b"t\t/home/u/a\n");
        let summary = summarize(&engine, Some(&tags));

        assert_eq!(summary.path_count, 6);
        assert_eq!(summary.tag_count, 1);
        assert_eq!(
            summary.largest_dirs,
            vec![
                dir("home/u", 2),
                dir("/", 1),
                dir("etc/x", 1),
                dir("home/v", 1),
                dir("top", 1),
            ]
        );
    }

    #[test]
    fn explain_mentions_regions_and_tags() {
        let summary = SourceSummary {
            path_count: 3,
            tag_count: 0,
            largest_dirs: vec![dir("src", 3)],
        };
        let text = explain(&summary);
        assert!(text.contains("3 indexed paths"));
        assert!(text.contains("  src/ (3 items)"));
        assert!(text.contains("No semantic tags"));
    }

    #[test]
    fn compare_counts_shared_paths() {
        let a = index(&["x", "y", "z"]);
        let b = index(&["y", "z", "w", "v"]);
        let comparison = compare("left", &a, "right", &b);
        assert_eq!(
            comparison,
            Comparison {
                a_name: "left".to_string(),
                b_name: "right".to_string(),
                a_paths: 3,
                b_paths: 4,
                shared: 2,
            }
        );
        assert_eq!(shared_paths(&a, &b), vec!["y", "z"]);
        assert!(describe_comparison(&comparison).contains("Shared paths: 2"));
    }
}
