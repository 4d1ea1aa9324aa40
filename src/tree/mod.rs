pub mod filter;
pub mod impute;
pub mod model;

use std::collections::HashSet;

use compact_str::CompactString;

pub use self::model::{last_segment, Node, Tree, PATH_SEPARATOR};
use self::model::SYNTHETIC_ROOT_KEY;
use crate::error::{Result, TreemapError};
use crate::input::types::{DuplicatePolicy, Record};

/// Build a Tree from a flat list of records (from an input adapter).
///
/// Every path prefix becomes a node; prefixes without their own record are
/// synthesized as zero-size placeholders. Several top-level segments get a
/// synthetic root parenting all of them.
pub fn build_tree(records: &[Record], policy: DuplicatePolicy) -> Result<Tree> {
    if records.is_empty() {
        return Err(TreemapError::EmptyInput);
    }

    let mut tree = Tree::default();
    let mut recorded: HashSet<CompactString> = HashSet::with_capacity(records.len());
    let mut has_parent: HashSet<CompactString> = HashSet::new();
    let mut top_level: Vec<CompactString> = Vec::new();
    let mut top_level_seen: HashSet<CompactString> = HashSet::new();

    for (idx, record) in records.iter().enumerate() {
        if !(record.size.is_finite() && record.size >= 0.0) {
            return Err(TreemapError::malformed(
                idx + 1,
                format!("size {} of `{}` is not a non-negative number", record.size, record.path),
            ));
        }
        if !record.heat.is_finite() {
            return Err(TreemapError::malformed(
                idx + 1,
                format!("heat {} of `{}` is not finite", record.heat, record.path),
            ));
        }
        let segments: Vec<&str> = record
            .path
            .split(PATH_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            return Err(TreemapError::malformed(
                idx + 1,
                format!("path `{}` has no segments", record.path),
            ));
        }
        let path = CompactString::from(segments.join("/"));

        if recorded.contains(&path) {
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(TreemapError::DuplicatePath {
                        path: path.to_string(),
                    });
                }
                DuplicatePolicy::Merge => {
                    if let Some(existing) = tree.nodes.get_mut(&path) {
                        merge_record(existing, record);
                    }
                }
            }
        } else {
            recorded.insert(path.clone());
            // May upgrade a placeholder created by an earlier, longer path.
            let node = tree
                .nodes
                .entry(path.clone())
                .or_insert_with(|| Node::placeholder(&path));
            node.size = record.size;
            node.heat = record.heat;
            node.has_heat = record.has_heat;
        }

        let first = CompactString::new(segments[0]);
        if top_level_seen.insert(first.clone()) {
            top_level.push(first.clone());
        }

        let mut parent = first;
        for segment in &segments[1..] {
            let mut child = parent.clone();
            child.push(PATH_SEPARATOR);
            child.push_str(segment);

            tree.nodes
                .entry(parent.clone())
                .or_insert_with(|| Node::placeholder(&parent));
            tree.to.entry(parent).or_default().push(child.clone());
            has_parent.insert(child.clone());

            parent = child;
        }
    }

    for children in tree.to.values_mut() {
        dedup_stable(children);
    }

    let roots: Vec<CompactString> = top_level
        .into_iter()
        .filter(|p| !has_parent.contains(p))
        .collect();

    match roots.len() {
        0 => return Err(TreemapError::CyclicInput),
        1 => tree.root = roots[0].clone(),
        n => {
            tracing::debug!("{} top-level roots, adding synthetic root", n);
            let root = CompactString::new(SYNTHETIC_ROOT_KEY);
            tree.nodes.insert(root.clone(), Node::synthetic_root());
            tree.to.insert(root.clone(), roots);
            tree.root = root;
        }
    }

    tracing::info!(
        "Tree built from {} records: {} nodes, root '{}'{}",
        records.len(),
        tree.len(),
        tree.root,
        if tree.has_synthetic_root() { " (synthetic)" } else { "" }
    );

    Ok(tree)
}

/// Additive merge of a repeated record: sizes sum, heat keeps the max of the
/// measured values, `has_heat` is OR'd.
fn merge_record(existing: &mut Node, record: &Record) {
    existing.size += record.size;
    existing.heat = match (existing.has_heat, record.has_heat) {
        (true, true) => existing.heat.max(record.heat),
        (false, true) => record.heat,
        _ => existing.heat,
    };
    existing.has_heat |= record.has_heat;
}

/// Remove repeated entries, first occurrence wins.
fn dedup_stable(items: &mut Vec<CompactString>) {
    let mut seen = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[(&str, f64)]) -> Vec<Record> {
        rows.iter().map(|(p, s)| Record::sized(p, *s)).collect()
    }

    #[test]
    fn two_leaves_under_one_root() {
        let input = vec![
            Record::with_heat("a/b", 2.0, 0.1),
            Record::with_heat("a/c", 1.0, 0.9),
        ];
        let tree = build_tree(&input, DuplicatePolicy::Reject).unwrap();
        assert_eq!(tree.root, "a");
        assert_eq!(tree.children("a"), ["a/b", "a/c"]);
        assert_eq!(tree.get("a/b").unwrap().size, 2.0);
        assert_eq!(tree.get("a/c").unwrap().size, 1.0);
        let root = tree.get("a").unwrap();
        assert_eq!(root.size, 0.0);
        assert!(!root.has_heat);
    }

    #[test]
    fn intermediate_directories_are_synthesized() {
        let tree = build_tree(&records(&[("a/b/c/d.go", 5.0)]), DuplicatePolicy::Reject).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children("a/b"), ["a/b/c"]);
        assert_eq!(tree.get("a/b/c").unwrap().name, "c");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            build_tree(&[], DuplicatePolicy::Merge),
            Err(TreemapError::EmptyInput)
        ));
    }

    #[test]
    fn duplicate_path_rejected_or_merged_by_policy() {
        let input = records(&[("x", 3.0), ("x", 4.0)]);
        assert!(matches!(
            build_tree(&input, DuplicatePolicy::Reject),
            Err(TreemapError::DuplicatePath { path }) if path == "x"
        ));

        let tree = build_tree(&input, DuplicatePolicy::Merge).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("x").unwrap().size, 7.0);
    }

    #[test]
    fn merge_keeps_max_measured_heat() {
        let input = vec![
            Record::with_heat("d/x", 1.0, -2.0),
            Record::sized("d/x", 1.0),
            Record::with_heat("d/x", 1.0, -5.0),
        ];
        let tree = build_tree(&input, DuplicatePolicy::Merge).unwrap();
        let x = tree.get("d/x").unwrap();
        assert_eq!(x.size, 3.0);
        assert_eq!(x.heat, -2.0);
        assert!(x.has_heat);
    }

    #[test]
    fn explicit_record_upgrades_placeholder_without_duplicate_error() {
        let input = records(&[("a/b", 1.0), ("a", 10.0)]);
        let tree = build_tree(&input, DuplicatePolicy::Reject).unwrap();
        assert_eq!(tree.get("a").unwrap().size, 10.0);
        // And a later, longer path never clobbers an explicit record.
        let input = records(&[("a", 10.0), ("a/b", 1.0)]);
        let tree = build_tree(&input, DuplicatePolicy::Reject).unwrap();
        assert_eq!(tree.get("a").unwrap().size, 10.0);
    }

    #[test]
    fn multiple_roots_get_a_synthetic_parent() {
        let tree = build_tree(&records(&[("a/x", 1.0), ("b/y", 1.0), ("a/z", 1.0)]), DuplicatePolicy::Reject)
            .unwrap();
        assert!(tree.has_synthetic_root());
        assert_eq!(tree.children(&tree.root), ["a", "b"]);
        let root = tree.get(&tree.root).unwrap();
        assert!(root.name.is_empty());
    }

    #[test]
    fn empty_segments_are_dropped() {
        let tree = build_tree(&records(&[("/a//b/", 1.0), ("a/b", 2.0)]), DuplicatePolicy::Merge).unwrap();
        assert_eq!(tree.root, "a");
        assert_eq!(tree.get("a/b").unwrap().size, 3.0);

        assert!(matches!(
            build_tree(&records(&[("//", 1.0)]), DuplicatePolicy::Merge),
            Err(TreemapError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn negative_or_non_finite_values_are_rejected() {
        let bad = [
            vec![Record::sized("r/a", -5.0), Record::sized("r/b", 3.0)],
            vec![Record::sized("q/b", 3.0), Record::sized("q/a", f64::NAN)],
            vec![Record::sized("q/a", f64::INFINITY)],
            vec![Record::sized("h/a", 1.0), Record::with_heat("h/b", 1.0, f64::NAN)],
        ];
        let lines = [1, 2, 1, 2];
        for (input, expected) in bad.iter().zip(lines) {
            assert!(
                matches!(
                    build_tree(input, DuplicatePolicy::Merge),
                    Err(TreemapError::MalformedRecord { line, .. }) if line == expected
                ),
                "accepted {input:?}"
            );
        }
        // Zero size is fine and so is a negative heat.
        let tree = build_tree(&[Record::with_heat("z", 0.0, -1.0)], DuplicatePolicy::Merge).unwrap();
        assert_eq!(tree.get("z").unwrap().heat, -1.0);
    }

    #[test]
    fn child_lists_are_deduplicated_in_first_seen_order() {
        let tree = build_tree(
            &records(&[("r/b/1", 1.0), ("r/a/1", 1.0), ("r/b/2", 1.0)]),
            DuplicatePolicy::Reject,
        )
        .unwrap();
        assert_eq!(tree.children("r"), ["r/b", "r/a"]);
        assert_eq!(tree.children("r/b"), ["r/b/1", "r/b/2"]);
    }
}
