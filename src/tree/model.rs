use std::collections::{HashMap, HashSet};

use compact_str::CompactString;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// Key of the synthetic root. Input paths are normalized to non-empty
/// segment lists, so no input path can map to the empty key.
pub(crate) const SYNTHETIC_ROOT_KEY: &str = "";

/// Heat ranges narrower than this are treated as "no variation".
pub const MIN_HEAT_DIFFERENCE: f64 = 0.000_000_1;

/// A single tree element, keyed by its path.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Full `/`-separated path (equal to the node's key in the tree)
    pub path: CompactString,
    /// Display label
    pub name: CompactString,
    /// Weight driving area. 0 = not yet computed.
    pub size: f64,
    /// Application-unit heat, [0,1] after normalization
    pub heat: f64,
    /// Whether `heat` carries a value (measured or imputed)
    pub has_heat: bool,
    /// Layout-only wrapper parenting several input roots. Never displayed.
    pub is_synthetic: bool,
}

impl Node {
    /// Directory node synthesized for a path prefix without its own record.
    pub fn placeholder(path: &str) -> Self {
        Node {
            path: CompactString::new(path),
            name: CompactString::new(last_segment(path)),
            size: 0.0,
            heat: 0.0,
            has_heat: false,
            is_synthetic: false,
        }
    }

    pub(crate) fn synthetic_root() -> Self {
        Node {
            path: CompactString::new(SYNTHETIC_ROOT_KEY),
            name: CompactString::default(),
            size: 0.0,
            heat: 0.0,
            has_heat: false,
            is_synthetic: true,
        }
    }
}

/// Last `/` segment of a path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

/// Path-keyed tree: node attributes plus an ordered child adjacency map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    /// All nodes, keyed by path
    pub nodes: HashMap<CompactString, Node>,
    /// path → ordered, duplicate-free child paths
    pub to: HashMap<CompactString, Vec<CompactString>>,
    /// Root path
    pub root: CompactString,
}

impl Tree {
    /// Get a node by path.
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.nodes.get(path)
    }

    /// Get a mutable node by path.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        self.nodes.get_mut(path)
    }

    /// Children of a node (empty for leaves and unknown paths).
    pub fn children(&self, path: &str) -> &[CompactString] {
        self.to.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the root is the synthetic multi-root wrapper.
    pub fn has_synthetic_root(&self) -> bool {
        self.get(&self.root).is_some_and(|n| n.is_synthetic)
    }

    /// Paths reachable from `from`, parents before children, siblings in order.
    pub fn pre_order(&self, from: &str) -> Vec<CompactString> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![CompactString::new(from)];
        while let Some(path) = stack.pop() {
            stack.extend(self.children(&path).iter().rev().cloned());
            out.push(path);
        }
        out
    }

    /// Paths reachable from `from`, children before parents.
    /// Uses an explicit stack so deep chains cannot overflow the call stack.
    pub fn post_order(&self, from: &str) -> Vec<CompactString> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(CompactString::new(from), false)];
        while let Some((path, expanded)) = stack.pop() {
            if expanded {
                out.push(path);
                continue;
            }
            let children = self.children(&path);
            stack.push((path.clone(), true));
            stack.extend(children.iter().rev().map(|c| (c.clone(), false)));
        }
        out
    }

    /// child → parent for every node reachable from the root.
    pub fn parents(&self) -> HashMap<CompactString, CompactString> {
        let mut parents = HashMap::with_capacity(self.nodes.len());
        for path in self.pre_order(&self.root) {
            for child in self.children(&path) {
                parents.insert(child.clone(), path.clone());
            }
        }
        parents
    }

    /// Longest root-to-leaf edge count.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root.as_str(), 0usize)];
        while let Some((path, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.children(path).iter().map(|c| (c.as_str(), depth + 1)));
        }
        max_depth
    }

    /// Size used for layout: the node's own size, or the sum of its
    /// children's sizes when the node has no entry.
    pub fn node_size(&self, path: &str) -> f64 {
        let mut total = 0.0;
        let mut stack = vec![path];
        while let Some(p) = stack.pop() {
            match self.nodes.get(p) {
                Some(node) => total += node.size,
                None => stack.extend(self.children(p).iter().map(CompactString::as_str)),
            }
        }
        total
    }

    /// Like `node_size`, but also looks through nodes whose size is still
    /// unset (0). Used by filters that may run before size imputation.
    pub fn resolved_size(&self, path: &str) -> f64 {
        let mut total = 0.0;
        let mut stack = vec![path];
        while let Some(p) = stack.pop() {
            match self.nodes.get(p) {
                Some(node) if node.size > 0.0 => total += node.size,
                _ => stack.extend(self.children(p).iter().map(CompactString::as_str)),
            }
        }
        total
    }

    /// Remove a node, its descendants and their adjacency entries.
    /// Detaching the node from its parent's child list is up to the caller.
    pub(crate) fn remove_subtree(&mut self, path: &str) -> usize {
        let doomed = self.pre_order(path);
        let mut removed = 0;
        for p in &doomed {
            if self.nodes.remove(p).is_some() {
                removed += 1;
            }
            self.to.remove(p);
        }
        removed
    }

    /// Drop every occurrence of the given paths from all child lists.
    pub(crate) fn detach_all(&mut self, paths: &HashSet<CompactString>) {
        for children in self.to.values_mut() {
            children.retain(|c| !paths.contains(c));
        }
        self.to.retain(|_, children| !children.is_empty());
    }

    /// Min and max heat over nodes that have heat.
    pub fn heat_range(&self) -> Option<(f64, f64)> {
        self.nodes
            .values()
            .filter(|n| n.has_heat)
            .map(|n| n.heat)
            .fold(None, |acc, h| match acc {
                None => Some((h, h)),
                Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
            })
    }

    /// Whether heat varies enough to be worth a color scale.
    pub fn has_heat_variation(&self) -> bool {
        self.heat_range()
            .is_some_and(|(lo, hi)| hi - lo > MIN_HEAT_DIFFERENCE)
    }

    /// Linearly rescale heat of every node with heat so the observed min maps
    /// to 0 and the max to 1. No-op when the range is below
    /// [`MIN_HEAT_DIFFERENCE`]. Rewrites: `heat`.
    pub fn normalize_heat(&mut self) -> bool {
        let Some((lo, hi)) = self.heat_range() else {
            return false;
        };
        let range = hi - lo;
        if range < MIN_HEAT_DIFFERENCE {
            return false;
        }
        for node in self.nodes.values_mut().filter(|n| n.has_heat) {
            node.heat = ((node.heat - lo) / range).clamp(0.0, 1.0);
        }
        tracing::debug!("Normalized heat from [{lo}, {hi}] to [0, 1]");
        true
    }

    /// Set every node's display name to the last segment of its path.
    /// The synthetic root keeps an empty name. Rewrites: `name`.
    pub fn set_names_from_paths(&mut self) {
        for node in self.nodes.values_mut() {
            node.name = if node.is_synthetic {
                CompactString::default()
            } else {
                CompactString::new(last_segment(&node.path))
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        // a
        // ├── a/b
        // │   └── a/b/c
        // └── a/d
        let mut tree = Tree {
            root: "a".into(),
            ..Tree::default()
        };
        for p in ["a", "a/b", "a/b/c", "a/d"] {
            tree.nodes.insert(p.into(), Node::placeholder(p));
        }
        tree.to.insert("a".into(), vec!["a/b".into(), "a/d".into()]);
        tree.to.insert("a/b".into(), vec!["a/b/c".into()]);
        tree
    }

    #[test]
    fn traversal_orders() {
        let tree = sample();
        assert_eq!(tree.pre_order("a"), ["a", "a/b", "a/b/c", "a/d"]);
        assert_eq!(tree.post_order("a"), ["a/b/c", "a/b", "a/d", "a"]);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn parents_cover_every_non_root_node_once() {
        let tree = sample();
        let parents = tree.parents();
        assert_eq!(parents.len(), 3);
        assert_eq!(parents["a/b/c"], "a/b");
        assert!(!parents.contains_key("a"));
    }

    #[test]
    fn node_size_sums_children_only_for_missing_entries() {
        let mut tree = sample();
        tree.get_mut("a/b/c").unwrap().size = 3.0;
        tree.get_mut("a/d").unwrap().size = 2.0;
        assert_eq!(tree.node_size("a/b"), 0.0);
        assert_eq!(tree.resolved_size("a"), 5.0);

        tree.nodes.remove("a/b");
        assert_eq!(tree.node_size("a/b"), 3.0);
    }

    #[test]
    fn remove_subtree_drops_nodes_and_edges() {
        let mut tree = sample();
        assert_eq!(tree.remove_subtree("a/b"), 2);
        let gone: HashSet<CompactString> = ["a/b".into()].into_iter().collect();
        tree.detach_all(&gone);
        assert_eq!(tree.children("a"), ["a/d"]);
        assert!(tree.to.get("a/b").is_none());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn normalize_heat_maps_extremes_to_unit_interval() {
        let mut tree = sample();
        for (p, h) in [("a/b/c", 20.0), ("a/d", 60.0), ("a/b", 30.0)] {
            let n = tree.get_mut(p).unwrap();
            n.heat = h;
            n.has_heat = true;
        }
        assert!(tree.has_heat_variation());
        assert!(tree.normalize_heat());
        assert_eq!(tree.get("a/b/c").unwrap().heat, 0.0);
        assert_eq!(tree.get("a/d").unwrap().heat, 1.0);
        assert!((tree.get("a/b").unwrap().heat - 0.25).abs() < 1e-12);
        // Untouched: no heat.
        assert_eq!(tree.get("a").unwrap().heat, 0.0);
    }

    #[test]
    fn normalize_heat_is_noop_without_variation() {
        let mut tree = sample();
        for p in ["a/b/c", "a/d"] {
            let n = tree.get_mut(p).unwrap();
            n.heat = 0.7;
            n.has_heat = true;
        }
        assert!(!tree.has_heat_variation());
        assert!(!tree.normalize_heat());
        assert_eq!(tree.get("a/d").unwrap().heat, 0.7);
    }

    #[test]
    fn names_come_from_last_segment() {
        let mut tree = sample();
        for node in tree.nodes.values_mut() {
            node.name = "x".into();
        }
        tree.set_names_from_paths();
        assert_eq!(tree.get("a/b/c").unwrap().name, "c");
        assert_eq!(tree.get("a").unwrap().name, "a");
    }
}
