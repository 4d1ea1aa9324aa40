//! Structural filters over an already-valid tree.
//!
//! Every filter collects the paths it is going to touch first and mutates the
//! maps afterwards, so no map is modified while it is being iterated.

use std::collections::{HashMap, HashSet};

use compact_str::CompactString;

use super::model::{Node, Tree, PATH_SEPARATOR};

/// Name (and last path segment) of the wildcard node created by aggregation.
pub const AGGREGATE_NAME: &str = "*";

/// Matches paths ending with any of a set of suffixes (e.g. ".go", "_test.go").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixMatcher {
    suffixes: Vec<String>,
}

impl SuffixMatcher {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }
}

/// Non-root paths matching `matcher`, outermost first. Descendants of a
/// matched node are not reported separately.
fn matched_subtrees(tree: &Tree, matcher: &SuffixMatcher) -> Vec<CompactString> {
    let mut covered: HashSet<CompactString> = HashSet::new();
    let mut matched = Vec::new();
    let parents = tree.parents();

    for path in tree.pre_order(&tree.root) {
        if path == tree.root {
            continue;
        }
        if parents.get(&path).is_some_and(|p| covered.contains(p)) {
            covered.insert(path);
            continue;
        }
        if matcher.matches(&path) {
            covered.insert(path.clone());
            matched.push(path);
        }
    }
    matched
}

/// Delete every non-root node matching `matcher`, with its subtree, and
/// remove it from every child list. Returns the number of deleted nodes.
pub fn prune_by_suffix(tree: &mut Tree, matcher: &SuffixMatcher) -> usize {
    if matcher.is_empty() {
        return 0;
    }

    let matched = matched_subtrees(tree, matcher);
    let mut removed = 0;
    for path in &matched {
        removed += tree.remove_subtree(path);
    }
    let matched: HashSet<CompactString> = matched.into_iter().collect();
    tree.detach_all(&matched);

    tracing::debug!("Pruned {} nodes by suffix", removed);
    removed
}

#[derive(Debug, Default)]
struct Aggregate {
    parent: CompactString,
    size: f64,
    weighted_heat: f64,
    heat_weight: f64,
    plain_heat: f64,
    heat_count: usize,
}

impl Aggregate {
    fn add(&mut self, size: f64, heat: Option<f64>) {
        self.size += size;
        if let Some(h) = heat {
            self.weighted_heat += size * h;
            self.heat_weight += size;
            self.plain_heat += h;
            self.heat_count += 1;
        }
    }

    fn heat(&self) -> Option<f64> {
        match self.heat_count {
            0 => None,
            _ if self.heat_weight > 0.0 => Some(self.weighted_heat / self.heat_weight),
            n => Some(self.plain_heat / n as f64),
        }
    }
}

/// Replace every non-root node matching `matcher` (with its subtree) by one
/// wildcard sibling per parent. The wildcard's size is the sum of the removed
/// sizes and its heat the size-weighted average of the removed heats.
/// Returns the number of wildcard nodes created or extended.
pub fn aggregate_by_suffix(tree: &mut Tree, matcher: &SuffixMatcher) -> usize {
    if matcher.is_empty() {
        return 0;
    }

    let parents = tree.parents();
    let matched = matched_subtrees(tree, matcher);

    let mut order: Vec<CompactString> = Vec::new();
    let mut aggregates: HashMap<CompactString, Aggregate> = HashMap::new();

    for path in &matched {
        let Some(parent) = parents.get(path) else {
            continue;
        };
        let agg_path = wildcard_path(tree, parent);
        let size = tree.resolved_size(path);
        let heat = tree.get(path).filter(|n| n.has_heat).map(|n| n.heat);

        aggregates
            .entry(agg_path.clone())
            .or_insert_with(|| {
                order.push(agg_path.clone());
                Aggregate {
                    parent: parent.clone(),
                    ..Aggregate::default()
                }
            })
            .add(size, heat);
    }

    let subtrees = matched.len();
    for path in &matched {
        tree.remove_subtree(path);
    }
    let matched: HashSet<CompactString> = matched.into_iter().collect();
    tree.detach_all(&matched);

    for agg_path in &order {
        let agg = &aggregates[agg_path];
        let heat = agg.heat();

        match tree.nodes.get_mut(agg_path) {
            // Merge into a wildcard that already exists.
            Some(existing) => {
                let total = existing.size + agg.size;
                existing.heat = match (existing.has_heat, heat) {
                    (true, Some(h)) if total > 0.0 => {
                        (existing.size * existing.heat + agg.size * h) / total
                    }
                    (false, Some(h)) => h,
                    _ => existing.heat,
                };
                existing.has_heat |= heat.is_some();
                existing.size = total;
            }
            None => {
                tree.nodes.insert(
                    agg_path.clone(),
                    Node {
                        path: agg_path.clone(),
                        name: CompactString::new(AGGREGATE_NAME),
                        size: agg.size,
                        heat: heat.unwrap_or(0.0),
                        has_heat: heat.is_some(),
                        is_synthetic: false,
                    },
                );
            }
        }

        let siblings = tree.to.entry(agg.parent.clone()).or_default();
        if !siblings.contains(agg_path) {
            siblings.push(agg_path.clone());
        }
    }

    tracing::debug!(
        "Aggregated {} subtrees into {} wildcard nodes",
        subtrees,
        order.len()
    );
    order.len()
}

fn wildcard_path(tree: &Tree, parent: &str) -> CompactString {
    if tree.get(parent).is_some_and(|n| n.is_synthetic) {
        CompactString::new(AGGREGATE_NAME)
    } else {
        let mut p = CompactString::new(parent);
        p.push(PATH_SEPARATOR);
        p.push_str(AGGREGATE_NAME);
        p
    }
}

/// Collapse every single-child chain into its top node.
///
/// The surviving node keeps its key, takes the deepest node's size and heat
/// and children, and gets the chain's names joined with `/`. Idempotent: after
/// one pass no reachable node has exactly one child.
pub fn collapse_long_paths(tree: &mut Tree) {
    let mut collapsed = 0usize;
    let mut stack = vec![tree.root.clone()];

    while let Some(top) = stack.pop() {
        let mut names: Vec<CompactString> = Vec::new();
        let mut q = top.clone();

        while let [only] = tree.children(&q) {
            let next = only.clone();
            if let Some(node) = tree.nodes.get(&q) {
                if !node.name.is_empty() {
                    names.push(node.name.clone());
                }
            }
            if q != top {
                tree.nodes.remove(&q);
            }
            tree.to.remove(&q);
            q = next;
        }

        if q != top {
            let deepest = tree
                .nodes
                .remove(&q)
                .unwrap_or_else(|| Node::placeholder(&q));
            if !deepest.name.is_empty() {
                names.push(deepest.name.clone());
            }
            if let Some(grandchildren) = tree.to.remove(&q) {
                tree.to.insert(top.clone(), grandchildren);
            }

            let node = tree
                .nodes
                .entry(top.clone())
                .or_insert_with(|| Node::placeholder(&top));
            node.name = CompactString::from(names.join("/"));
            node.size = deepest.size;
            node.heat = deepest.heat;
            node.has_heat = deepest.has_heat;
            node.is_synthetic = false;
            collapsed += 1;
        }

        stack.extend(tree.children(&top).iter().rev().cloned());
    }

    tracing::debug!("Collapsed {} single-child chains", collapsed);
}

/// While the root has exactly one child, drop the root and promote the child.
/// Returns whether anything was dropped.
pub fn collapse_root(tree: &mut Tree) -> bool {
    let mut dropped = false;
    while let [only] = tree.children(&tree.root) {
        let only = only.clone();
        let old = std::mem::replace(&mut tree.root, only);
        tree.nodes.remove(&old);
        tree.to.remove(&old);
        dropped = true;
    }
    if dropped {
        tracing::debug!("Root collapsed to '{}'", tree.root);
    }
    dropped
}
