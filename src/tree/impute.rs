use super::model::{Node, Tree};

/// Fill unset (zero) sizes bottom-up.
///
/// After this, each internal node without an explicit size carries the sum of
/// its children's sizes and each unsized leaf carries `empty_leaf_size`.
/// Rewrites: `size`.
#[derive(Debug, Clone, Copy)]
pub struct SumSizeImputer {
    pub empty_leaf_size: f64,
}

impl Default for SumSizeImputer {
    fn default() -> Self {
        Self {
            empty_leaf_size: 1.0,
        }
    }
}

impl SumSizeImputer {
    pub fn impute_size(&self, tree: &mut Tree) {
        let mut imputed = 0usize;
        // Post-order guarantees children are resolved before their parent.
        for path in tree.post_order(&tree.root) {
            let children = tree.children(&path);
            let has_children = !children.is_empty();
            let sum: f64 = children
                .iter()
                .filter_map(|c| tree.get(c))
                .map(|n| n.size)
                .sum();

            let node = tree
                .nodes
                .entry(path.clone())
                .or_insert_with(|| Node::placeholder(&path));
            if node.size == 0.0 {
                node.size = if has_children {
                    sum
                } else {
                    self.empty_leaf_size
                };
                imputed += 1;
            }
        }
        tracing::debug!("Imputed size for {} nodes", imputed);
    }
}

/// Fill missing heat bottom-up with the size-weighted average of the
/// children's heat, or `empty_leaf_heat` for leaves without a measurement.
/// Every reachable node ends with `has_heat = true`.
/// Rewrites: `heat`, `has_heat`.
#[derive(Debug, Clone, Copy)]
pub struct WeightedHeatImputer {
    pub empty_leaf_heat: f64,
}

impl Default for WeightedHeatImputer {
    fn default() -> Self {
        Self {
            empty_leaf_heat: 0.5,
        }
    }
}

impl WeightedHeatImputer {
    pub fn impute_heat(&self, tree: &mut Tree) {
        let mut imputed = 0usize;
        for path in tree.post_order(&tree.root) {
            if tree.get(&path).is_some_and(|n| n.has_heat) {
                continue;
            }

            let heat = weighted_children_heat(tree, &path).unwrap_or(self.empty_leaf_heat);

            let node = tree
                .nodes
                .entry(path.clone())
                .or_insert_with(|| Node::placeholder(&path));
            node.heat = heat;
            node.has_heat = true;
            imputed += 1;
        }
        tracing::debug!("Imputed heat for {} nodes", imputed);
    }
}

/// Size-weighted mean heat of the children that have heat; plain mean when
/// their sizes sum to zero. `None` when no child has heat.
fn weighted_children_heat(tree: &Tree, path: &str) -> Option<f64> {
    let mut weighted = 0.0;
    let mut weight = 0.0;
    let mut plain = 0.0;
    let mut count = 0usize;

    for node in tree
        .children(path)
        .iter()
        .filter_map(|c| tree.get(c))
        .filter(|n| n.has_heat)
    {
        weighted += node.size * node.heat;
        weight += node.size;
        plain += node.heat;
        count += 1;
    }

    match count {
        0 => None,
        _ if weight > 0.0 => Some(weighted / weight),
        _ => Some(plain / count as f64),
    }
}
