use std::collections::{HashMap, VecDeque};

use compact_str::CompactString;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::colors::{fnv1a, hue_distance, Color};
use super::palette::Palette;
use crate::tree::Tree;

pub const DARK_TEXT: Color = Color::BLACK;
pub const LIGHT_TEXT: Color = Color::WHITE;

/// Box and title colors for a node.
pub trait Colorer: Send + Sync {
    fn color_box(&self, tree: &Tree, path: &str) -> Color;
    fn color_text(&self, tree: &Tree, path: &str) -> Color;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Transparent boxes
    None,
    /// Heat through a palette
    #[default]
    Heat,
    /// Hue partition by tree structure
    Hue,
}

impl ColorMode {
    pub fn name(self) -> &'static str {
        match self {
            ColorMode::None => "none",
            ColorMode::Heat => "heat",
            ColorMode::Hue => "hue",
        }
    }
}

/// Black on light boxes, white on dark ones.
fn readable_text(background: Color) -> Color {
    if background.lightness() > 0.5 {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoneColorer;

impl Colorer for NoneColorer {
    fn color_box(&self, _tree: &Tree, _path: &str) -> Color {
        Color::TRANSPARENT
    }

    fn color_text(&self, _tree: &Tree, _path: &str) -> Color {
        DARK_TEXT
    }
}

/// Maps node heat through a palette; nodes without heat get the midpoint.
#[derive(Debug, Clone)]
pub struct HeatColorer {
    pub palette: Palette,
}

impl HeatColorer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

impl Colorer for HeatColorer {
    fn color_box(&self, tree: &Tree, path: &str) -> Color {
        let heat = tree
            .get(path)
            .filter(|n| n.has_heat)
            .map(|n| n.heat)
            .unwrap_or(0.5);
        self.palette.interpolate(heat)
    }

    fn color_text(&self, tree: &Tree, path: &str) -> Color {
        readable_text(self.color_box(tree, path))
    }
}

/// Target chroma/lightness and search window for [`TreeHueColorer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueSettings {
    /// Start of the hue circle handed to the root, in degrees
    pub offset: f64,
    pub chroma: f64,
    pub lightness: f64,
    pub delta_h: f64,
    pub delta_c: f64,
    pub delta_l: f64,
    /// Samples drawn per node
    pub iterations: usize,
    pub seed: u64,
}

impl Default for HueSettings {
    fn default() -> Self {
        Self {
            offset: 0.0,
            chroma: 0.5,
            lightness: 0.5,
            delta_h: 10.0,
            delta_c: 0.3,
            delta_l: 0.1,
            iterations: 500,
            seed: 0,
        }
    }
}

/// Colors nodes so that subtrees occupy contiguous hue ranges.
///
/// Hues and colors are computed once for every node reachable from the root.
/// Each color is the Lab mean of random in-gamut samples within the HCL
/// tolerance window around the node's hue; deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct TreeHueColorer {
    hues: HashMap<CompactString, f64>,
    colors: HashMap<CompactString, Color>,
}

impl TreeHueColorer {
    pub fn new(tree: &Tree, settings: HueSettings) -> Self {
        let hues = tree_hues(tree, settings.offset);
        let colors: HashMap<CompactString, Color> = hues
            .iter()
            .map(|(path, &hue)| (path.clone(), sample_color(path, hue, &settings)))
            .collect();
        let fallbacks = colors.values().filter(|c| **c == Color::WHITE).count();
        tracing::debug!(
            "Hue colors for {} nodes ({} without an in-gamut sample)",
            colors.len(),
            fallbacks
        );
        Self { hues, colors }
    }

    pub fn hue(&self, path: &str) -> Option<f64> {
        self.hues.get(path).copied()
    }
}

impl Colorer for TreeHueColorer {
    fn color_box(&self, _tree: &Tree, path: &str) -> Color {
        self.colors.get(path).copied().unwrap_or(Color::WHITE)
    }

    fn color_text(&self, tree: &Tree, path: &str) -> Color {
        readable_text(self.color_box(tree, path))
    }
}

/// Hue (degrees, [0,360)) for every node reachable from the root.
///
/// BFS over hue ranges: the root owns `[offset, offset + 360)`, a single child
/// inherits its parent's range, several children split it into equal slices
/// in order with the last one taking the remainder. A node's hue is the
/// midpoint of its range.
pub fn tree_hues(tree: &Tree, offset: f64) -> HashMap<CompactString, f64> {
    let mut ranges: HashMap<CompactString, (f64, f64)> = HashMap::with_capacity(tree.len());
    ranges.insert(tree.root.clone(), (offset, offset + 360.0));

    let mut queue = VecDeque::from([tree.root.clone()]);
    while let Some(path) = queue.pop_front() {
        let children = tree.children(&path);
        queue.extend(children.iter().cloned());

        let Some(&(min_h, max_h)) = ranges.get(&path) else {
            continue;
        };
        match children.len() {
            0 => {}
            1 => {
                ranges.insert(children[0].clone(), (min_h, max_h));
            }
            n => {
                let width = (max_h - min_h).abs() / n as f64;
                let mut split = min_h;
                for (i, child) in children.iter().enumerate() {
                    let end = if i == n - 1 { max_h } else { split + width };
                    ranges.insert(child.clone(), (split, end));
                    split = end;
                }
            }
        }
    }

    ranges
        .into_iter()
        .map(|(path, (lo, hi))| (path, ((lo + hi) / 2.0).rem_euclid(360.0)))
        .collect()
}

fn sample_color(path: &str, hue: f64, s: &HueSettings) -> Color {
    let mut rng = StdRng::seed_from_u64(s.seed ^ fnv1a(path) as u64);
    let mut sum = (0.0, 0.0, 0.0);
    let mut accepted = 0usize;

    for _ in 0..s.iterations {
        let h = hue + s.delta_h * (2.0 * rng.random::<f64>() - 1.0);
        let c = s.chroma + s.delta_c * (2.0 * rng.random::<f64>() - 1.0);
        let l = s.lightness + s.delta_l * (2.0 * rng.random::<f64>() - 1.0);

        let candidate = Color::from_hcl(h, c, l);
        if !candidate.is_valid() {
            continue;
        }
        // Re-check in HCL: negative chroma flips the hue.
        let (ch, cc, cl) = candidate.hcl();
        if hue_distance(ch, hue) < s.delta_h
            && (cc - s.chroma).abs() < s.delta_c
            && (cl - s.lightness).abs() < s.delta_l
        {
            let (la, aa, ba) = candidate.lab();
            sum.0 += la;
            sum.1 += aa;
            sum.2 += ba;
            accepted += 1;
        }
    }

    if accepted == 0 {
        return Color::WHITE;
    }
    let n = accepted as f64;
    Color::from_lab(sum.0 / n, sum.1 / n, sum.2 / n).clamped()
}
