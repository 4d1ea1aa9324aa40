pub mod colorer;
pub mod colors;
pub mod palette;
pub mod text;

use serde::Serialize;

pub use self::colorer::{ColorMode, Colorer, HeatColorer, HueSettings, NoneColorer, TreeHueColorer};
pub use self::colors::Color;
pub use self::palette::Palette;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::layout::{squarify, Rect};
use crate::tree::Tree;

/// A title placed inside a box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UIText {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub scale: f64,
    pub color: Color,
}

/// A positioned, colored rectangle with nested children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UIBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<UIText>,
    pub color: Color,
    pub border_color: Color,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UIBox>,
    pub is_invisible: bool,
    pub is_root: bool,
}

impl UIBox {
    pub fn is_empty(&self) -> bool {
        self.w == 0.0 || self.h == 0.0
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Serialize the box tree, indented when `pretty`.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// This box and every box below it, parents first.
    pub fn descendants(&self) -> Vec<&UIBox> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(b) = stack.pop() {
            stack.extend(b.children.iter().rev());
            out.push(b);
        }
        out
    }
}

/// Turns a prepared tree into nested [`UIBox`]es.
pub struct UITreeMapBuilder {
    pub colorer: Box<dyn Colorer>,
    pub border_color: Color,
}

impl UITreeMapBuilder {
    pub fn new(colorer: Box<dyn Colorer>, border_color: Color) -> Self {
        Self {
            colorer,
            border_color,
        }
    }

    /// Invisible root box inset by `padding_root`, holding the box of the
    /// tree's root.
    pub fn new_ui_treemap(&self, tree: &Tree, config: &LayoutConfig) -> UIBox {
        let bounds = Rect::new(0.0, 0.0, config.width, config.height).inset(config.padding_root);
        let mut root = UIBox {
            x: bounds.x,
            y: bounds.y,
            w: bounds.w,
            h: bounds.h,
            is_invisible: true,
            is_root: true,
            ..UIBox::default()
        };

        let top = self.new_ui_box(tree, &tree.root, bounds, 0, config);
        if !top.is_empty() {
            root.children.push(top);
        }

        let total = root.descendants().len();
        tracing::debug!(
            "Built {} boxes for {} nodes in {:.0}x{:.0}",
            total - 1,
            tree.len(),
            config.width,
            config.height
        );
        root
    }

    /// Box for `path` placed in `rect`, children laid out recursively.
    /// Returns an empty box when `rect` is too small to show anything.
    pub fn new_ui_box(
        &self,
        tree: &Tree,
        path: &str,
        rect: Rect,
        depth: usize,
        config: &LayoutConfig,
    ) -> UIBox {
        let padding = config.padding;
        let margin = config.margin;
        if rect.w <= 2.0 * padding
            || rect.h <= 2.0 * padding
            || rect.w < config.min_box_width
            || rect.h < config.min_box_height
        {
            return UIBox::default();
        }

        let node = tree.get(path);
        let is_synthetic = node.is_some_and(|n| n.is_synthetic);
        let inner = rect.inset(margin);

        let mut b = UIBox {
            x: inner.x,
            y: inner.y,
            w: inner.w,
            h: inner.h,
            is_invisible: is_synthetic,
            ..UIBox::default()
        };
        if !is_synthetic {
            b.color = self.colorer.color_box(tree, path);
            b.border_color = self.border_color;
        }

        let mut reserved = 0.0;
        if let Some(name) = node.filter(|n| !n.is_synthetic && !n.name.is_empty()).map(|n| &n.name) {
            let avail_w = b.w - 2.0 * padding - 2.0 * margin;
            let avail_h = b.h - 2.0 * padding - 2.0 * margin - 2.0 * config.text_margin;
            if let Some(scale) = text::fit_text(name, config.font_size, avail_w, avail_h) {
                let h = text::text_height(config.font_size) * scale;
                b.title = Some(UIText {
                    text: name.to_string(),
                    x: b.x + padding + margin,
                    y: b.y + padding + config.text_margin,
                    w: text::text_width(name, config.font_size) * scale,
                    h,
                    scale,
                    color: self.colorer.color_text(tree, path),
                });
                reserved = h + 2.0 * config.text_margin;
            }
        }

        let children = tree.children(path);
        if children.is_empty() {
            return b;
        }
        if depth >= config.max_depth {
            tracing::warn!("Depth limit {} reached at '{}', children dropped", config.max_depth, path);
            return b;
        }

        let areas: Vec<f64> = children.iter().map(|c| tree.node_size(c)).collect();
        let container = Rect::new(
            b.x + padding,
            b.y + padding + reserved,
            (b.w - 2.0 * padding).max(0.0),
            (b.h - 2.0 * padding - reserved).max(0.0),
        );
        let boxes = squarify(container, &areas);

        for (child, r) in children.iter().zip(boxes) {
            if r == Rect::ZERO {
                continue;
            }
            let child_box = self.new_ui_box(tree, child, r, depth + 1, config);
            if child_box.is_empty() {
                continue;
            }
            b.children.push(child_box);
        }

        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::types::{DuplicatePolicy, Record};
    use crate::tree::build_tree;
    use crate::tree::impute::SumSizeImputer;

    fn builder() -> UITreeMapBuilder {
        UITreeMapBuilder::new(Box::new(NoneColorer), Color::GREY)
    }

    fn prepared(records: &[Record]) -> Tree {
        let mut tree = build_tree(records, DuplicatePolicy::Merge).unwrap();
        SumSizeImputer::default().impute_size(&mut tree);
        tree
    }

    #[test]
    fn root_box_is_invisible_and_inset() {
        let tree = prepared(&[Record::sized("a/b", 2.0), Record::sized("a/c", 1.0)]);
        let config = LayoutConfig::default();
        let root = builder().new_ui_treemap(&tree, &config);
        assert!(root.is_root && root.is_invisible);
        assert_eq!(root.rect(), Rect::new(16.0, 16.0, 1048.0, 328.0));
        assert_eq!(root.children.len(), 1);

        let a = &root.children[0];
        assert_eq!(a.rect(), Rect::new(20.0, 20.0, 1040.0, 320.0));
        assert_eq!(a.border_color, Color::GREY);
        assert_eq!(a.title.as_ref().unwrap().text, "a");
        assert_eq!(a.children.len(), 2);
    }

    #[test]
    fn children_stay_inside_parent_interior() {
        let tree = prepared(&[
            Record::sized("r/a/1", 5.0),
            Record::sized("r/a/2", 3.0),
            Record::sized("r/b", 4.0),
            Record::sized("r/c", 1.0),
        ]);
        let root = builder().new_ui_treemap(&tree, &LayoutConfig::default());
        for parent in root.descendants() {
            for child in &parent.children {
                assert!(child.x >= parent.x - 1e-9 && child.y >= parent.y - 1e-9);
                assert!(child.x + child.w <= parent.x + parent.w + 1e-9);
                assert!(child.y + child.h <= parent.y + parent.h + 1e-9);
            }
        }
    }

    #[test]
    fn title_space_is_reserved_above_children() {
        let tree = prepared(&[Record::sized("root/leaf", 1.0)]);
        let config = LayoutConfig::default();
        let root = builder().new_ui_treemap(&tree, &config);
        let top = &root.children[0];
        let title = top.title.as_ref().unwrap();
        assert_eq!(title.scale, 1.0);
        let leaf = &top.children[0];
        let expected_y = top.y + config.padding + title.h + 2.0 * config.text_margin + config.margin;
        assert!((leaf.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn tiny_boxes_are_empty() {
        let tree = prepared(&[Record::sized("x", 1.0)]);
        let config = LayoutConfig::default();
        let b = builder();
        assert!(b.new_ui_box(&tree, "x", Rect::new(0.0, 0.0, 4.0, 100.0), 0, &config).is_empty());
        assert!(b.new_ui_box(&tree, "x", Rect::new(0.0, 0.0, 100.0, 8.0), 0, &config).is_empty());
        assert!(!b.new_ui_box(&tree, "x", Rect::new(0.0, 0.0, 100.0, 100.0), 0, &config).is_empty());
    }

    #[test]
    fn synthetic_root_box_is_invisible_without_title() {
        let tree = prepared(&[Record::sized("a", 1.0), Record::sized("b", 1.0)]);
        let root = builder().new_ui_treemap(&tree, &LayoutConfig::default());
        let synthetic = &root.children[0];
        assert!(synthetic.is_invisible);
        assert!(synthetic.title.is_none());
        assert_eq!(synthetic.children.len(), 2);
        assert!(synthetic.children.iter().all(|c| !c.is_invisible));
    }

    #[test]
    fn depth_limit_drops_grandchildren() {
        let tree = prepared(&[Record::sized("a/b/c", 1.0)]);
        let config = LayoutConfig {
            max_depth: 1,
            ..LayoutConfig::default()
        };
        let root = builder().new_ui_treemap(&tree, &config);
        let a = &root.children[0];
        assert_eq!(a.children.len(), 1);
        assert!(a.children[0].children.is_empty());
    }

    #[test]
    fn zero_sized_children_are_skipped() {
        let mut tree = prepared(&[Record::sized("p/a", 3.0), Record::sized("p/b", 1.0)]);
        tree.get_mut("p/b").unwrap().size = 0.0;
        let root = builder().new_ui_treemap(&tree, &LayoutConfig::default());
        assert_eq!(root.children[0].children.len(), 1);
    }

    #[test]
    fn canvas_padded_below_min_box_has_no_children() {
        let tree = prepared(&[Record::sized("a/b", 1.0)]);
        let config = LayoutConfig {
            width: 40.0,
            height: 40.0,
            padding_root: 16.0,
            ..LayoutConfig::default()
        };
        let root = builder().new_ui_treemap(&tree, &config);
        assert_eq!(root.rect(), Rect::new(16.0, 16.0, 8.0, 8.0));
        assert!(root.children.is_empty());
    }

    #[test]
    fn to_json_pretty_and_compact_agree() {
        let tree = prepared(&[Record::sized("a/b", 2.0), Record::sized("a/c", 1.0)]);
        let root = builder().new_ui_treemap(&tree, &LayoutConfig::default());
        let compact = root.to_json(false).unwrap();
        let pretty = root.to_json(true).unwrap();
        assert!(!compact.contains('\n'));
        assert!(pretty.contains('\n'));
        let a: serde_json::Value = serde_json::from_str(&compact).unwrap();
        let b: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_colors_as_hex() {
        let tree = prepared(&[Record::sized("a", 1.0)]);
        let root = builder().new_ui_treemap(&tree, &LayoutConfig::default());
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["is_root"], true);
        assert_eq!(json["children"][0]["border_color"], "#808080");
        assert_eq!(json["children"][0]["color"], "#00000000");
        assert!(json.get("title").is_none());
    }
}
