//! TOML configuration with defaults for every knob.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreemapError};
use crate::render::{Color, ColorMode, HueSettings, Palette};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub impute: ImputeConfig,
    pub filters: FilterConfig,
    pub color: ColorConfig,
    pub input: InputConfig,
}

/// Geometry of the rendered treemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Gap between a box and the rect it was given
    pub margin: f64,
    /// Gap between a box's border and its children
    pub padding: f64,
    /// Inset of the whole treemap from the canvas edge
    pub padding_root: f64,
    /// Boxes smaller than this are not drawn
    pub min_box_width: f64,
    pub min_box_height: f64,
    pub font_size: f64,
    /// Vertical gap above and below a title
    pub text_margin: f64,
    /// Maximum nesting depth (recursion bound)
    pub max_depth: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 360.0,
            margin: 4.0,
            padding: 4.0,
            padding_root: 16.0,
            min_box_width: 5.0,
            min_box_height: 5.0,
            font_size: 12.0,
            text_margin: 2.0,
            max_depth: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputeConfig {
    pub empty_leaf_size: f64,
    pub empty_leaf_heat: f64,
    pub normalize_heat: bool,
}

impl Default for ImputeConfig {
    fn default() -> Self {
        Self {
            empty_leaf_size: 1.0,
            empty_leaf_heat: 0.5,
            normalize_heat: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub prune_suffixes: Vec<String>,
    pub aggregate_suffixes: Vec<String>,
    pub collapse_long_paths: bool,
    pub collapse_root: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            prune_suffixes: Vec::new(),
            aggregate_suffixes: Vec::new(),
            collapse_long_paths: true,
            collapse_root: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub mode: ColorMode,
    /// Built-in palette name, ignored when `palette_file` is set
    pub palette: String,
    /// CSV of `#hex,position` rows
    pub palette_file: Option<PathBuf>,
    pub border: String,
    pub hue_offset: f64,
    pub hue_chroma: f64,
    pub hue_lightness: f64,
    pub hue_delta_h: f64,
    pub hue_delta_c: f64,
    pub hue_delta_l: f64,
    pub hue_iterations: usize,
    pub hue_seed: u64,
}

impl Default for ColorConfig {
    fn default() -> Self {
        let hue = HueSettings::default();
        Self {
            mode: ColorMode::Heat,
            palette: "RdYlGn".to_string(),
            palette_file: None,
            border: Color::GREY.to_hex(),
            hue_offset: hue.offset,
            hue_chroma: hue.chroma,
            hue_lightness: hue.lightness,
            hue_delta_h: hue.delta_h,
            hue_delta_c: hue.delta_c,
            hue_delta_l: hue.delta_l,
            hue_iterations: hue.iterations,
            hue_seed: hue.seed,
        }
    }
}

impl ColorConfig {
    pub fn border_color(&self) -> Result<Color> {
        Color::from_hex(&self.border).ok_or_else(|| TreemapError::InvalidConfig {
            details: format!("color.border `{}` is not a hex color", self.border),
        })
    }

    /// The palette file when set, the named built-in otherwise.
    pub fn load_palette(&self) -> Result<Palette> {
        match &self.palette_file {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| TreemapError::io(path, source))?;
                Palette::from_csv(&raw)
            }
            None => Palette::named(&self.palette),
        }
    }

    pub fn hue_settings(&self) -> HueSettings {
        HueSettings {
            offset: self.hue_offset,
            chroma: self.hue_chroma,
            lightness: self.hue_lightness,
            delta_h: self.hue_delta_h,
            delta_c: self.hue_delta_c,
            delta_l: self.hue_delta_l,
            iterations: self.hue_iterations,
            seed: self.hue_seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Coverage profiles: weight files by statement count instead of 1
    pub count_statements: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            count_statements: true,
        }
    }
}

impl Config {
    /// Defaults when `path` is `None`; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| TreemapError::io(path, source))?;
                let parsed: Self = toml::from_str(&raw)?;
                tracing::debug!("Loaded config from {}", path.display());
                parsed
            }
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let l = &self.layout;
        let geometry = [
            ("layout.width", l.width),
            ("layout.height", l.height),
            ("layout.margin", l.margin),
            ("layout.padding", l.padding),
            ("layout.padding_root", l.padding_root),
            ("layout.min_box_width", l.min_box_width),
            ("layout.min_box_height", l.min_box_height),
            ("layout.font_size", l.font_size),
            ("layout.text_margin", l.text_margin),
        ];
        for (name, value) in geometry {
            if !value.is_finite() || value < 0.0 {
                return Err(TreemapError::InvalidConfig {
                    details: format!("{name} must be a finite non-negative number, got {value}"),
                });
            }
        }

        let i = &self.impute;
        if !i.empty_leaf_size.is_finite() || i.empty_leaf_size <= 0.0 {
            return Err(TreemapError::InvalidConfig {
                details: format!("impute.empty_leaf_size must be > 0, got {}", i.empty_leaf_size),
            });
        }
        if !i.empty_leaf_heat.is_finite() {
            return Err(TreemapError::InvalidConfig {
                details: "impute.empty_leaf_heat must be finite".to_string(),
            });
        }

        let c = &self.color;
        self.color.border_color()?;
        for (name, value) in [
            ("color.hue_delta_h", c.hue_delta_h),
            ("color.hue_delta_c", c.hue_delta_c),
            ("color.hue_delta_l", c.hue_delta_l),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TreemapError::InvalidConfig {
                    details: format!("{name} must be > 0, got {value}"),
                });
            }
        }

        Ok(())
    }
}
