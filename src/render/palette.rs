use super::colors::Color;
use crate::error::{Result, TreemapError};

/// ColorBrewer RdYlGn, red (0) through yellow to green (1).
const RD_YL_GN_CSV: &str = "\
#a50026,0.0
#d73027,0.1
#f46d43,0.2
#fdae61,0.3
#fee08b,0.4
#ffffbf,0.5
#d9ef8b,0.6
#a6d96a,0.7
#66bd63,0.8
#1a9850,0.9
#006837,1.0
";

/// ColorBrewer RdBu, red (0) through white to blue (1).
const RD_BU_CSV: &str = "\
#67001f,0.0
#b2182b,0.1
#d6604d,0.2
#f4a582,0.3
#fddbc7,0.4
#f7f7f7,0.5
#d1e5f0,0.6
#92c5de,0.7
#4393c3,0.8
#2166ac,0.9
#053061,1.0
";

/// Names accepted by [`Palette::named`].
pub const BUILTIN_PALETTES: [&str; 2] = ["RdYlGn", "RdBu"];

/// Ordered color stops mapping a scalar in [0,1] to a color.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    stops: Vec<(Color, f64)>,
}

impl Palette {
    /// Stops must be non-empty with ascending, finite positions.
    pub fn new(stops: Vec<(Color, f64)>) -> Result<Self> {
        if stops.is_empty() {
            return Err(TreemapError::InvalidPalette {
                details: "palette has no stops".into(),
            });
        }
        if let Some((_, p)) = stops.iter().find(|(_, p)| !p.is_finite()) {
            return Err(TreemapError::InvalidPalette {
                details: format!("stop position {p} is not finite"),
            });
        }
        if let Some(w) = stops.windows(2).find(|w| w[1].1 < w[0].1) {
            return Err(TreemapError::InvalidPalette {
                details: format!("stop positions not ascending: {} after {}", w[1].1, w[0].1),
            });
        }
        Ok(Self { stops })
    }

    /// Parse `#hex,position` rows. Blank lines are skipped.
    pub fn from_csv(csv: &str) -> Result<Self> {
        let mut stops = Vec::new();
        for (idx, row) in csv.lines().enumerate() {
            let row = row.trim();
            if row.is_empty() {
                continue;
            }
            let invalid = |what: &str| TreemapError::InvalidPalette {
                details: format!("line {}: {what} in `{row}`", idx + 1),
            };
            let (hex, pos) = row.split_once(',').ok_or_else(|| invalid("expected `#hex,position`"))?;
            let color = Color::from_hex(hex).ok_or_else(|| invalid("bad hex color"))?;
            let pos: f64 = pos.trim().parse().map_err(|_| invalid("bad position"))?;
            stops.push((color, pos));
        }
        Self::new(stops)
    }

    /// Built-in palette by name.
    pub fn named(name: &str) -> Result<Self> {
        let csv = match name {
            "RdYlGn" => RD_YL_GN_CSV,
            "RdBu" => RD_BU_CSV,
            _ => {
                return Err(TreemapError::UnknownPalette {
                    name: name.to_string(),
                })
            }
        };
        Self::from_csv(csv)
    }

    pub fn stops(&self) -> &[(Color, f64)] {
        &self.stops
    }

    /// Color at `t`: HCL blend inside the first segment containing `t`,
    /// the last stop when no segment does.
    pub fn interpolate(&self, t: f64) -> Color {
        for w in self.stops.windows(2) {
            let (c1, p1) = w[0];
            let (c2, p2) = w[1];
            if p1 <= t && t <= p2 {
                if p2 == p1 {
                    return c1;
                }
                let local = (t - p1) / (p2 - p1);
                return c1.blend_hcl(&c2, local).clamped();
            }
        }
        // `new` guarantees at least one stop.
        self.stops.last().map(|(c, _)| *c).unwrap_or(Color::TRANSPARENT)
    }
}
