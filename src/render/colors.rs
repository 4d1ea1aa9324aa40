use serde::{Serialize, Serializer};

/// Below this chroma a color's hue is meaningless; blending borrows the
/// other endpoint's hue instead.
const ACHROMATIC_CHROMA: f64 = 0.00015;

/// D65 reference white.
const D65: [f64; 3] = [0.95047, 1.00000, 1.08883];

/// sRGB color with straight alpha. Components are nominally in [0,1];
/// intermediate results of color math may leave the cube until `clamped`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    /// `#808080`
    pub const GREY: Color = Color::rgb(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let (r, g, b, a) = match hex.len() {
            3 => (nibble(0)?, nibble(1)?, nibble(2)?, 255),
            6 => (byte(0)?, byte(2)?, byte(4)?, 255),
            8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
            _ => return None,
        };
        Some(Self::rgba(
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0,
            a as f64 / 255.0,
        ))
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let c = self.clamped();
        let q = |v: f64| (v * 255.0 + 0.5) as u8;
        if q(c.a) == 255 {
            format!("#{:02x}{:02x}{:02x}", q(c.r), q(c.g), q(c.b))
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", q(c.r), q(c.g), q(c.b), q(c.a))
        }
    }

    /// Whether r, g, b are inside the RGB cube.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.r) && (0.0..=1.0).contains(&self.g) && (0.0..=1.0).contains(&self.b)
    }

    /// Nearest color inside the RGB cube.
    pub fn clamped(&self) -> Self {
        let c = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self::rgba(c(self.r), c(self.g), c(self.b), c(self.a))
    }

    pub fn linear_rgb(&self) -> (f64, f64, f64) {
        (linearize(self.r), linearize(self.g), linearize(self.b))
    }

    pub fn from_linear_rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgb(delinearize(r), delinearize(g), delinearize(b))
    }

    pub fn xyz(&self) -> (f64, f64, f64) {
        let (r, g, b) = self.linear_rgb();
        linear_rgb_to_xyz(r, g, b)
    }

    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        let (r, g, b) = xyz_to_linear_rgb(x, y, z);
        Self::from_linear_rgb(r, g, b)
    }

    /// CIE L*a*b* under D65, scaled so L is in [0,1].
    pub fn lab(&self) -> (f64, f64, f64) {
        let (x, y, z) = self.xyz();
        xyz_to_lab(x, y, z)
    }

    pub fn from_lab(l: f64, a: f64, b: f64) -> Self {
        let (x, y, z) = lab_to_xyz(l, a, b);
        Self::from_xyz(x, y, z)
    }

    /// Polar Lab: hue in degrees [0,360), chroma, lightness.
    pub fn hcl(&self) -> (f64, f64, f64) {
        let (l, a, b) = self.lab();
        lab_to_hcl(l, a, b)
    }

    pub fn from_hcl(h: f64, c: f64, l: f64) -> Self {
        let (l, a, b) = hcl_to_lab(h, c, l);
        Self::from_lab(l, a, b)
    }

    /// Blend in HCL along the shorter hue arc. Near-achromatic endpoints take
    /// the other endpoint's hue so grey-to-color ramps keep a stable hue.
    pub fn blend_hcl(&self, other: &Color, t: f64) -> Color {
        let (mut h1, c1, l1) = self.hcl();
        let (mut h2, c2, l2) = other.hcl();

        if c1 <= ACHROMATIC_CHROMA && c2 >= ACHROMATIC_CHROMA {
            h1 = h2;
        } else if c2 <= ACHROMATIC_CHROMA && c1 >= ACHROMATIC_CHROMA {
            h2 = h1;
        }

        Color::from_hcl(
            interp_angle(h1, h2, t),
            c1 + t * (c2 - c1),
            l1 + t * (l2 - l1),
        )
        .clamped()
    }

    /// HCL lightness, used to pick a readable text color.
    pub fn lightness(&self) -> f64 {
        self.lab().0
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

fn linearize(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn delinearize(v: f64) -> f64 {
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn linear_rgb_to_xyz(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    (
        0.41239079926595948 * r + 0.35758433938387796 * g + 0.18048078840183429 * b,
        0.21263900587151036 * r + 0.71516867876775593 * g + 0.072192315360733715 * b,
        0.019330818715591851 * r + 0.11919477979462599 * g + 0.95053215224966058 * b,
    )
}

fn xyz_to_linear_rgb(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    (
        3.2409699419045214 * x - 1.5373831775700935 * y - 0.49861076029300328 * z,
        -0.96924363628087983 * x + 1.8759675015077207 * y + 0.041555057407175613 * z,
        0.055630079696993609 * x - 0.20397695888897657 * y + 1.0569715142428786 * z,
    )
}

fn lab_f(t: f64) -> f64 {
    if t > 6.0 / 29.0 * 6.0 / 29.0 * 6.0 / 29.0 {
        t.cbrt()
    } else {
        t / 3.0 * 29.0 / 6.0 * 29.0 / 6.0 + 4.0 / 29.0
    }
}

fn lab_finv(t: f64) -> f64 {
    if t > 6.0 / 29.0 {
        t * t * t
    } else {
        3.0 * 6.0 / 29.0 * 6.0 / 29.0 * (t - 4.0 / 29.0)
    }
}

fn xyz_to_lab(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let fy = lab_f(y / D65[1]);
    let l = 1.16 * fy - 0.16;
    let a = 5.0 * (lab_f(x / D65[0]) - fy);
    let b = 2.0 * (fy - lab_f(z / D65[2]));
    (l, a, b)
}

fn lab_to_xyz(l: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let l2 = (l + 0.16) / 1.16;
    (
        D65[0] * lab_finv(l2 + a / 5.0),
        D65[1] * lab_finv(l2),
        D65[2] * lab_finv(l2 - b / 2.0),
    )
}

pub fn lab_to_hcl(l: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let h = if (b - a).abs() > 1e-4 && a.abs() > 1e-4 {
        (b.atan2(a).to_degrees() + 360.0) % 360.0
    } else {
        0.0
    };
    let c = (a * a + b * b).sqrt();
    (h, c, l)
}

pub fn hcl_to_lab(h: f64, c: f64, l: f64) -> (f64, f64, f64) {
    let rad = h.to_radians();
    (l, c * rad.cos(), c * rad.sin())
}

/// Interpolate between two angles (degrees) along the shorter arc.
fn interp_angle(a0: f64, a1: f64, t: f64) -> f64 {
    let delta = (((a1 - a0) % 360.0) + 540.0) % 360.0 - 180.0;
    (a0 + t * delta + 360.0) % 360.0
}

/// Smallest distance between two hues, in degrees.
pub fn hue_distance(h1: f64, h2: f64) -> f64 {
    let d = (h1 - h2).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// 32-bit FNV-1a over the string's bytes.
pub fn fnv1a(s: &str) -> u32 {
    let mut h: u32 = 2166136261;
    for &b in s.as_bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(16777619);
    }
    h
}
