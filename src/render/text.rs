//! Glyph-count text metrics. No font is loaded: every glyph is assumed to be
//! `font_size * 0.8` wide and a line `font_size * 0.8` tall.

pub const TEXT_WIDTH_MULTIPLIER: f64 = 0.8;
pub const TEXT_HEIGHT_MULTIPLIER: f64 = 0.8;

pub fn text_width(text: &str, font_size: f64) -> f64 {
    font_size * text.chars().count() as f64 * TEXT_WIDTH_MULTIPLIER
}

pub fn text_height(font_size: f64) -> f64 {
    font_size * TEXT_HEIGHT_MULTIPLIER
}

/// Scale in (0,1] at which `text` fits `max_w` x `max_h`, or `None` when it
/// cannot be shown at all.
pub fn fit_text(text: &str, font_size: f64, max_w: f64, max_h: f64) -> Option<f64> {
    let w = text_width(text, font_size);
    let h = text_height(font_size);
    if w <= 0.0 || h <= 0.0 || max_w <= 0.0 || max_h <= 0.0 {
        return None;
    }
    let scale = 1.0_f64.min(max_w / w).min(max_h / h);
    (scale > 0.0 && scale.is_finite()).then_some(scale)
}
