//! RGBA color values.
//!
//! Colors are exact 8-bit RGBA quadruples; the pipeline compares them for
//! strict equality (no perceptual distance, no quantization).

use rgb::RGBA8;

/// The color of padding pixels when the source top-left pixel is transparent.
pub const TRANSPARENT: RGBA8 = RGBA8 {
    r: 0,
    g: 0,
    b: 0,
    a: 0,
};

/// Serialize a color the way SVG fill/stroke attributes consume it:
/// `rgba(r, g, b, a)` with literal decimal components.
pub fn css(color: RGBA8) -> String {
    format!("rgba({}, {}, {}, {})", color.r, color.g, color.b, color.a)
}

/// Channel values as an `[r, g, b, a]` array.
pub fn channels(color: RGBA8) -> [u8; 4] {
    [color.r, color.g, color.b, color.a]
}
