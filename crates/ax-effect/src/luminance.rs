use ax_atlas::ATLAS_GRID;
use ax_atlas::atlas::glyph_cell;
use ax_core::Rgb;

/// Luminance pondérée par `brightness`, éventuellement inversée.
///
/// Weights are (0.299, 0.587, 0.114) scaled by `brightness`. The sum is
/// taken on integer weights so that white yields exactly 1.0.
///
/// # Example
/// ```
/// use ax_core::Rgb;
/// use ax_effect::luminance::classify;
/// assert_eq!(classify(Rgb::WHITE, 1.0, false), 1.0);
/// assert_eq!(classify(Rgb::WHITE, 1.0, true), 0.0);
/// assert_eq!(classify(Rgb::BLACK, 1.0, false), 0.0);
/// ```
#[inline(always)]
#[must_use]
pub fn classify(rgb: Rgb, brightness: f32, invert: bool) -> f32 {
    let lum = (299.0 * rgb.r + 587.0 * rgb.g + 114.0 * rgb.b) / 1000.0 * brightness;
    if invert { 1.0 - lum } else { lum }
}

/// `floor((count - 1) * lum)`, clamped to `[0, count - 1]`.
///
/// Brightness above 1 or an inverted overshoot can push `lum` outside
/// `[0, 1]`; NaN maps to 0.
///
/// # Example
/// ```
/// use ax_effect::luminance::glyph_index;
/// assert_eq!(glyph_index(0.0, 20), 0);
/// assert_eq!(glyph_index(1.0, 20), 19);
/// assert_eq!(glyph_index(3.0, 20), 19);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_index(lum: f32, count: usize) -> usize {
    band(count.saturating_sub(1) as f32 * lum, count)
}

/// UV offset of glyph `index` in the atlas: `(col, -row) / 16`.
///
/// Rows are addressed top-down in the raster but UV grows upward, hence
/// the sign flip.
///
/// # Example
/// ```
/// use ax_effect::luminance::atlas_offset;
/// assert_eq!(atlas_offset(17), [0.0625, -0.0625]);
/// ```
#[inline(always)]
#[must_use]
pub fn atlas_offset(index: usize) -> [f32; 2] {
    let (cx, cy) = glyph_cell(index);
    let grid = ATLAS_GRID as f32;
    [cx as f32 / grid, -(cy as f32) / grid]
}

/// Bande de luminance dans une rampe de `len` couleurs.
///
/// # Example
/// ```
/// use ax_effect::luminance::ramp_index;
/// assert_eq!(ramp_index(0.25, 4), 1);
/// assert_eq!(ramp_index(1.0, 4), 3);
/// ```
#[inline(always)]
#[must_use]
pub fn ramp_index(lum: f32, len: usize) -> usize {
    band(lum * len as f32, len)
}

/// `floor(scaled)` clamped to `[0, len - 1]`.
#[inline(always)]
fn band(scaled: f32, len: usize) -> usize {
    let last = len.saturating_sub(1);
    let i = scaled.floor();
    if i > 0.0 { (i as usize).min(last) } else { 0 }
}
