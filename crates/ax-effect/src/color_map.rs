use ax_core::config::{ColorMode, RAMP_LEN};
use ax_core::Rgb;

use crate::luminance::ramp_index;

/// Couleur du glyphe selon le mode actif.
///
/// `lum` is the (possibly inverted) cell luminance, `pixelized` the cell's
/// source color.
///
/// # Example
/// ```
/// use ax_core::Rgb;
/// use ax_core::config::ColorMode;
/// use ax_effect::color_map::select_color;
/// let red = Rgb::new(1.0, 0.0, 0.0);
/// let src = Rgb::new(0.2, 0.4, 0.6);
/// assert_eq!(select_color(&ColorMode::Foreground(red), 0.3, src), red);
/// assert_eq!(select_color(&ColorMode::Original, 0.3, src), src);
/// ```
#[inline(always)]
#[must_use]
pub fn select_color(mode: &ColorMode, lum: f32, pixelized: Rgb) -> Rgb {
    match mode {
        ColorMode::Ramp(colors) => colors[ramp_index(lum, RAMP_LEN)],
        ColorMode::Original => pixelized,
        ColorMode::Foreground(color) => *color,
    }
}
