use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use ax_core::CoreError;

/// Variable d'environnement prioritaire dans la chaîne de polices système.
pub const FONT_ENV_VAR: &str = "ASCIIFX_FONT";

/// Chaîne de repli, polices monospace d'abord.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    // Windows
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansMono-Regular.ttf",
    // macOS
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Supplemental/Courier New.ttf",
    "/Library/Fonts/Courier New.ttf",
];

/// Dessine un glyphe centré, en blanc opaque, via un callback de couverture.
///
/// The atlas builder owns the raster; a rasterizer only reports coverage in
/// `[0, 1]` at absolute pixel coordinates, which may fall outside the canvas.
pub trait GlyphRasterizer: Send + Sync {
    /// Draw `ch` at `font_size` px around `center`: horizontally centered on
    /// its advance, vertically on its em box (canvas `middle` baseline).
    fn draw_centered(
        &self,
        ch: char,
        font_size: f32,
        center: (f32, f32),
        plot: &mut dyn FnMut(i32, i32, f32),
    );
}

/// Rasterizer logiciel basé sur ab_glyph.
///
/// # Example
/// ```no_run
/// use ax_atlas::font::FontRasterizer;
/// let font = FontRasterizer::from_system().unwrap();
/// ```
pub struct FontRasterizer {
    font: FontVec,
    source: String,
}

impl FontRasterizer {
    /// Parse a TTF/OTF font held in memory.
    ///
    /// # Errors
    /// Returns `CoreError::Resource` if the bytes are not a usable font.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, CoreError> {
        let font = FontVec::try_from_vec(data)
            .map_err(|e| CoreError::Resource(format!("police invalide : {e}")))?;
        Ok(Self {
            font,
            source: "<mémoire>".into(),
        })
    }

    /// Load a font file.
    ///
    /// # Errors
    /// Returns `CoreError::Resource` if the file is unreadable or not a font.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let data = std::fs::read(path).map_err(|e| {
            CoreError::Resource(format!("Impossible de lire {} : {e}", path.display()))
        })?;
        let mut rasterizer = Self::from_bytes(data)
            .map_err(|e| CoreError::Resource(format!("{} : {e}", path.display())))?;
        rasterizer.source = path.display().to_string();
        Ok(rasterizer)
    }

    /// Walk the monospace fallback chain (`ASCIIFX_FONT`, then usual system
    /// locations) and load the first font that parses.
    ///
    /// # Errors
    /// Returns `CoreError::Resource` if no candidate can be loaded.
    pub fn from_system() -> Result<Self, CoreError> {
        let from_env = std::env::var_os(FONT_ENV_VAR).map(PathBuf::from);
        let candidates = from_env
            .into_iter()
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(rasterizer) => {
                    log::info!("Police sélectionnée : {}", path.display());
                    return Ok(rasterizer);
                }
                Err(e) => log::debug!("Police ignorée : {e}"),
            }
        }

        Err(CoreError::Resource(format!(
            "aucune police monospace trouvée (définir {FONT_ENV_VAR} ou --font)"
        )))
    }

    /// Where the font was loaded from, for logs.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Canvas font sizes are em sizes, ab_glyph scales by ascent - descent.
    fn em_scale(&self, font_size: f32) -> PxScale {
        match self.font.units_per_em() {
            Some(upem) if upem > 0.0 => {
                PxScale::from(font_size * self.font.height_unscaled() / upem)
            }
            _ => PxScale::from(font_size),
        }
    }
}

/// Baseline putting the middle of the em box on `center_y`.
///
/// The em box spans `font_size` px, split above and below the baseline in
/// the font's ascent/descent proportion.
fn middle_baseline(center_y: f32, font_size: f32, ascent: f32, descent: f32) -> f32 {
    let extent = ascent - descent;
    if extent <= 0.0 {
        return center_y + font_size / 2.0;
    }
    let em_over = font_size * ascent / extent;
    center_y + em_over - font_size / 2.0
}

impl GlyphRasterizer for FontRasterizer {
    fn draw_centered(
        &self,
        ch: char,
        font_size: f32,
        center: (f32, f32),
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let id = self.font.glyph_id(ch);
        // .notdef: nothing to draw rather than a placeholder box.
        if id.0 == 0 {
            log::debug!("Glyphe absent de la police : {ch:?}");
            return;
        }

        let scale = self.em_scale(font_size);
        let scaled = self.font.as_scaled(scale);
        let advance = scaled.h_advance(id);
        let baseline = middle_baseline(center.1, font_size, scaled.ascent(), scaled.descent());
        let glyph = id.with_scale_and_position(scale, point(center.0 - advance / 2.0, baseline));

        if let Some(outline) = self.font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            let (ox, oy) = (bounds.min.x as i32, bounds.min.y as i32);
            outline.draw(|x, y, coverage| {
                plot(ox + x as i32, oy + y as i32, coverage);
            });
        }
    }
}
