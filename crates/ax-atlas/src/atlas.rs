use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ax_core::config::MAX_GLYPHS;
use ax_core::{CoreError, Rgba};
use image::{Rgba as Texel, RgbaImage};

use crate::font::GlyphRasterizer;

/// Côté de la texture atlas, en pixels.
pub const ATLAS_SIZE: u32 = 1024;
/// Cellules par ligne (et par colonne).
pub const ATLAS_GRID: u32 = 16;
/// Côté d'une cellule, en pixels.
pub const ATLAS_CELL: u32 = ATLAS_SIZE / ATLAS_GRID;

const _: () = assert!((ATLAS_GRID * ATLAS_GRID) as usize == MAX_GLYPHS);

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Texture addressing outside `[0, 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// Modular wrap; the effect pass relies on it.
    #[default]
    Repeat,
    /// Clamp to the border texel.
    ClampToEdge,
}

/// Texture filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest texel; keeps glyph edges crisp.
    #[default]
    Nearest,
    /// Bilinear between texel centers.
    Linear,
}

/// Sampling state attached to the atlas texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AtlasSampling {
    /// Addressing on both axes.
    pub wrap: WrapMode,
    /// Minification and magnification filter.
    pub filter: FilterMode,
}

/// Atlas de glyphes : une texture 1024×1024 découpée en 16×16 cellules.
///
/// Texels are opaque white where a glyph has ink, with alpha carrying the
/// antialiased coverage, and fully transparent elsewhere. Immutable once
/// built.
pub struct GlyphAtlas {
    image: RgbaImage,
    characters: Vec<char>,
    font_size: f32,
    sampling: AtlasSampling,
    revision: u64,
}

/// Atlas cell `(column, row)` of glyph `index`, rows counted from the top.
///
/// # Example
/// ```
/// use ax_atlas::atlas::glyph_cell;
/// assert_eq!(glyph_cell(0), (0, 0));
/// assert_eq!(glyph_cell(17), (1, 1));
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_cell(index: usize) -> (u32, u32) {
    let i = index as u32;
    (i % ATLAS_GRID, i / ATLAS_GRID)
}

impl GlyphAtlas {
    /// Rasterize `characters` into a fresh atlas, glyph `i` centered in
    /// cell [`glyph_cell`]`(i)`.
    ///
    /// Ink falling outside the canvas is clipped; overlapping ink keeps the
    /// highest coverage.
    ///
    /// # Errors
    /// Returns `CoreError::Config` for an empty set, more than 256 glyphs or
    /// a non-positive font size.
    pub fn build(
        characters: &[char],
        font_size: f32,
        rasterizer: &dyn GlyphRasterizer,
    ) -> Result<Self, CoreError> {
        if characters.is_empty() {
            return Err(CoreError::Config("atlas : jeu de caractères vide".into()));
        }
        if characters.len() > MAX_GLYPHS {
            return Err(CoreError::Config(format!(
                "atlas : {} glyphes pour {MAX_GLYPHS} cellules",
                characters.len()
            )));
        }
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(CoreError::Config(format!(
                "atlas : taille de police invalide {font_size}"
            )));
        }

        let start = Instant::now();
        let mut image = RgbaImage::new(ATLAS_SIZE, ATLAS_SIZE);
        let half = ATLAS_CELL as f32 / 2.0;

        for (i, &ch) in characters.iter().enumerate() {
            let (cx, cy) = glyph_cell(i);
            let center = (
                (cx * ATLAS_CELL) as f32 + half,
                (cy * ATLAS_CELL) as f32 + half,
            );
            rasterizer.draw_centered(ch, font_size, center, &mut |x, y, coverage| {
                if x < 0 || y < 0 || x >= ATLAS_SIZE as i32 || y >= ATLAS_SIZE as i32 {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let texel = image.get_pixel_mut(x as u32, y as u32);
                if alpha > texel.0[3] {
                    *texel = Texel([255, 255, 255, alpha]);
                }
            });
        }

        let revision = NEXT_REVISION.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Atlas r{revision} : {} glyphes à {font_size}px en {:?}",
            characters.len(),
            start.elapsed()
        );

        Ok(Self {
            image,
            characters: characters.to_vec(),
            font_size,
            sampling: AtlasSampling::default(),
            revision,
        })
    }

    /// Replace the sampling state (default: repeat + nearest).
    #[must_use]
    pub fn with_sampling(mut self, sampling: AtlasSampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Glyphs in luminance order.
    #[must_use]
    pub fn characters(&self) -> &[char] {
        &self.characters
    }

    /// Number of usable glyphs.
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.characters.len()
    }

    /// Font size the atlas was rasterized at.
    #[must_use]
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Cell side in pixels.
    #[must_use]
    pub fn cell_px(&self) -> u32 {
        ATLAS_CELL
    }

    /// Sampling state.
    #[must_use]
    pub fn sampling(&self) -> AtlasSampling {
        self.sampling
    }

    /// Build counter; a GPU-side copy is stale when this changes.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Raw raster, top row first.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Alpha coverage of one cell, row-major from its top-left texel.
    #[must_use]
    pub fn cell_coverage(&self, index: usize) -> Vec<u8> {
        let (cx, cy) = glyph_cell(index);
        let mut out = Vec::with_capacity((ATLAS_CELL * ATLAS_CELL) as usize);
        for y in 0..ATLAS_CELL {
            for x in 0..ATLAS_CELL {
                out.push(
                    self.image
                        .get_pixel(cx * ATLAS_CELL + x, cy * ATLAS_CELL + y)
                        .0[3],
                );
            }
        }
        out
    }

    /// Sample at `uv` with GL conventions: `(0,0)` is the bottom-left of the
    /// raster, `v = 1` its top row.
    #[inline]
    #[must_use]
    pub fn sample(&self, uv: [f32; 2]) -> Rgba {
        let size = ATLAS_SIZE as f32;
        match self.sampling.filter {
            FilterMode::Nearest => {
                let tx = (uv[0] * size).floor() as i64;
                let ty = (uv[1] * size).floor() as i64;
                self.texel(tx, ty)
            }
            FilterMode::Linear => {
                let tx = uv[0] * size - 0.5;
                let ty = uv[1] * size - 0.5;
                let (x0, y0) = (tx.floor(), ty.floor());
                let (fx, fy) = (tx - x0, ty - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let bottom = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
                let top = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
                bottom.lerp(top, fy)
            }
        }
    }

    /// Texel at column `x`, bottom-up row `y`, after wrapping.
    #[inline(always)]
    fn texel(&self, x: i64, y: i64) -> Rgba {
        let n = i64::from(ATLAS_SIZE);
        let (x, y) = match self.sampling.wrap {
            WrapMode::Repeat => (x.rem_euclid(n), y.rem_euclid(n)),
            WrapMode::ClampToEdge => (x.clamp(0, n - 1), y.clamp(0, n - 1)),
        };
        let row = (n - 1 - y) as u32;
        Rgba::from_u8(self.image.get_pixel(x as u32, row).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fills a `font_size` square around the center for any non-space glyph.
    struct BoxRasterizer;

    impl GlyphRasterizer for BoxRasterizer {
        fn draw_centered(
            &self,
            ch: char,
            font_size: f32,
            center: (f32, f32),
            plot: &mut dyn FnMut(i32, i32, f32),
        ) {
            if ch == ' ' {
                return;
            }
            let half = font_size / 2.0;
            let (x0, y0) = ((center.0 - half) as i32, (center.1 - half) as i32);
            for y in y0..y0 + font_size as i32 {
                for x in x0..x0 + font_size as i32 {
                    plot(x, y, 1.0);
                }
            }
        }
    }

    /// Horizontal stripes whose phase depends on the character.
    struct StripeRasterizer;

    impl GlyphRasterizer for StripeRasterizer {
        fn draw_centered(
            &self,
            ch: char,
            _font_size: f32,
            center: (f32, f32),
            plot: &mut dyn FnMut(i32, i32, f32),
        ) {
            let phase = ch as i32 % 3;
            let (cx, cy) = (center.0 as i32, center.1 as i32);
            for y in cy - 20..cy + 20 {
                if (y + phase) % 3 == 0 {
                    for x in cx - 20..cx + 20 {
                        plot(x, y, 0.5);
                    }
                }
            }
        }
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn build_rejects_invalid_input() {
        assert!(matches!(
            GlyphAtlas::build(&[], 54.0, &BoxRasterizer),
            Err(CoreError::Config(_))
        ));
        let too_many = vec!['x'; MAX_GLYPHS + 1];
        assert!(GlyphAtlas::build(&too_many, 54.0, &BoxRasterizer).is_err());
        assert!(GlyphAtlas::build(&chars("ab"), 0.0, &BoxRasterizer).is_err());
    }

    #[test]
    fn glyph_lands_in_its_cell() {
        let mut set = vec![' '; 20];
        set[17] = '#';
        let atlas = GlyphAtlas::build(&set, 64.0, &BoxRasterizer).unwrap();
        assert_eq!(atlas.glyph_count(), 20);
        for i in 0..20 {
            let inked = atlas.cell_coverage(i).iter().any(|&a| a > 0);
            assert_eq!(inked, i == 17, "cell {i}");
        }
        assert!(atlas.cell_coverage(17).iter().all(|&a| a == 255));
    }

    #[test]
    fn distinct_characters_give_distinct_cells() {
        let atlas = GlyphAtlas::build(&chars("AB"), 54.0, &StripeRasterizer).unwrap();
        let a = atlas.cell_coverage(0);
        let b = atlas.cell_coverage(1);
        assert!(a.iter().any(|&v| v > 0));
        assert!(b.iter().any(|&v| v > 0));
        assert_ne!(a, b);
    }

    #[test]
    fn ink_is_opaque_white_with_coverage_alpha() {
        let atlas = GlyphAtlas::build(&chars("A"), 54.0, &StripeRasterizer).unwrap();
        let inked = atlas.image().pixels().find(|p| p.0[3] > 0).unwrap();
        assert_eq!(inked.0, [255, 255, 255, 128]);
        let blank = atlas.image().get_pixel(ATLAS_SIZE - 1, ATLAS_SIZE - 1);
        assert_eq!(blank.0, [0, 0, 0, 0]);
    }

    #[test]
    fn sample_addresses_top_row_at_high_v() {
        let atlas = GlyphAtlas::build(&chars("#"), 64.0, &BoxRasterizer).unwrap();
        // Cell (0, 0) is the top-left of the raster.
        let top_left = atlas.sample([0.03125, 0.96875]);
        assert_eq!(top_left, Rgba::new(1.0, 1.0, 1.0, 1.0));
        let bottom_left = atlas.sample([0.03125, 0.03125]);
        assert_eq!(bottom_left, Rgba::default());
    }

    #[test]
    fn repeat_wrap_is_modular() {
        let atlas = GlyphAtlas::build(&chars("#"), 64.0, &BoxRasterizer).unwrap();
        let base = atlas.sample([0.03125, 0.96875]);
        assert_eq!(atlas.sample([1.03125, -1.03125]), base);
        assert_eq!(atlas.sample([-0.96875, 2.96875]), base);
    }

    #[test]
    fn clamp_wrap_sticks_to_border() {
        let mut set = vec![' '; 9];
        set[8] = '#';
        let repeat = GlyphAtlas::build(&set, 64.0, &BoxRasterizer).unwrap();
        // u = 1.53 wraps to 0.53, i.e. column 8 of row 0.
        assert_eq!(repeat.sample([1.53125, 0.96875]).a, 1.0);

        let clamped = repeat.with_sampling(AtlasSampling {
            wrap: WrapMode::ClampToEdge,
            filter: FilterMode::Nearest,
        });
        assert_eq!(clamped.sample([1.53125, 0.96875]).a, 0.0);
    }

    #[test]
    fn linear_filter_blends_glyph_edge() {
        let atlas = GlyphAtlas::build(&chars("#"), 64.0, &BoxRasterizer)
            .unwrap()
            .with_sampling(AtlasSampling {
                wrap: WrapMode::Repeat,
                filter: FilterMode::Linear,
            });
        // Exactly on the boundary between column 63 (ink) and 64 (blank).
        let edge = atlas.sample([64.0 / 1024.0, 0.96875]);
        assert!((edge.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn revisions_increase() {
        let a = GlyphAtlas::build(&chars("a"), 10.0, &BoxRasterizer).unwrap();
        let b = GlyphAtlas::build(&chars("a"), 10.0, &BoxRasterizer).unwrap();
        assert!(b.revision() > a.revision());
    }
}
