use ax_atlas::{ATLAS_GRID, GlyphAtlas, GlyphRasterizer};
use ax_core::config::{EffectConfig, EffectParameters};
use ax_core::frame::{FrameBuffer, Resolution, Sampler};
use ax_core::traits::PostPass;
use ax_core::{CoreError, Rgba};
use rayon::prelude::*;

use crate::color_map::select_color;
use crate::luminance::{atlas_offset, classify, glyph_index};

/// Géométrie des cellules ASCII pour une résolution donnée.
///
/// `cell` is the number of cells across each axis; the horizontal count is
/// derived from the vertical one so glyphs keep their aspect whatever the
/// output shape. `grid` is the UV size of one block.
///
/// # Example
/// ```
/// use ax_core::config::EffectConfig;
/// use ax_core::frame::Resolution;
/// use ax_effect::pass::CellGrid;
/// let params = EffectConfig::default().validate().unwrap();
/// let grid = CellGrid::derive(Resolution::new(1280, 720), &params);
/// assert_eq!(grid.cell, [45.0, 45.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellGrid {
    /// Cells per axis.
    pub cell: [f32; 2],
    /// UV extent of one block per axis.
    pub grid: [f32; 2],
}

impl CellGrid {
    /// Derive the grid from the output height, cell size, aspect and block size.
    #[must_use]
    pub fn derive(resolution: Resolution, params: &EffectParameters) -> Self {
        let cell_y = resolution.height as f32 / params.cell_size;
        let cell_x = cell_y * params.char_aspect_ratio;
        Self {
            cell: [cell_x, cell_y],
            grid: [params.block_size / cell_x, params.block_size / cell_y],
        }
    }

    /// Center of the block enclosing `uv`.
    #[inline(always)]
    #[must_use]
    pub fn pixelize(&self, uv: [f32; 2]) -> [f32; 2] {
        [
            self.grid[0] * ((uv[0] / self.grid[0]).floor() + 0.5),
            self.grid[1] * ((uv[1] / self.grid[1]).floor() + 0.5),
        ]
    }

    /// Atlas coordinate of `uv` inside glyph `index`.
    ///
    /// Lands in `[-1/16, 0)` vertically before the offset and relies on the
    /// atlas wrapping modulo 1.
    #[inline(always)]
    #[must_use]
    pub fn glyph_uv(&self, uv: [f32; 2], index: usize) -> [f32; 2] {
        let step = 1.0 / ATLAS_GRID as f32;
        let offset = atlas_offset(index);
        [
            glsl_mod(uv[0] * (self.cell[0] * step), step) + offset[0],
            glsl_mod(uv[1] * (self.cell[1] * step), step) - step + offset[1],
        ]
    }
}

/// `x - y * floor(x / y)`.
#[inline(always)]
fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

/// Le pass ASCII : paramètres validés + atlas de glyphes associé.
///
/// # Example
/// ```no_run
/// use ax_atlas::FontRasterizer;
/// use ax_core::config::EffectConfig;
/// use ax_core::frame::FrameBuffer;
/// use ax_effect::AsciiEffect;
///
/// let font = FontRasterizer::from_system().unwrap();
/// let effect = AsciiEffect::new(&EffectConfig::default(), &font).unwrap();
/// let input = FrameBuffer::filled(64, 64, [255, 255, 255, 255]);
/// let mut output = FrameBuffer::new(64, 64);
/// effect.render(&input, &mut output).unwrap();
/// ```
pub struct AsciiEffect {
    params: EffectParameters,
    atlas: GlyphAtlas,
}

impl AsciiEffect {
    /// Validate `config` and rasterize its atlas.
    ///
    /// # Errors
    /// Returns `CoreError::Config` for an invalid configuration, or whatever
    /// the atlas build reports.
    pub fn new(config: &EffectConfig, rasterizer: &dyn GlyphRasterizer) -> Result<Self, CoreError> {
        let params = config.validate()?;
        let atlas = GlyphAtlas::build(&params.characters, params.font_size, rasterizer)?;
        log::info!(
            "Effet ASCII prêt : {} glyphes, cell_size={}, atlas r{}",
            params.glyph_count(),
            params.cell_size,
            atlas.revision()
        );
        Ok(Self { params, atlas })
    }

    /// Replace the parameters wholesale.
    ///
    /// The atlas is rebuilt only when the character set or font size
    /// changed. On error `self` is left exactly as it was.
    ///
    /// # Errors
    /// Same as [`AsciiEffect::new`].
    pub fn reconfigure(
        &mut self,
        config: &EffectConfig,
        rasterizer: &dyn GlyphRasterizer,
    ) -> Result<(), CoreError> {
        let params = config.validate()?;
        let same_atlas = params.characters == self.atlas.characters()
            && params.font_size.to_bits() == self.atlas.font_size().to_bits();
        if !same_atlas {
            let atlas = GlyphAtlas::build(&params.characters, params.font_size, rasterizer)?;
            log::info!("Atlas reconstruit (r{})", atlas.revision());
            self.atlas = atlas;
        }
        self.params = params;
        Ok(())
    }

    /// Active parameters.
    #[must_use]
    pub fn params(&self) -> &EffectParameters {
        &self.params
    }

    /// Glyph atlas owned by this pass.
    #[must_use]
    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Couleur de sortie pour un pixel.
    ///
    /// Pure function of its arguments; safe to evaluate for any pixel in
    /// any order.
    #[must_use]
    pub fn shade<S: Sampler + ?Sized>(&self, uv: [f32; 2], resolution: Resolution, sampler: &S) -> Rgba {
        if self.params.disabled {
            return sampler.sample(uv);
        }
        self.shade_in(&CellGrid::derive(resolution, &self.params), uv, sampler)
    }

    #[inline(always)]
    fn shade_in<S: Sampler + ?Sized>(&self, grid: &CellGrid, uv: [f32; 2], sampler: &S) -> Rgba {
        let p = &self.params;
        let pixelized = sampler.sample(grid.pixelize(uv));
        let lum = classify(pixelized.rgb(), p.brightness, p.invert);

        let index = glyph_index(lum, self.atlas.glyph_count());
        let glyph = self.atlas.sample(grid.glyph_uv(uv, index));

        let selected = select_color(&p.color_mode, lum, pixelized.rgb());
        p.background
            .mix(selected.scale(glyph.r), glyph.a)
            .with_alpha(pixelized.a)
    }

    /// Applique l'effet sur toute l'image, lignes réparties sur rayon.
    ///
    /// A disabled pass copies `input` verbatim.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimensions` if the buffers are empty or
    /// differ in size.
    pub fn render(&self, input: &FrameBuffer, output: &mut FrameBuffer) -> Result<(), CoreError> {
        if input.width == 0
            || input.height == 0
            || input.width != output.width
            || input.height != output.height
            || input.data.len() != output.data.len()
        {
            return Err(CoreError::InvalidDimensions {
                width: output.width,
                height: output.height,
            });
        }

        if self.params.disabled {
            output.data.copy_from_slice(&input.data);
            return Ok(());
        }

        let resolution = input.resolution();
        let grid = CellGrid::derive(resolution, &self.params);
        let sampler = input.sampler();
        let stride = input.width as usize * 4;

        output
            .data
            .par_chunks_exact_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let uv = resolution.pixel_center_uv(x as u32, y as u32);
                    px.copy_from_slice(&self.shade_in(&grid, uv, &sampler).to_u8());
                }
            });

        Ok(())
    }
}

impl PostPass for AsciiEffect {
    fn apply(&self, input: &FrameBuffer, output: &mut FrameBuffer) -> Result<(), CoreError> {
        self.render(input, output)
    }

    fn name(&self) -> &'static str {
        "ascii"
    }
}

#[cfg(test)]
mod tests {
    use ax_core::Rgb;

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

    /// Inks only the upper half of the glyph box, at half coverage.
    struct TopHalfRasterizer;

    impl GlyphRasterizer for TopHalfRasterizer {
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
            for y in y0..center.1 as i32 {
                for x in x0..x0 + font_size as i32 {
                    plot(x, y, 0.5);
                }
            }
        }
    }

    fn config(characters: &str) -> EffectConfig {
        EffectConfig {
            characters: characters.into(),
            font_size: 64.0,
            ..EffectConfig::default()
        }
    }

    fn gradient(width: u32, height: u32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 255) / width.max(1)) as u8;
                fb.set_pixel(x, y, [v, (y * 7) as u8, 255 - v, 255]);
            }
        }
        fb
    }

    fn run(effect: &AsciiEffect, input: &FrameBuffer) -> FrameBuffer {
        let mut output = FrameBuffer::new(input.width, input.height);
        effect.render(input, &mut output).unwrap();
        output
    }

    fn rgb_u8(c: Rgb) -> [u8; 3] {
        let px = c.with_alpha(1.0).to_u8();
        [px[0], px[1], px[2]]
    }

    #[test]
    fn glyph_top_lands_at_cell_top_with_partial_coverage() {
        // 18 glyphs: white picks index 17, second row of the atlas.
        let effect = AsciiEffect::new(
            &EffectConfig {
                cell_size: 64.0,
                use_original_colors: false,
                fg_color: Rgb::from_u8(200, 0, 0),
                bg_color: Rgb::from_u8(0, 0, 100),
                ..config(" abcdefghijklmnopq")
            },
            &TopHalfRasterizer,
        )
        .unwrap();
        assert_eq!(effect.atlas().glyph_count(), 18);

        let out = run(&effect, &FrameBuffer::filled(64, 64, [255, 255, 255, 255]));
        for y in [0, 8, 24] {
            assert_eq!(out.pixel(32, y), (100, 0, 50, 255), "row {y}");
        }
        for y in [40, 56, 63] {
            assert_eq!(out.pixel(32, y), (0, 0, 100, 255), "row {y}");
        }
    }

    #[test]
    fn disabled_is_identity() {
        let effect = AsciiEffect::new(
            &EffectConfig {
                disabled: true,
                ..config(" .:#@")
            },
            &BoxRasterizer,
        )
        .unwrap();
        let input = gradient(37, 23);
        assert_eq!(run(&effect, &input), input);

        let sampler = input.sampler();
        for uv in [[0.1, 0.2], [0.5, 0.5], [0.93, 0.07]] {
            assert_eq!(
                effect.shade(uv, input.resolution(), &sampler),
                sampler.sample(uv)
            );
        }
    }

    #[test]
    fn black_selects_first_glyph_on_background() {
        let bg = Rgb::from_u8(0x10, 0x20, 0x30);
        let effect = AsciiEffect::new(
            &EffectConfig {
                cell_size: 64.0,
                bg_color: bg,
                ..config(" #")
            },
            &BoxRasterizer,
        )
        .unwrap();
        let out = run(&effect, &FrameBuffer::filled(64, 64, [0, 0, 0, 255]));
        let [r, g, b] = rgb_u8(bg);
        for px in out.data.chunks_exact(4) {
            assert_eq!(px, [r, g, b, 255]);
        }
    }

    #[test]
    fn white_selects_last_glyph_in_each_color_mode() {
        let red = Rgb::from_u8(255, 0, 0);
        let ramp = [
            Rgb::from_u8(1, 2, 3),
            Rgb::from_u8(4, 5, 6),
            Rgb::from_u8(7, 8, 9),
            Rgb::from_u8(200, 100, 50),
        ];
        let modes = [
            (
                EffectConfig {
                    use_original_colors: false,
                    fg_color: red,
                    ..config(" #")
                },
                [255u8, 0, 0],
            ),
            (config(" #"), [255, 255, 255]),
            (
                EffectConfig {
                    use_color_array: true,
                    color_array: ramp.to_vec(),
                    ..config(" #")
                },
                [200, 100, 50],
            ),
        ];

        let white = FrameBuffer::filled(64, 64, [255, 255, 255, 255]);
        for (cfg, expected) in modes {
            let effect = AsciiEffect::new(
                &EffectConfig {
                    cell_size: 64.0,
                    ..cfg
                },
                &BoxRasterizer,
            )
            .unwrap();
            let out = run(&effect, &white);
            for px in out.data.chunks_exact(4) {
                assert_eq!(px[..3], expected);
                assert_eq!(px[3], 255);
            }
        }
    }

    #[test]
    fn ramp_output_is_always_a_ramp_color() {
        let ramp = [
            Rgb::from_u8(0x46, 0x22, 0x55),
            Rgb::from_u8(0x31, 0x3b, 0x72),
            Rgb::from_u8(0x62, 0xa8, 0x7c),
            Rgb::from_u8(0x7e, 0xe0, 0x81),
        ];
        let effect = AsciiEffect::new(
            &EffectConfig {
                cell_size: 8.0,
                use_color_array: true,
                color_array: ramp.to_vec(),
                ..config("@#%")
            },
            &BoxRasterizer,
        )
        .unwrap();
        let out = run(&effect, &gradient(64, 64));
        let allowed: Vec<[u8; 3]> = ramp.iter().map(|&c| rgb_u8(c)).collect();
        let mut seen = [false; 4];
        for px in out.data.chunks_exact(4) {
            let rgb = [px[0], px[1], px[2]];
            let pos = allowed.iter().position(|&c| c == rgb);
            assert!(pos.is_some(), "unexpected color {rgb:?}");
            if let Some(i) = pos {
                seen[i] = true;
            }
        }
        assert!(seen.iter().filter(|&&s| s).count() >= 2);
    }

    #[test]
    fn original_colors_follow_the_cell_sample() {
        let effect = AsciiEffect::new(
            &EffectConfig {
                cell_size: 8.0,
                ..config("@#")
            },
            &BoxRasterizer,
        )
        .unwrap();
        let input = FrameBuffer::filled(64, 64, [200, 100, 50, 255]);
        let out = run(&effect, &input);
        assert_eq!(out, input);
    }

    #[test]
    fn output_alpha_comes_from_the_source() {
        let effect = AsciiEffect::new(&config(" .:#@"), &BoxRasterizer).unwrap();
        let out = run(&effect, &FrameBuffer::filled(32, 32, [90, 90, 90, 128]));
        assert!(out.data.chunks_exact(4).all(|px| px[3] == 128));
    }

    #[test]
    fn invert_on_black_matches_plain_on_white() {
        let base = EffectConfig {
            cell_size: 8.0,
            use_original_colors: false,
            ..config(" .:#")
        };
        let plain = AsciiEffect::new(&base, &BoxRasterizer).unwrap();
        let inverted = AsciiEffect::new(
            &EffectConfig {
                invert: true,
                ..base
            },
            &BoxRasterizer,
        )
        .unwrap();
        let white = run(&plain, &FrameBuffer::filled(64, 64, [255, 255, 255, 255]));
        let black = run(&inverted, &FrameBuffer::filled(64, 64, [0, 0, 0, 255]));
        assert_eq!(white, black);
    }

    #[test]
    fn zero_brightness_draws_only_the_first_glyph() {
        let effect = AsciiEffect::new(
            &EffectConfig {
                brightness: 0.0,
                ..config(" @")
            },
            &BoxRasterizer,
        )
        .unwrap();
        let out = run(&effect, &gradient(48, 48));
        assert!(out.data.chunks_exact(4).all(|px| px[..3] == [0u8, 0, 0]));
    }

    #[test]
    fn cell_grid_uses_height_and_aspect() {
        let params = EffectConfig {
            cell_size: 10.0,
            block_size: 2.0,
            char_aspect_ratio: 0.5,
            ..EffectConfig::default()
        }
        .validate()
        .unwrap();
        let grid = CellGrid::derive(Resolution::new(1000, 200), &params);
        assert_eq!(grid.cell, [10.0, 20.0]);
        assert_eq!(grid.grid, [0.2, 0.1]);
        let center = grid.pixelize([0.33, 0.01]);
        assert!((center[0] - 0.3).abs() < 1e-6);
        assert!((center[1] - 0.05).abs() < 1e-6);
    }

    #[test]
    fn parallel_render_matches_per_pixel_shade() {
        let effect = AsciiEffect::new(&config(" .:-=+*#%@"), &BoxRasterizer).unwrap();
        let input = gradient(40, 30);
        let out = run(&effect, &input);
        let res = input.resolution();
        let sampler = input.sampler();
        for y in 0..30 {
            for x in 0..40 {
                let expected = effect.shade(res.pixel_center_uv(x, y), res, &sampler).to_u8();
                let (r, g, b, a) = out.pixel(x, y);
                assert_eq!([r, g, b, a], expected, "pixel ({x}, {y})");
            }
        }
        assert_eq!(run(&effect, &input), out);
    }

    #[test]
    fn render_rejects_mismatched_buffers() {
        let effect = AsciiEffect::new(&config(" #"), &BoxRasterizer).unwrap();
        let input = FrameBuffer::new(8, 8);
        let mut output = FrameBuffer::new(8, 4);
        assert!(matches!(
            effect.render(&input, &mut output),
            Err(CoreError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn reconfigure_reuses_atlas_when_glyphs_unchanged() {
        let mut effect = AsciiEffect::new(&config(" #"), &BoxRasterizer).unwrap();
        let first = effect.atlas().revision();

        effect
            .reconfigure(
                &EffectConfig {
                    invert: true,
                    ..config(" #")
                },
                &BoxRasterizer,
            )
            .unwrap();
        assert!(effect.params().invert);
        assert_eq!(effect.atlas().revision(), first);

        effect.reconfigure(&config(" .#"), &BoxRasterizer).unwrap();
        assert!(effect.atlas().revision() > first);
        assert_eq!(effect.atlas().glyph_count(), 3);
    }

    #[test]
    fn reconfigure_keeps_previous_state_on_error() {
        let mut effect = AsciiEffect::new(&config(" #"), &BoxRasterizer).unwrap();
        let before = effect.params().clone();
        let result = effect.reconfigure(&config(""), &BoxRasterizer);
        assert!(matches!(result, Err(CoreError::Config(_))));
        assert_eq!(effect.params(), &before);
    }
}
