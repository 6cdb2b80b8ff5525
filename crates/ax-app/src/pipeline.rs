use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use ax_atlas::GlyphRasterizer;
use ax_core::clock::FrameClock;
use ax_core::config::ConfigFile;
use ax_core::frame::{FrameBuffer, Resolution};
use ax_core::traits::Source;
use ax_effect::AsciiEffect;
use ax_source::resize::Resizer;

use crate::cli::Cli;

/// Ouvre la source visuelle demandée en CLI.
///
/// # Errors
/// Returns an error if the image cannot be loaded or the generator is unknown.
pub fn open_source(cli: &Cli, config: &ConfigFile) -> Result<Box<dyn Source>> {
    if let Some(ref path) = cli.image {
        return Ok(Box::new(ax_source::image::ImageSource::new(path)?));
    }
    if let Some(ref kind) = cli.procedural {
        return ax_source::create_procedural_source(kind, cli.width, cli.height, &config.scene);
    }
    anyhow::bail!("Aucune source visuelle.")
}

/// Source → resize → passe ASCII, avec rechargement de config entre les frames.
pub struct Pipeline {
    source: Box<dyn Source>,
    rasterizer: Box<dyn GlyphRasterizer>,
    resizer: Resizer,
    effect: AsciiEffect,
    resolution: Resolution,
    config: Arc<ArcSwap<ConfigFile>>,
    applied: Arc<ConfigFile>,
    output: FrameBuffer,
}

impl Pipeline {
    /// Build the effect from the current config.
    ///
    /// # Errors
    /// Returns an error if the initial configuration is invalid or the atlas
    /// cannot be built.
    pub fn new(
        mut source: Box<dyn Source>,
        rasterizer: Box<dyn GlyphRasterizer>,
        resolution: Resolution,
        config: Arc<ArcSwap<ConfigFile>>,
    ) -> Result<Self> {
        let applied = config.load_full();
        let effect = AsciiEffect::new(&applied.effect, rasterizer.as_ref())
            .context("Configuration de l'effet invalide")?;
        source.set_scene(&applied.scene);
        log::info!(
            "Pipeline {}x{} : {} glyphes, source {}x{}",
            resolution.width,
            resolution.height,
            effect.atlas().glyph_count(),
            source.native_size().0,
            source.native_size().1
        );
        Ok(Self {
            source,
            rasterizer,
            resizer: Resizer::new(),
            effect,
            resolution,
            config,
            applied,
            output: FrameBuffer::new(resolution.width, resolution.height),
        })
    }

    /// Active effect.
    #[must_use]
    pub fn effect(&self) -> &AsciiEffect {
        &self.effect
    }

    /// Apply a newly published config, if any.
    ///
    /// Returns `true` if the effect now runs with the new config. An invalid
    /// config is logged and the previous effect stays active.
    pub fn poll_reload(&mut self) -> bool {
        let latest = self.config.load_full();
        if Arc::ptr_eq(&latest, &self.applied) {
            return false;
        }
        let result = self
            .effect
            .reconfigure(&latest.effect, self.rasterizer.as_ref());
        // Ne plus retenter ce pointeur, qu'il soit valide ou non.
        self.applied = Arc::clone(&latest);
        match result {
            Ok(()) => {
                self.source.set_scene(&latest.scene);
                log::info!("Effet reconfiguré");
                true
            }
            Err(e) => {
                log::warn!("Config rejetée, effet précédent conservé : {e}");
                false
            }
        }
    }

    /// Render one frame. `None` when the source has nothing for this tick.
    ///
    /// # Errors
    /// Returns an error if resizing or the pass fails.
    pub fn render_frame(&mut self, clock: &FrameClock) -> Result<Option<&FrameBuffer>> {
        self.poll_reload();
        let Some(frame) = self.source.next_frame(clock) else {
            return Ok(None);
        };
        let input = self.resizer.resize_to(&frame, self.resolution)?;
        self.effect.render(&input, &mut self.output)?;
        Ok(Some(&self.output))
    }
}

/// Chemin de la frame `frame` : le fichier lui-même, ou `out/frame_NNNNN.png`
/// pour une séquence.
#[must_use]
pub fn frame_path(out: &Path, frame: u64, sequence: bool) -> PathBuf {
    if sequence {
        out.join(format!("frame_{frame:05}.png"))
    } else {
        out.to_path_buf()
    }
}

/// Encode a frame as PNG.
///
/// # Errors
/// Returns an error if the buffer is inconsistent or the file cannot be written.
pub fn save_frame(frame: &FrameBuffer, path: &Path) -> Result<()> {
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .context("Buffer de frame incohérent")?;
    img.save(path)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))
}

/// Boucle principale : rend `cli.frames` frames (0 = sans fin) et les écrit.
///
/// # Errors
/// Returns the first rendering or I/O error.
pub fn run(cli: &Cli, mut pipeline: Pipeline) -> Result<()> {
    let sequence = cli.is_sequence();
    if sequence {
        std::fs::create_dir_all(&cli.out)
            .with_context(|| format!("Impossible de créer {}", cli.out.display()))?;
    }
    let paced = cli.frames == 0 || cli.watch;
    let frame_budget = std::time::Duration::from_secs_f64(1.0 / f64::from(cli.fps.max(1)));

    let mut clock = FrameClock::at_frame(0, cli.fps);
    let mut written = 0u64;
    while cli.frames == 0 || clock.frame < cli.frames {
        let started = std::time::Instant::now();
        if let Some(frame) = pipeline.render_frame(&clock)? {
            let path = frame_path(&cli.out, clock.frame, sequence);
            save_frame(frame, &path)?;
            log::debug!("Frame {} → {}", clock.frame, path.display());
            written += 1;
        } else {
            log::trace!("Frame {} sautée : source vide", clock.frame);
        }
        clock = clock.advance(cli.fps);

        if paced && let Some(rest) = frame_budget.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    log::info!("{written} frame(s) écrite(s) dans {}", cli.out.display());
    Ok(())
}
