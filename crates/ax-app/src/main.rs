use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use ax_atlas::{FontRasterizer, GlyphAtlas};
use ax_core::config::ConfigFile;
use ax_core::frame::Resolution;
use clap::Parser;

pub mod cli;
pub mod hotreload;
pub mod pipeline;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config
    let config = resolve_config(&cli)?;

    // 5. Police
    let rasterizer = match cli.font {
        Some(ref path) => FontRasterizer::from_path(path)?,
        None => FontRasterizer::from_system()?,
    };
    log::info!("Police : {}", rasterizer.source());

    if let Some(ref path) = cli.dump_atlas {
        dump_atlas(&config, &rasterizer, path)?;
    }

    let config = Arc::new(ArcSwap::from_pointee(config));

    // 6. Hot reload (thread interne notify), vivant jusqu'à la fin de main
    let _watcher = if cli.watch {
        Some(hotreload::spawn_config_watcher(&cli.config, &config)?)
    } else {
        None
    };

    // 7. Source + pipeline
    let source = pipeline::open_source(&cli, &config.load())?;
    let pipeline = pipeline::Pipeline::new(
        source,
        Box::new(rasterizer),
        Resolution::new(cli.width, cli.height),
        config,
    )?;

    // 8. Boucle principale
    pipeline::run(&cli, pipeline)
}

/// Load --config, or the defaults when the file does not exist.
fn resolve_config(cli: &cli::Cli) -> Result<ConfigFile> {
    if cli.config.exists() {
        ax_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(ConfigFile::default())
    }
}

fn dump_atlas(config: &ConfigFile, rasterizer: &FontRasterizer, path: &std::path::Path) -> Result<()> {
    let params = config.effect.validate()?;
    let atlas = GlyphAtlas::build(&params.characters, params.font_size, rasterizer)?;
    atlas
        .image()
        .save(path)
        .with_context(|| format!("Impossible d'écrire l'atlas {}", path.display()))?;
    log::info!("Atlas écrit : {}", path.display());
    Ok(())
}
