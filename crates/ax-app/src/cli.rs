use std::path::PathBuf;

use clap::Parser;

/// asciifx : rendu ASCII d'images et de scènes procédurales.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source visuelle : chemin vers une image (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Générateur procédural : "plane".
    #[arg(long)]
    pub procedural: Option<String>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Police TTF/OTF pour l'atlas. Défaut : police système.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Largeur de sortie en pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Hauteur de sortie en pixels.
    #[arg(long, default_value_t = 1280)]
    pub height: u32,

    /// Nombre de frames à rendre (0 = jusqu'à interruption).
    #[arg(long, default_value_t = 1)]
    pub frames: u64,

    /// Cadence de l'horloge d'animation.
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Sortie PNG, ou dossier pour une séquence numérotée.
    #[arg(short, long, default_value = "asciifx.png")]
    pub out: PathBuf,

    /// Écrit l'atlas de glyphes en PNG puis continue.
    #[arg(long)]
    pub dump_atlas: Option<PathBuf>,

    /// Recharge la config à chaque modification du fichier.
    #[arg(long, default_value_t = false)]
    pub watch: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one visual source is provided and the canvas is usable.
    ///
    /// # Errors
    /// Returns an error if zero or both sources are specified, or a dimension is zero.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        let count = usize::from(self.image.is_some()) + usize::from(self.procedural.is_some());

        if count == 0 {
            anyhow::bail!("Aucune source visuelle spécifiée. Utilisez --image ou --procedural.");
        }
        if count > 1 {
            anyhow::bail!("Une seule source visuelle à la fois. Spécifiez --image OU --procedural.");
        }
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("Dimensions de sortie invalides : {}x{}", self.width, self.height);
        }
        Ok(())
    }

    /// `true` when output goes to a numbered sequence rather than one file.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.frames != 1 || self.out.is_dir()
    }
}
