use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::CoreError;

/// Jeu de caractères par défaut, du plus clair au plus dense.
pub const DEFAULT_CHARACTERS: &str = " .,'^:-=+*?!|0%#XWM@";

/// Nombre maximal de glyphes qu'un atlas 16×16 peut contenir.
pub const MAX_GLYPHS: usize = 256;

/// Taille exacte de la rampe de couleurs.
pub const RAMP_LEN: usize = 4;

/// Configuration brute de l'effet ASCII, telle que lue depuis TOML.
///
/// Every field has a default; a partial `[effect]` table only overrides
/// what it names. Call [`EffectConfig::validate`] before handing it to a pass.
///
/// # Example
/// ```
/// use ax_core::config::EffectConfig;
/// let config = EffectConfig::default();
/// assert_eq!(config.cell_size, 16.0);
/// assert!(config.use_original_colors);
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectConfig {
    /// Glyphes, du plus sombre au plus lumineux.
    pub characters: String,
    /// Taille de police de l'atlas, en pixels.
    pub font_size: f32,
    /// Hauteur d'une cellule, en pixels écran.
    pub cell_size: f32,
    /// Multiplicateur de sous-échantillonnage.
    pub block_size: f32,
    /// Ratio largeur/hauteur d'une cellule.
    pub char_aspect_ratio: f32,
    /// Couleur des glyphes en mode premier plan.
    pub fg_color: Rgb,
    /// Couleur de fond.
    pub bg_color: Rgb,
    /// Colorer par bande de luminance (prioritaire).
    pub use_color_array: bool,
    /// Rampe de couleurs, exactement 4 entrées si `use_color_array`.
    pub color_array: Vec<Rgb>,
    /// Inverser la luminance.
    pub invert: bool,
    /// Colorer avec la couleur source de la cellule.
    pub use_original_colors: bool,
    /// Poids appliqué à la luminance.
    pub brightness: f32,
    /// Bypass complet de l'effet.
    pub disabled: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            characters: DEFAULT_CHARACTERS.to_string(),
            font_size: 54.0,
            cell_size: 16.0,
            block_size: 1.0,
            char_aspect_ratio: 1.0,
            fg_color: Rgb::WHITE,
            bg_color: Rgb::BLACK,
            use_color_array: false,
            color_array: vec![
                Rgb::from_u8(0x46, 0x22, 0x55),
                Rgb::from_u8(0x31, 0x3b, 0x72),
                Rgb::from_u8(0x62, 0xa8, 0x7c),
                Rgb::from_u8(0x7e, 0xe0, 0x81),
                Rgb::from_u8(0xc3, 0xf3, 0xc0),
            ],
            invert: false,
            use_original_colors: true,
            brightness: 1.0,
            disabled: false,
        }
    }
}

/// Source of the glyph tint, resolved by priority `Ramp > Original > Foreground`.
///
/// # Example
/// ```
/// use ax_core::config::{ColorMode, EffectConfig};
/// let params = EffectConfig::default().validate().unwrap();
/// assert_eq!(params.color_mode, ColorMode::Original);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorMode {
    /// Une couleur par quart de luminance.
    Ramp([Rgb; RAMP_LEN]),
    /// Couleur pixelisée de la source.
    Original,
    /// Couleur unique.
    Foreground(Rgb),
}

/// Paramètres validés consommés par le pass.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectParameters {
    /// Glyphes, l'ordre fixe le mapping de luminance. Non vide, ≤ `MAX_GLYPHS`.
    pub characters: Vec<char>,
    /// Taille de police (> 0).
    pub font_size: f32,
    /// Cellules sur la hauteur (> 0).
    pub cell_size: f32,
    /// Sous-échantillonnage (> 0).
    pub block_size: f32,
    /// Ratio de cellule (> 0).
    pub char_aspect_ratio: f32,
    /// Fond.
    pub background: Rgb,
    /// Stratégie de couleur.
    pub color_mode: ColorMode,
    /// Luminance inversée.
    pub invert: bool,
    /// Poids de luminance (≥ 0).
    pub brightness: f32,
    /// Bypass.
    pub disabled: bool,
}

impl EffectParameters {
    /// Number of usable glyphs.
    #[inline]
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.characters.len()
    }
}

impl EffectConfig {
    /// Validate once and produce the typed parameter set.
    ///
    /// Nothing is clamped or replaced by a default: any out-of-range value
    /// is an error.
    ///
    /// # Errors
    /// Returns `CoreError::Config` naming the first offending field.
    ///
    /// # Example
    /// ```
    /// use ax_core::config::EffectConfig;
    /// let mut config = EffectConfig::default();
    /// config.characters.clear();
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<EffectParameters, CoreError> {
        let characters: Vec<char> = self.characters.chars().collect();
        if characters.is_empty() {
            return Err(CoreError::Config(
                "characters : le jeu de caractères est vide".into(),
            ));
        }
        if characters.len() > MAX_GLYPHS {
            return Err(CoreError::Config(format!(
                "characters : {} glyphes, l'atlas en contient au plus {MAX_GLYPHS}",
                characters.len()
            )));
        }

        positive("font_size", self.font_size)?;
        positive("cell_size", self.cell_size)?;
        positive("block_size", self.block_size)?;
        positive("char_aspect_ratio", self.char_aspect_ratio)?;
        if !self.brightness.is_finite() || self.brightness < 0.0 {
            return Err(CoreError::Config(format!(
                "brightness : doit être ≥ 0, reçu {}",
                self.brightness
            )));
        }

        Ok(EffectParameters {
            characters,
            font_size: self.font_size,
            cell_size: self.cell_size,
            block_size: self.block_size,
            char_aspect_ratio: self.char_aspect_ratio,
            background: self.bg_color,
            color_mode: self.color_mode()?,
            invert: self.invert,
            brightness: self.brightness,
            disabled: self.disabled,
        })
    }

    fn color_mode(&self) -> Result<ColorMode, CoreError> {
        if self.use_color_array {
            let ramp: [Rgb; RAMP_LEN] = self.color_array.as_slice().try_into().map_err(|_| {
                CoreError::Config(format!(
                    "color_array : {RAMP_LEN} couleurs requises avec use_color_array, reçu {}",
                    self.color_array.len()
                ))
            })?;
            Ok(ColorMode::Ramp(ramp))
        } else if self.use_original_colors {
            Ok(ColorMode::Original)
        } else {
            Ok(ColorMode::Foreground(self.fg_color))
        }
    }
}

fn positive(field: &str, value: f32) -> Result<(), CoreError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CoreError::Config(format!(
            "{field} : doit être > 0, reçu {value}"
        )))
    }
}

/// Paramètres de la scène procédurale.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Multiplicateur de déformation du plan animé.
    pub offset: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self { offset: 1.0 }
    }
}

/// Fichier de configuration complet : tables `[effect]` et `[scene]`.
///
/// # Example
/// ```
/// use ax_core::config::parse_config;
/// let file = parse_config("[effect]\ninvert = true\n").unwrap();
/// assert!(file.effect.invert);
/// assert_eq!(file.scene.offset, 1.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Effect parameters.
    pub effect: EffectConfig,
    /// Scene parameters.
    pub scene: SceneConfig,
}

/// Parse a TOML document; missing tables and keys take their defaults.
///
/// # Errors
/// Returns an error on malformed TOML, unknown keys or invalid colors.
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    toml::from_str(content).context("Erreur de parsing TOML")
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// Only parses; semantic checks happen in [`EffectConfig::validate`] when
/// the pass is (re)built.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use ax_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let file = parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))?;
    log::debug!("Config chargée depuis {}", path.display());
    Ok(file)
}
