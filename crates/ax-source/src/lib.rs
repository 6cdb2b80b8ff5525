/// Upstream frame producers for asciifx (image files, procedural plane).

pub mod image;
pub mod plane;
pub mod resize;

use ax_core::CoreError;
use ax_core::config::SceneConfig;
use ax_core::traits::Source;

/// Fabrique la source procédurale choisie par l'utilisateur.
///
/// # Errors
/// Retourne une erreur si le type n'est pas reconnu ou si une dimension est nulle.
pub fn create_procedural_source(
    kind: &str,
    width: u32,
    height: u32,
    scene: &SceneConfig,
) -> anyhow::Result<Box<dyn Source>> {
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidDimensions { width, height }.into());
    }
    match kind.to_lowercase().as_str() {
        "plane" => Ok(Box::new(plane::PlaneSource::new(width, height, scene))),
        _ => anyhow::bail!("Générateur procédural inconnu : {kind}. Supporté : plane"),
    }
}
