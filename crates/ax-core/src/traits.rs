use std::sync::Arc;

use crate::clock::FrameClock;
use crate::config::SceneConfig;
use crate::error::CoreError;
use crate::frame::FrameBuffer;

/// Fournit des frames visuelles au pipeline.
///
/// Implémenté par : `ImageSource`, `PlaneSource`.
///
/// # Example
/// ```
/// use ax_core::traits::Source;
/// use ax_core::clock::FrameClock;
/// use ax_core::frame::FrameBuffer;
/// use std::sync::Arc;
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn next_frame(&mut self, _clock: &FrameClock) -> Option<Arc<FrameBuffer>> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn is_live(&self) -> bool { false }
/// }
/// ```
pub trait Source: Send + 'static {
    /// Produit la frame correspondant à `clock`.
    ///
    /// Retourne `None` si la source est épuisée.
    fn next_frame(&mut self, clock: &FrameClock) -> Option<Arc<FrameBuffer>>;

    /// Dimensions natives de la source (avant resize).
    fn native_size(&self) -> (u32, u32);

    /// Indique si la source est infinie (procédural) ou finie (fichier).
    fn is_live(&self) -> bool;

    /// Applique de nouveaux paramètres de scène. Ignoré par les sources statiques.
    fn set_scene(&mut self, _scene: &SceneConfig) {}
}

/// Transformation image → image, chaînable dans un pipeline de post-processing.
///
/// A pass reads `input` and writes every pixel of `output`; both have the
/// same dimensions. It must not assume it is the final stage.
///
/// # Example
/// ```
/// use ax_core::traits::PostPass;
/// use ax_core::frame::FrameBuffer;
/// use ax_core::error::CoreError;
///
/// struct Passthrough;
/// impl PostPass for Passthrough {
///     fn apply(&self, input: &FrameBuffer, output: &mut FrameBuffer) -> Result<(), CoreError> {
///         output.data.copy_from_slice(&input.data);
///         Ok(())
///     }
///     fn name(&self) -> &'static str { "copy" }
/// }
/// ```
pub trait PostPass: Send + Sync {
    /// Traite `input` et écrit le résultat dans `output`.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimensions` when the buffers disagree.
    fn apply(&self, input: &FrameBuffer, output: &mut FrameBuffer) -> Result<(), CoreError>;

    /// Nom lisible pour le debug.
    fn name(&self) -> &'static str;
}
