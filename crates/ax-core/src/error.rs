use thiserror::Error;

/// Errors originating from construction or reconfiguration.
///
/// The per-pixel pass has no error path: everything that can go wrong is
/// caught here before a pass is installed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// A rendering resource (font, rasterizer backend) is unavailable.
    #[error("Ressource indisponible : {0}")]
    Resource(String),

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },
}
