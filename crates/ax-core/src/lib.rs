/// Configuration, types, and shared structures for asciifx.
///
/// This crate contains the color, frame, configuration and error types
/// shared by the atlas builder, the effect pass and the sources.

pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use clock::FrameClock;
pub use color::{Rgb, Rgba};
pub use config::{ColorMode, ConfigFile, EffectConfig, EffectParameters, SceneConfig};
pub use error::CoreError;
pub use frame::{BilinearSampler, FrameBuffer, Resolution, Sampler};
