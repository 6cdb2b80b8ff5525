/// ASCII post-processing pass for asciifx.
///
/// Quantizes a framebuffer into cells, picks a glyph per cell from its
/// luminance and composites it with the selected color source.

pub mod chain;
pub mod color_map;
pub mod luminance;
pub mod pass;

pub use chain::PassChain;
pub use pass::{AsciiEffect, CellGrid};
