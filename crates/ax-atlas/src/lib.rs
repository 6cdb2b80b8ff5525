/// Glyph atlas construction for asciifx.
///
/// Rasterizes a character set into a 16×16 grid texture that the effect
/// pass samples with nearest filtering and repeat wrapping.

pub mod atlas;
pub mod font;

pub use atlas::{ATLAS_CELL, ATLAS_GRID, ATLAS_SIZE, AtlasSampling, FilterMode, GlyphAtlas, WrapMode};
pub use font::{FontRasterizer, GlyphRasterizer};
