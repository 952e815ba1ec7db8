//! Bitmap text: glyph atlases rasterized with fontdue and laid out into meshes.

mod cache;
mod font;
mod layout;
mod packer;

pub use font::{Font, FontLoadError};
pub use layout::{FontSource, GlyphMetrics, TextLayout};
