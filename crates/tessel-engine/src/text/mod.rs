//! Fonts for SDF text.
//!
//! A [`Font`] is an immutable glyph table (quads, advances, kerning and atlas
//! UVs) baked from TTF/OTF bytes by [`bake_font`]. The atlas image is uploaded
//! by the renderer; the resulting texture id is bound to the font.

mod bake;
mod font;

pub use bake::{bake_font, BakedFont, SdfSettings};
pub use font::{Font, Glyph};

#[cfg(test)]
pub(crate) use font::tests;

/// Error returned while loading or baking a font.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to parse font: {0}")]
    Parse(String),
    #[error("font exposes no horizontal line metrics")]
    MissingLineMetrics,
    #[error("charset is empty")]
    EmptyCharset,
    #[error(transparent)]
    Atlas(#[from] crate::texture::AtlasError),
}
