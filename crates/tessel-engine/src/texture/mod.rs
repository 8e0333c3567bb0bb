//! CPU-side textures and atlas packing.
//!
//! Atlases are baked once and consumed as immutable value data: a sprite
//! carries an [`AtlasRegion`], a glyph carries a [`UvRect`]. GPU upload is the
//! renderer's concern; it hands back a [`TextureId`] for each registered image.

mod atlas;
mod image;
mod packer;

pub use atlas::{AtlasBuilder, AtlasError, PackedAtlas};
pub use image::{AtlasImage, PixelFormat};
pub use packer::ShelfPacker;

/// Opaque handle to a texture registered with the renderer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    /// Builds a handle from a raw index.
    ///
    /// Only meaningful for ids handed out by the same renderer; exposed for tests
    /// and headless tooling.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Texture-coordinate quad.
///
/// `(u1, v1)` maps to the quad's minimum corner (bottom-left in GUI units),
/// `(u2, v2)` to its maximum corner. Because atlas rows run top-down, `v1`
/// is usually greater than `v2`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct UvRect {
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

impl UvRect {
    #[inline]
    pub const fn new(u1: f32, v1: f32, u2: f32, v2: f32) -> Self {
        Self { u1, v1, u2, v2 }
    }

    /// UV quad of an `w`×`h` pixel block at `(x, y)` (top-left) in a `size` atlas.
    pub fn from_pixels(x: u32, y: u32, w: u32, h: u32, atlas_w: u32, atlas_h: u32) -> Self {
        let aw = atlas_w.max(1) as f32;
        let ah = atlas_h.max(1) as f32;
        Self {
            u1: x as f32 / aw,
            v1: (y + h) as f32 / ah,
            u2: (x + w) as f32 / aw,
            v2: y as f32 / ah,
        }
    }
}

/// A sprite's sub-rectangle of a shared atlas texture.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasRegion {
    pub uv: UvRect,
    pub texture: TextureId,
    /// True when the backing texture carries an alpha channel.
    pub has_alpha: bool,
}
