//! Primitive variants and their shared geometry/compare contract.

mod rect;
mod sprite;
mod text;

pub use rect::RectShape;
pub use sprite::SpriteShape;
pub use text::TextShape;

use crate::coords::{Projection, Rect, Vec2};
use crate::paint::Color;
use crate::texture::TextureId;

use super::mesh::MeshOut;
use super::DiffState;

/// Placement and color common to every variant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapeBase {
    pub clip: Rect,
    /// Unclipped extent (normalized).
    pub rect: Rect,
    pub color: Color,
}

impl ShapeBase {
    pub fn new(clip: Rect, pos: Vec2, size: Vec2, color: Color) -> Self {
        Self {
            clip: clip.normalized(),
            rect: Rect::from_origin_size(pos, size).normalized(),
            color,
        }
    }

    /// The extent clamped to the clip rectangle.
    pub fn bounding_box(&self) -> Rect {
        Rect::from_min_max(
            self.clip.clamp_point(self.rect.min()),
            self.clip.clamp_point(self.rect.max()),
        )
    }

    /// Clip and extent equal within one device pixel.
    pub fn same_geometry(&self, other: &ShapeBase, proj: &Projection) -> bool {
        self.clip.approx_eq(other.clip, proj.pixel) && self.rect.approx_eq(other.rect, proj.pixel)
    }
}

/// GPU program a batch is drawn with, named by its representative primitive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Program {
    /// Flat color, no texture.
    Flat,
    /// Color times an RGBA/R8 atlas sample.
    Sprite(TextureId),
    /// Color times a signed-distance glyph atlas.
    Text(TextureId),
}

/// One retained drawable unit.
#[derive(Debug, Clone)]
pub enum Primitive {
    Rect(RectShape),
    Sprite(SpriteShape),
    Text(TextShape),
}

impl Primitive {
    #[inline]
    pub fn base(&self) -> &ShapeBase {
        match self {
            Primitive::Rect(p) => &p.base,
            Primitive::Sprite(p) => &p.base,
            Primitive::Text(p) => &p.base,
        }
    }

    #[inline]
    pub fn bounding_box(&self) -> Rect {
        self.base().bounding_box()
    }

    /// Strict overlap of the clipped boxes.
    #[inline]
    pub fn overlaps(&self, other: &Primitive) -> bool {
        self.bounding_box().overlaps(other.bounding_box())
    }

    /// Whether draw order relative to overlapping neighbors matters.
    pub fn is_ordered(&self) -> bool {
        match self {
            Primitive::Rect(p) => p.is_ordered(),
            Primitive::Sprite(p) => p.is_ordered(),
            Primitive::Text(_) => true,
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Primitive::Rect(_) | Primitive::Sprite(_) => super::mesh::QUAD_VERTICES,
            Primitive::Text(p) => p.vertex_count(),
        }
    }

    pub fn program(&self) -> Program {
        match self {
            Primitive::Rect(_) => Program::Flat,
            Primitive::Sprite(p) => Program::Sprite(p.region.texture),
            Primitive::Text(p) => Program::Text(p.font.texture()),
        }
    }

    /// Whether both can share one draw call.
    ///
    /// Symmetric; different variants never batch. Orderedness is part of the
    /// key because an ordered batch blends and an opaque one does not.
    pub fn batchable(&self, other: &Primitive) -> bool {
        match (self, other) {
            (Primitive::Rect(a), Primitive::Rect(b)) => a.is_ordered() == b.is_ordered(),
            (Primitive::Sprite(a), Primitive::Sprite(b)) => {
                a.region.texture == b.region.texture && a.is_ordered() == b.is_ordered()
            }
            (Primitive::Text(a), Primitive::Text(b)) => a.font.texture() == b.font.texture(),
            _ => false,
        }
    }

    /// Diffs the retained primitive against the one requested this frame.
    pub fn compare(&self, next: &Primitive, proj: &Projection) -> DiffState {
        match (self, next) {
            (Primitive::Rect(a), Primitive::Rect(b)) => a.compare(b, proj),
            (Primitive::Sprite(a), Primitive::Sprite(b)) => a.compare(b, proj),
            (Primitive::Text(a), Primitive::Text(b)) => a.compare(b, proj),
            _ => DiffState::MISMATCH,
        }
    }

    /// Writes the streams selected by `dirty` into `out`.
    ///
    /// `out` must hold exactly [`Primitive::vertex_count`] vertices.
    pub fn gen_mesh(&self, level: f32, dirty: DiffState, out: &mut MeshOut<'_>, proj: &Projection) {
        match self {
            Primitive::Rect(p) => p.gen_mesh(level, dirty, out, proj),
            Primitive::Sprite(p) => p.gen_mesh(level, dirty, out, proj),
            Primitive::Text(p) => p.gen_mesh(level, dirty, out, proj),
        }
    }
}
