use crate::coords::{Projection, Vec2};
use crate::paint::Color;
use crate::scene::mesh::{MeshOut, Quad};
use crate::scene::{DiffState, DrawList};
use crate::texture::UvRect;

use super::{Primitive, ShapeBase};

/// Flat-colored rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct RectShape {
    pub base: ShapeBase,
}

impl RectShape {
    #[inline]
    pub fn new(clip: crate::coords::Rect, pos: Vec2, size: Vec2, color: Color) -> Self {
        Self { base: ShapeBase::new(clip, pos, size, color) }
    }

    #[inline]
    pub fn is_ordered(&self) -> bool {
        !self.base.color.is_opaque()
    }

    pub(super) fn compare(&self, next: &RectShape, proj: &Projection) -> DiffState {
        if self.is_ordered() != next.is_ordered() {
            return DiffState::MISMATCH;
        }

        let mut diff = DiffState::empty();
        if !self.base.same_geometry(&next.base, proj) {
            diff |= DiffState::XYZW;
        }
        if !self.base.color.approx_eq(next.base.color) {
            diff |= DiffState::RGBA;
        }
        diff
    }

    pub(super) fn gen_mesh(&self, level: f32, dirty: DiffState, out: &mut MeshOut<'_>, proj: &Projection) {
        let r = self.base.rect;
        let quad = Quad::new(r.min(), r.max(), UvRect::default()).clipped(self.base.clip);
        out.write_quad(0, &quad, level, self.base.color.to_rgba8(), dirty, proj);
    }
}

impl DrawList {
    /// Draws a flat rectangle with its minimum corner at `pos`.
    #[inline]
    pub fn rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        let shape = RectShape::new(self.current_clip(), pos, size, color);
        self.draw(Primitive::Rect(shape));
    }
}
