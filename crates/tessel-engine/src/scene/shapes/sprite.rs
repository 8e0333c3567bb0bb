use crate::coords::{Projection, Rect, Vec2};
use crate::paint::Color;
use crate::scene::mesh::{MeshOut, Quad};
use crate::scene::{DiffState, DrawList};
use crate::texture::AtlasRegion;

use super::{Primitive, ShapeBase};

/// Atlas sub-rectangle tinted by a color.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteShape {
    pub base: ShapeBase,
    pub region: AtlasRegion,
}

impl SpriteShape {
    #[inline]
    pub fn new(clip: Rect, pos: Vec2, size: Vec2, region: AtlasRegion, color: Color) -> Self {
        Self { base: ShapeBase::new(clip, pos, size, color), region }
    }

    #[inline]
    pub fn is_ordered(&self) -> bool {
        !self.base.color.is_opaque() || self.region.has_alpha
    }

    pub(super) fn compare(&self, next: &SpriteShape, proj: &Projection) -> DiffState {
        if self.region.texture != next.region.texture || self.is_ordered() != next.is_ordered() {
            return DiffState::MISMATCH;
        }

        let mut diff = DiffState::empty();
        if !self.base.same_geometry(&next.base, proj) {
            // Clipping reshapes the UV quad along with the positions.
            diff |= DiffState::XYZW | DiffState::UV;
        }
        if self.region.uv != next.region.uv {
            diff |= DiffState::UV;
        }
        if !self.base.color.approx_eq(next.base.color) {
            diff |= DiffState::RGBA;
        }
        diff
    }

    pub(super) fn gen_mesh(&self, level: f32, dirty: DiffState, out: &mut MeshOut<'_>, proj: &Projection) {
        let r = self.base.rect;
        let quad = Quad::new(r.min(), r.max(), self.region.uv).clipped(self.base.clip);
        out.write_quad(0, &quad, level, self.base.color.to_rgba8(), dirty, proj);
    }
}

impl DrawList {
    /// Draws an atlas region stretched over `size`, multiplied by `color`.
    #[inline]
    pub fn sprite(&mut self, pos: Vec2, size: Vec2, region: &AtlasRegion, color: Color) {
        let shape = SpriteShape::new(self.current_clip(), pos, size, *region, color);
        self.draw(Primitive::Sprite(shape));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::texture::{TextureId, UvRect};

    fn proj() -> Projection {
        Viewport::new(400.0, 400.0).projection()
    }

    fn region(texture: u32, has_alpha: bool) -> AtlasRegion {
        AtlasRegion {
            uv: UvRect::new(0.0, 0.5, 0.5, 0.0),
            texture: TextureId::from_raw(texture),
            has_alpha,
        }
    }

    fn sprite(region: AtlasRegion, pos: Vec2) -> SpriteShape {
        SpriteShape::new(Rect::new(-1.0, -1.0, 2.0, 2.0), pos, Vec2::new(0.25, 0.25), region, Color::WHITE)
    }

    #[test]
    fn same_arguments_compare_equal() {
        let s = sprite(region(0, false), Vec2::zero());
        assert_eq!(s.compare(&s.clone(), &proj()), DiffState::empty());
    }

    #[test]
    fn alpha_texture_is_ordered_even_when_opaque() {
        assert!(sprite(region(0, true), Vec2::zero()).is_ordered());
        assert!(!sprite(region(0, false), Vec2::zero()).is_ordered());
    }

    #[test]
    fn texture_swap_is_a_mismatch() {
        let a = sprite(region(0, false), Vec2::zero());
        let b = sprite(region(1, false), Vec2::zero());
        assert_eq!(a.compare(&b, &proj()), DiffState::MISMATCH);
    }

    #[test]
    fn blended_and_opaque_sprites_never_share_a_batch() {
        let opaque = Primitive::Sprite(sprite(region(0, false), Vec2::zero()));
        let blended = Primitive::Sprite(sprite(region(0, true), Vec2::zero()));
        let other = Primitive::Sprite(sprite(region(0, false), Vec2::new(0.5, 0.0)));
        assert!(opaque.batchable(&other));
        assert!(!opaque.batchable(&blended));
        assert!(!blended.batchable(&opaque));
    }

    #[test]
    fn moving_touches_positions_and_uvs() {
        let a = sprite(region(0, false), Vec2::zero());
        let b = sprite(region(0, false), Vec2::new(0.5, 0.0));
        assert_eq!(a.compare(&b, &proj()), DiffState::XYZW | DiffState::UV);
    }

    #[test]
    fn new_sub_rectangle_touches_uvs_only() {
        let a = sprite(region(0, false), Vec2::zero());
        let mut r = region(0, false);
        r.uv = UvRect::new(0.5, 0.5, 1.0, 0.0);
        let b = sprite(r, Vec2::zero());
        assert_eq!(a.compare(&b, &proj()), DiffState::UV);
    }
}
