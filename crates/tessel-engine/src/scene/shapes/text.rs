use std::sync::Arc;

use crate::coords::{Projection, Rect, Vec2};
use crate::paint::Color;
use crate::scene::mesh::{MeshOut, Quad, QUAD_VERTICES};
use crate::scene::{DiffState, DrawList};
use crate::text::Font;

use super::{Primitive, ShapeBase};

/// Single-line SDF text run.
///
/// `pos` is the bottom-left of the line box; `scale` is the line height in
/// GUI units. The extent is the measured run.
#[derive(Debug, Clone)]
pub struct TextShape {
    pub base: ShapeBase,
    pub text: String,
    pub font: Arc<Font>,
    pub scale: f32,
    quads: usize,
}

impl TextShape {
    /// # Panics
    /// If `font` lacks a glyph for any codepoint in `text`.
    pub fn new(clip: Rect, pos: Vec2, text: impl Into<String>, font: Arc<Font>, scale: f32, color: Color) -> Self {
        let text = text.into();
        let (size, _) = font.measure(&text, scale, None, None);
        let quads = font.quad_count(&text);
        Self {
            base: ShapeBase::new(clip, pos, size, color),
            text,
            font,
            scale,
            quads,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.quads * QUAD_VERTICES
    }

    pub(super) fn compare(&self, next: &TextShape, proj: &Projection) -> DiffState {
        if self.font.texture() != next.font.texture() {
            return DiffState::MISMATCH;
        }

        let mut diff = DiffState::empty();

        let moved = !self.base.rect.origin.approx_eq(next.base.rect.origin, proj.pixel)
            || !self.base.clip.approx_eq(next.base.clip, proj.pixel)
            || (self.scale - next.scale).abs() > proj.pixel.y
            || !Arc::ptr_eq(&self.font, &next.font)
            || self.text != next.text;
        if moved {
            diff |= DiffState::XYZW | DiffState::UV;
        }
        if !self.base.color.approx_eq(next.base.color) {
            diff |= DiffState::RGBA;
        }
        diff
    }

    pub(super) fn gen_mesh(&self, level: f32, dirty: DiffState, out: &mut MeshOut<'_>, proj: &Projection) {
        let Some(first) = self.text.chars().next() else { return };

        let font = &*self.font;
        let s = font.unit_scale(self.scale);
        let baseline = self.base.rect.origin + Vec2::new(0.0, -font.bottomline() * s);
        let color = self.base.color.to_rgba8();

        let mut pen = -font.glyph(first).x1;
        let mut last = None;
        let mut q = 0;

        for c in self.text.chars() {
            let g = font.glyph(c);
            pen += font.kerning(last, c);

            if !g.empty {
                let quad = Quad::new(
                    baseline + Vec2::new(pen + g.x1, g.y1) * s,
                    baseline + Vec2::new(pen + g.x2, g.y2) * s,
                    g.uv,
                )
                .clipped(self.base.clip);
                out.write_quad(q, &quad, level, color, dirty, proj);
                q += 1;
            }

            pen += g.advance;
            last = Some(c);
        }
    }
}

impl DrawList {
    /// Draws `text` with its line box starting at `pos`, `scale` units tall.
    ///
    /// # Panics
    /// If `font` lacks a glyph for any codepoint in `text`.
    pub fn text(&mut self, pos: Vec2, text: impl Into<String>, font: &Arc<Font>, scale: f32, color: Color) {
        let shape = TextShape::new(self.current_clip(), pos, text, Arc::clone(font), scale, color);
        self.draw(Primitive::Text(shape));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::scene::mesh::{RGBA_DIM, UV_DIM, XYZW_DIM};
    use crate::text::tests::unit_font;
    use crate::texture::TextureId;
    use approx::assert_relative_eq;
    use half::f16;

    fn proj() -> Projection {
        Viewport::new(400.0, 400.0).projection()
    }

    fn clip() -> Rect {
        Rect::new(-1.0, -1.0, 2.0, 2.0)
    }

    fn text(font: &Arc<Font>, s: &str, pos: Vec2) -> TextShape {
        TextShape::new(clip(), pos, s, Arc::clone(font), 0.5, Color::WHITE)
    }

    #[test]
    fn vertex_count_skips_whitespace() {
        let font = Arc::new(unit_font(TextureId::from_raw(0)));
        assert_eq!(text(&font, "a a", Vec2::zero()).vertex_count(), 8);
    }

    #[test]
    fn extent_is_the_measured_run() {
        let font = Arc::new(unit_font(TextureId::from_raw(0)));
        let t = text(&font, "aa", Vec2::new(0.1, 0.1));
        assert_relative_eq!(t.base.rect.size.x, 1.75 * 0.5);
        assert_relative_eq!(t.base.rect.size.y, 0.5);
    }

    #[test]
    fn same_arguments_compare_equal() {
        let font = Arc::new(unit_font(TextureId::from_raw(0)));
        let t = text(&font, "aa", Vec2::zero());
        assert_eq!(t.compare(&text(&font, "aa", Vec2::zero()), &proj()), DiffState::empty());
    }

    #[test]
    fn edited_string_regenerates_geometry() {
        let font = Arc::new(unit_font(TextureId::from_raw(0)));
        let t = text(&font, "aa", Vec2::zero());
        assert_eq!(
            t.compare(&text(&font, "a", Vec2::zero()), &proj()),
            DiffState::XYZW | DiffState::UV
        );
    }

    #[test]
    fn different_font_instance_regenerates_geometry() {
        let a = Arc::new(unit_font(TextureId::from_raw(0)));
        let b = Arc::new(unit_font(TextureId::from_raw(0)));
        let t = text(&a, "a", Vec2::zero());
        assert!(t.compare(&text(&b, "a", Vec2::zero()), &proj()).contains(DiffState::XYZW));
    }

    #[test]
    fn font_on_another_atlas_is_a_mismatch() {
        let a = Arc::new(unit_font(TextureId::from_raw(0)));
        let b = Arc::new(unit_font(TextureId::from_raw(1)));
        let t = text(&a, "a", Vec2::zero());
        assert_eq!(t.compare(&text(&b, "a", Vec2::zero()), &proj()), DiffState::MISMATCH);
    }

    #[test]
    fn gen_mesh_lays_out_kerned_glyphs() {
        let font = Arc::new(unit_font(TextureId::from_raw(0)));
        let t = text(&font, "aa", Vec2::zero());
        let n = t.vertex_count();
        let mut xyzw = vec![0u16; n * XYZW_DIM];
        let mut rgba = vec![0u8; n * RGBA_DIM];
        let mut uv = vec![0u16; n * UV_DIM];
        let mut out = MeshOut { xyzw: &mut xyzw, rgba: &mut rgba, uv: &mut uv };
        t.gen_mesh(0.5, DiffState::FULL, &mut out, &proj());

        let x = |v: usize| f16::from_bits(xyzw[v * XYZW_DIM]).to_f32();
        // Second glyph starts at pen 1 - 0.25 kerning, scaled by 0.5.
        assert_relative_eq!(x(0), 0.0);
        assert_relative_eq!(x(1), 0.5);
        assert_relative_eq!(x(4), 0.375);
        assert_relative_eq!(x(5), 0.875);
        assert!(rgba.iter().all(|&b| b == 255));
    }
}
