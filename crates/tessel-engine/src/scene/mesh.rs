//! Vertex packing shared by all primitive variants.
//!
//! Every primitive is a run of quads. Each vertex contributes:
//! - position: 4 half floats `(x, y, level, 0)` in clip space
//! - color: 4 normalized bytes
//! - texcoord: 2 half floats

use half::f16;

use crate::coords::{Projection, Rect, Vec2};
use crate::texture::UvRect;

use super::DiffState;

pub const XYZW_DIM: usize = 4;
pub const RGBA_DIM: usize = 4;
pub const UV_DIM: usize = 2;

pub const QUAD_VERTICES: usize = 4;
pub const QUAD_INDICES: usize = 6;

/// Vertex capacity of 16-bit indices.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

#[inline]
pub fn half(v: f32) -> u16 {
    f16::from_f32(v).to_bits()
}

/// Appends the index pattern for `vertices` quad vertices starting at `start`.
///
/// Per quad `i`: `[i, i+1, i+3, i+3, i+1, i+2]`.
///
/// # Panics
/// If the range exceeds the 16-bit index space.
pub fn quad_indices(start: usize, vertices: usize, out: &mut Vec<u16>) {
    assert!(
        start + vertices <= MAX_VERTICES,
        "{} vertices exceed the 16-bit index range ({MAX_VERTICES})",
        start + vertices
    );
    out.reserve(vertices / QUAD_VERTICES * QUAD_INDICES);
    for i in (start..start + vertices).step_by(QUAD_VERTICES) {
        let i = i as u16;
        out.extend_from_slice(&[i, i + 1, i + 3, i + 3, i + 1, i + 2]);
    }
}

// ── quad ──────────────────────────────────────────────────────────────────

/// One textured quad in GUI units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub min: Vec2,
    pub max: Vec2,
    pub uv: UvRect,
}

impl Quad {
    #[inline]
    pub fn new(min: Vec2, max: Vec2, uv: UvRect) -> Self {
        Self { min, max, uv }
    }

    /// Clamps the quad to `clip`, shrinking the UV quad proportionally.
    ///
    /// A quad entirely outside collapses to zero area on the clip boundary.
    pub fn clipped(self, clip: Rect) -> Quad {
        let min = clip.clamp_point(self.min);
        let max = clip.clamp_point(self.max);

        let span = self.max - self.min;
        let du = if span.x > 0.0 { (self.uv.u2 - self.uv.u1) / span.x } else { 0.0 };
        let dv = if span.y > 0.0 { (self.uv.v2 - self.uv.v1) / span.y } else { 0.0 };

        Quad {
            min,
            max,
            uv: UvRect {
                u1: self.uv.u1 + du * (min.x - self.min.x),
                v1: self.uv.v1 + dv * (min.y - self.min.y),
                u2: self.uv.u2 - du * (self.max.x - max.x),
                v2: self.uv.v2 - dv * (self.max.y - max.y),
            },
        }
    }
}

// ── output ────────────────────────────────────────────────────────────────

/// Mutable views into one primitive's share of the attribute streams.
pub struct MeshOut<'a> {
    pub xyzw: &'a mut [u16],
    pub rgba: &'a mut [u8],
    pub uv: &'a mut [u16],
}

impl MeshOut<'_> {
    /// Writes quad `q` (relative to this primitive), touching only the streams in `dirty`.
    ///
    /// Vertex order: `(x1,y1) (x2,y1) (x2,y2) (x1,y2)`.
    pub fn write_quad(
        &mut self,
        q: usize,
        quad: &Quad,
        level: f32,
        color: [u8; 4],
        dirty: DiffState,
        proj: &Projection,
    ) {
        let corners = [
            Vec2::new(quad.min.x, quad.min.y),
            Vec2::new(quad.max.x, quad.min.y),
            Vec2::new(quad.max.x, quad.max.y),
            Vec2::new(quad.min.x, quad.max.y),
        ];
        let uvs = [
            (quad.uv.u1, quad.uv.v1),
            (quad.uv.u2, quad.uv.v1),
            (quad.uv.u2, quad.uv.v2),
            (quad.uv.u1, quad.uv.v2),
        ];

        let z = half(level);
        for k in 0..QUAD_VERTICES {
            let v = q * QUAD_VERTICES + k;

            if dirty.contains(DiffState::XYZW) {
                let c = proj.to_clip(corners[k]);
                self.xyzw[v * XYZW_DIM..(v + 1) * XYZW_DIM]
                    .copy_from_slice(&[half(c.x), half(c.y), z, 0]);
            }
            if dirty.contains(DiffState::RGBA) {
                self.rgba[v * RGBA_DIM..(v + 1) * RGBA_DIM].copy_from_slice(&color);
            }
            if dirty.contains(DiffState::UV) {
                let (u, w) = uvs[k];
                self.uv[v * UV_DIM..(v + 1) * UV_DIM].copy_from_slice(&[half(u), half(w)]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unhalf(bits: u16) -> f32 {
        f16::from_bits(bits).to_f32()
    }

    // ── indices ───────────────────────────────────────────────────────────

    #[test]
    fn quad_indices_follow_pattern() {
        let mut out = Vec::new();
        quad_indices(4, 8, &mut out);
        assert_eq!(out, vec![4, 5, 7, 7, 5, 6, 8, 9, 11, 11, 9, 10]);
    }

    #[test]
    fn quad_indices_reach_the_last_representable_vertex() {
        let mut out = Vec::new();
        quad_indices(MAX_VERTICES - 4, 4, &mut out);
        assert_eq!(out[5], u16::MAX - 1);
        assert_eq!(out[2], u16::MAX);
    }

    #[test]
    #[should_panic(expected = "16-bit index range")]
    fn quad_indices_overflow_panics() {
        quad_indices(MAX_VERTICES - 4, 8, &mut Vec::new());
    }

    // ── clipping ──────────────────────────────────────────────────────────

    #[test]
    fn clipped_inside_is_identity() {
        let q = Quad::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), UvRect::new(0.0, 1.0, 1.0, 0.0));
        assert_eq!(q.clipped(Rect::new(-1.0, -1.0, 3.0, 3.0)), q);
    }

    #[test]
    fn clipped_shrinks_uvs_proportionally() {
        let q = Quad::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0), UvRect::new(0.0, 1.0, 1.0, 0.0));
        let c = q.clipped(Rect::new(1.0, 0.0, 4.0, 1.0));
        assert_eq!(c.min, Vec2::new(1.0, 0.0));
        assert_eq!(c.max, Vec2::new(2.0, 1.0));
        assert_relative_eq!(c.uv.u1, 0.5);
        assert_relative_eq!(c.uv.u2, 1.0);
        assert_relative_eq!(c.uv.v1, 1.0);
        assert_relative_eq!(c.uv.v2, 0.5);
    }

    #[test]
    fn clipped_outside_collapses_to_boundary() {
        let q = Quad::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0), UvRect::default());
        let c = q.clipped(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(c.min, c.max);
        assert_eq!(c.min, Vec2::new(1.0, 1.0));
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn write_quad_honours_dirty_mask() {
        let mut xyzw = vec![0u16; 16];
        let mut rgba = vec![7u8; 16];
        let mut uv = vec![0u16; 8];
        let proj = crate::coords::Viewport::new(200.0, 100.0).projection();
        let quad = Quad::new(Vec2::new(-1.0, -0.5), Vec2::new(1.0, 0.5), UvRect::new(0.0, 1.0, 1.0, 0.0));

        let mut out = MeshOut { xyzw: &mut xyzw, rgba: &mut rgba, uv: &mut uv };
        out.write_quad(0, &quad, 0.75, [1, 2, 3, 4], DiffState::XYZW | DiffState::UV, &proj);

        // Aspect 0.5 on x: GUI -1 lands at clip -0.5.
        assert_relative_eq!(unhalf(xyzw[0]), -0.5);
        assert_relative_eq!(unhalf(xyzw[1]), -0.5);
        assert_relative_eq!(unhalf(xyzw[2]), 0.75);
        assert_eq!(xyzw[3], 0);
        // Third vertex is the max corner.
        assert_relative_eq!(unhalf(xyzw[8]), 0.5);
        assert_relative_eq!(unhalf(xyzw[9]), 0.5);
        // Second vertex samples (u2, v1).
        assert_relative_eq!(unhalf(uv[2]), 1.0);
        assert_relative_eq!(unhalf(uv[3]), 1.0);
        // Colors untouched.
        assert!(rgba.iter().all(|&b| b == 7));
    }
}
