//! Greedy grouping of retained slots into draw batches.
//!
//! A batch is a strictly increasing run of slot indices that share a draw
//! program. Opaque batches sit at the front of the list and rely on the depth
//! test; order-sensitive batches follow in creation order. A slot may join an
//! older batch only if no order-sensitive batch in between overlaps it, so
//! overlapping translucent content always composites in call order.

use std::ops::Range;

use crate::coords::Projection;
use crate::scene::mesh::{MeshOut, RGBA_DIM, UV_DIM, XYZW_DIM};
use crate::scene::{DiffState, Primitive, Program, Slot};

/// Largest depth-level count that stays exact in half precision.
pub const MAX_DEPTH_LEVELS: usize = 2048;

/// Depth of call `index` in `[0, 1)`; later calls are nearer.
#[inline]
pub fn depth_level(index: usize, levels: usize) -> f32 {
    1.0 - (index + 1) as f32 / levels as f32
}

/// One draw call's worth of slots plus their concatenated vertex streams.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    members: Vec<usize>,

    pub(crate) xyzw: Vec<u16>,
    pub(crate) rgba: Vec<u8>,
    pub(crate) uv: Vec<u16>,

    /// First vertex in the shared buffers as of the last write.
    pub(crate) vertex_start: usize,
    pub(crate) index_start: usize,
    pub(crate) index_len: usize,
}

impl Batch {
    fn new(first: usize) -> Self {
        Self { members: vec![first], ..Self::default() }
    }

    /// Member slot indices, strictly increasing.
    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// The representative primitive deciding program and orderedness.
    #[inline]
    pub fn front<'s>(&self, slots: &'s [Slot]) -> &'s Primitive {
        &slots[self.members[0]].primitive
    }

    #[inline]
    pub fn program(&self, slots: &[Slot]) -> Program {
        self.front(slots).program()
    }

    #[inline]
    pub fn is_ordered(&self, slots: &[Slot]) -> bool {
        self.front(slots).is_ordered()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.xyzw.len() / XYZW_DIM
    }

    /// Range into the shared index buffer.
    #[inline]
    pub fn index_range(&self) -> Range<u32> {
        self.index_start as u32..(self.index_start + self.index_len) as u32
    }

    // ── membership ────────────────────────────────────────────────────────

    fn contains(&self, slots: &[Slot], p: &Primitive, z: usize) -> bool {
        self.front(slots).batchable(p) && self.members.binary_search(&z).is_ok()
    }

    /// Whether this batch must stay below `p`: both order-sensitive and touching.
    fn occludes(&self, slots: &[Slot], p: &Primitive) -> bool {
        p.is_ordered()
            && self.is_ordered(slots)
            && self.members.iter().any(|&i| slots[i].primitive.overlaps(p))
    }

    /// For a batch drawn before `p`'s: a later call in it overlaps `p`.
    fn covered_before(&self, slots: &[Slot], p: &Primitive, z: usize) -> bool {
        let front = self.front(slots);
        if !front.is_ordered() || front.batchable(p) {
            return false;
        }
        let from = self.members.partition_point(|&i| i < z);
        self.members[from..].iter().any(|&i| slots[i].primitive.overlaps(p))
    }

    /// For a batch drawn after `p`'s: an earlier call in it overlaps `p`.
    fn covers_after(&self, slots: &[Slot], p: &Primitive, z: usize) -> bool {
        let front = self.front(slots);
        if !front.is_ordered() || front.batchable(p) {
            return false;
        }
        let to = self.members.partition_point(|&i| i <= z);
        self.members[..to].iter().any(|&i| slots[i].primitive.overlaps(p))
    }

    fn try_add(&mut self, slots: &[Slot], p: &Primitive, z: usize) -> bool {
        if !self.front(slots).batchable(p) {
            return false;
        }
        self.members.push(z);
        true
    }

    /// Drops members at or after `k`; returns whether the batch is now empty.
    fn shrink(&mut self, k: usize) -> bool {
        let keep = self.members.partition_point(|&i| i < k);
        self.members.truncate(keep);
        self.members.is_empty()
    }

    // ── geometry ──────────────────────────────────────────────────────────

    /// Regenerates dirty members into the batch streams.
    ///
    /// Members at or after `first_invalid` are rebuilt from scratch. Returns
    /// the batch vertex count and the union of streams that changed.
    fn redraw(
        &mut self,
        slots: &mut [Slot],
        first_invalid: usize,
        levels: usize,
        proj: &Projection,
    ) -> (usize, DiffState) {
        let mut flush = DiffState::empty();
        let mut start = 0usize;

        for &z in &self.members {
            let slot = &mut slots[z];
            let mut state = if z < first_invalid { slot.state } else { DiffState::MISMATCH };

            if state.is_empty() {
                start += slot.vertices;
                continue;
            }

            let size = slot.primitive.vertex_count();

            if state.contains(DiffState::MISMATCH) {
                let to = start + size;
                self.xyzw.resize(to * XYZW_DIM, 0);
                self.rgba.resize(to * RGBA_DIM, 0);
                self.uv.resize(to * UV_DIM, 0);
                state = DiffState::FULL;
            } else {
                let old = slot.vertices;
                if size > old {
                    let at = start + old;
                    let n = size - old;
                    insert_zeros(&mut self.xyzw, at * XYZW_DIM, n * XYZW_DIM);
                    insert_zeros(&mut self.rgba, at * RGBA_DIM, n * RGBA_DIM);
                    insert_zeros(&mut self.uv, at * UV_DIM, n * UV_DIM);
                    state = DiffState::FULL;
                } else if size < old {
                    let (from, to) = (start + size, start + old);
                    self.xyzw.drain(from * XYZW_DIM..to * XYZW_DIM);
                    self.rgba.drain(from * RGBA_DIM..to * RGBA_DIM);
                    self.uv.drain(from * UV_DIM..to * UV_DIM);
                    state = DiffState::FULL;
                }
            }

            flush |= state;

            let end = start + size;
            let mut out = MeshOut {
                xyzw: &mut self.xyzw[start * XYZW_DIM..end * XYZW_DIM],
                rgba: &mut self.rgba[start * RGBA_DIM..end * RGBA_DIM],
                uv: &mut self.uv[start * UV_DIM..end * UV_DIM],
            };
            slot.primitive.gen_mesh(depth_level(z, levels), state, &mut out, proj);
            slot.vertices = size;

            start = end;
        }

        if self.xyzw.len() != start * XYZW_DIM {
            self.xyzw.resize(start * XYZW_DIM, 0);
            self.rgba.resize(start * RGBA_DIM, 0);
            self.uv.resize(start * UV_DIM, 0);
            flush = DiffState::FULL;
        }

        (start, flush)
    }
}

fn insert_zeros<T: Copy + Default>(v: &mut Vec<T>, at: usize, n: usize) {
    v.splice(at..at, std::iter::repeat_n(T::default(), n));
}

// ── batcher ───────────────────────────────────────────────────────────────

/// Ordered batch list maintained across frames.
#[derive(Debug, Default)]
pub struct Batcher {
    batches: Vec<Batch>,
}

impl Batcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    #[inline]
    pub(crate) fn batches_mut(&mut self) -> &mut [Batch] {
        &mut self.batches
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// First slot whose change invalidates the existing batch structure.
    ///
    /// Returns `count` when every changed slot can be patched in place.
    ///
    /// # Panics
    /// If a retained, unmismatched slot belongs to no batch.
    pub fn first_invalid(&self, slots: &[Slot], count: usize) -> usize {
        for (z, slot) in slots[..count].iter().enumerate() {
            let state = slot.state;
            if state.contains(DiffState::MISMATCH) {
                return z;
            }
            if state.contains(DiffState::XYZW)
                && slot.primitive.is_ordered()
                && self.overlap_breaks_order(slots, z)
            {
                return z;
            }
        }
        count
    }

    fn overlap_breaks_order(&self, slots: &[Slot], z: usize) -> bool {
        let p = &slots[z].primitive;
        let Some(pos) = self.batches.iter().position(|b| b.contains(slots, p, z)) else {
            panic!("slot {z} is not a member of any batch");
        };

        self.batches[..pos].iter().any(|b| b.covered_before(slots, p, z))
            || self.batches[pos + 1..].iter().any(|b| b.covers_after(slots, p, z))
    }

    /// Drops memberships at or after `k` and any batch left empty.
    pub fn truncate(&mut self, k: usize) {
        self.batches.retain_mut(|b| !b.shrink(k));
    }

    /// Places every slot from `from` onwards.
    ///
    /// The search walks batches newest first, so the most recently drawn
    /// compatible batch wins; it stops at the first batch that must stay
    /// underneath the slot.
    pub fn assign(&mut self, slots: &[Slot], from: usize) {
        for z in from..slots.len() {
            let p = &slots[z].primitive;

            let mut placed = false;
            for b in self.batches.iter_mut().rev() {
                if b.try_add(slots, p, z) {
                    placed = true;
                    break;
                }
                if b.occludes(slots, p) {
                    break;
                }
            }

            if !placed {
                if p.is_ordered() {
                    self.batches.push(Batch::new(z));
                } else {
                    self.batches.insert(0, Batch::new(z));
                }
            }
        }
    }

    /// Redraws batch `i`; see [`Batch`] stream layout.
    pub(crate) fn redraw(
        &mut self,
        i: usize,
        slots: &mut [Slot],
        first_invalid: usize,
        levels: usize,
        proj: &Projection,
    ) -> (usize, DiffState) {
        self.batches[i].redraw(slots, first_invalid, levels, proj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2, Viewport};
    use crate::paint::Color;
    use crate::scene::{RectShape, SpriteShape};
    use crate::texture::{AtlasRegion, TextureId, UvRect};

    fn proj() -> Projection {
        Viewport::new(400.0, 400.0).projection()
    }

    fn clip() -> Rect {
        Rect::new(-1.0, -1.0, 2.0, 2.0)
    }

    fn translucent() -> Color {
        Color::from_straight(1.0, 1.0, 1.0, 0.5)
    }

    fn rect(x: f32, color: Color) -> Primitive {
        Primitive::Rect(RectShape::new(clip(), Vec2::new(x, 0.0), Vec2::new(0.25, 0.25), color))
    }

    fn sprite(x: f32, texture: u32) -> Primitive {
        let region = AtlasRegion {
            uv: UvRect::new(0.0, 1.0, 1.0, 0.0),
            texture: TextureId::from_raw(texture),
            has_alpha: false,
        };
        Primitive::Sprite(SpriteShape::new(clip(), Vec2::new(x, 0.0), Vec2::new(0.25, 0.25), region, translucent()))
    }

    fn slots(prims: Vec<Primitive>) -> Vec<Slot> {
        prims
            .into_iter()
            .map(|primitive| Slot { primitive, state: DiffState::MISMATCH, vertices: 0 })
            .collect()
    }

    fn members(b: &Batcher) -> Vec<Vec<usize>> {
        b.batches().iter().map(|b| b.members().to_vec()).collect()
    }

    fn settle(slots: &mut [Slot]) {
        for s in slots {
            s.state = DiffState::empty();
        }
    }

    // ── assignment ────────────────────────────────────────────────────────

    #[test]
    fn compatible_rects_share_one_batch() {
        let s = slots(vec![rect(0.0, Color::WHITE), rect(0.1, Color::WHITE), rect(0.2, Color::WHITE)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        assert_eq!(members(&b), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn opaque_batches_go_to_the_front() {
        let s = slots(vec![rect(0.0, translucent()), rect(0.1, Color::WHITE), rect(0.2, Color::WHITE)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        assert_eq!(members(&b), vec![vec![1, 2], vec![0]]);
    }

    #[test]
    fn opaque_slot_skips_past_ordered_batches() {
        let s = slots(vec![rect(0.0, Color::WHITE), rect(0.0, translucent()), rect(0.0, Color::WHITE)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        assert_eq!(members(&b), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn overlapping_translucent_sprites_keep_call_order() {
        let s = slots(vec![sprite(0.0, 0), sprite(0.1, 1), sprite(0.2, 0)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        assert_eq!(members(&b), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn disjoint_translucent_sprites_merge_across_textures() {
        let s = slots(vec![sprite(0.0, 0), sprite(0.5, 1), sprite(0.1, 0)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        assert_eq!(members(&b), vec![vec![0, 2], vec![1]]);
    }

    // ── invalidation ──────────────────────────────────────────────────────

    #[test]
    fn truncate_drops_members_and_empty_batches() {
        let s = slots(vec![sprite(0.0, 0), sprite(0.5, 1), sprite(0.1, 0)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);

        b.truncate(2);
        assert_eq!(members(&b), vec![vec![0], vec![1]]);
        b.truncate(1);
        assert_eq!(members(&b), vec![vec![0]]);
        b.truncate(0);
        assert!(b.is_empty());
    }

    #[test]
    fn first_invalid_reports_mismatch() {
        let mut s = slots(vec![rect(0.0, Color::WHITE), rect(0.5, Color::WHITE)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        settle(&mut s);
        assert_eq!(b.first_invalid(&s, 2), 2);

        s[1].state = DiffState::MISMATCH;
        assert_eq!(b.first_invalid(&s, 2), 1);
    }

    #[test]
    fn moving_under_a_later_call_invalidates() {
        // Batches: [A, C] then [B]; B moves onto C, which is drawn first.
        let mut s = slots(vec![sprite(-0.8, 0), sprite(0.0, 1), sprite(0.6, 0)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        assert_eq!(members(&b), vec![vec![0, 2], vec![1]]);
        settle(&mut s);

        s[1].primitive = sprite(0.55, 1);
        s[1].state = DiffState::XYZW | DiffState::UV;
        assert_eq!(b.first_invalid(&s, 3), 1);
    }

    #[test]
    fn moving_over_an_earlier_call_invalidates() {
        let mut s = slots(vec![sprite(-0.8, 0), sprite(0.0, 1), sprite(0.6, 0)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        settle(&mut s);

        s[2].primitive = sprite(0.05, 0);
        s[2].state = DiffState::XYZW | DiffState::UV;
        assert_eq!(b.first_invalid(&s, 3), 2);
    }

    #[test]
    fn harmless_move_keeps_structure() {
        let mut s = slots(vec![sprite(-0.8, 0), sprite(0.0, 1), sprite(0.6, 0)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        settle(&mut s);

        // A drawn before B already; overlapping it changes nothing.
        s[0].primitive = sprite(0.05, 0);
        s[0].state = DiffState::XYZW | DiffState::UV;
        assert_eq!(b.first_invalid(&s, 3), 3);
    }

    #[test]
    #[should_panic(expected = "not a member of any batch")]
    fn unbatched_slot_panics() {
        let mut s = slots(vec![sprite(0.0, 0)]);
        settle(&mut s);
        s[0].state = DiffState::XYZW;
        Batcher::new().first_invalid(&s, 1);
    }

    // ── redraw ────────────────────────────────────────────────────────────

    #[test]
    fn redraw_builds_then_reuses_streams() {
        let mut s = slots(vec![rect(0.0, Color::WHITE), rect(0.5, Color::WHITE)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);

        let (n, flush) = b.redraw(0, &mut s, 0, 1000, &proj());
        assert_eq!(n, 8);
        assert_eq!(flush, DiffState::FULL);
        assert_eq!(b.batches()[0].vertex_count(), 8);
        assert_eq!(s[1].vertices, 4);

        settle(&mut s);
        let (n, flush) = b.redraw(0, &mut s, 2, 1000, &proj());
        assert_eq!(n, 8);
        assert_eq!(flush, DiffState::empty());
    }

    #[test]
    fn redraw_patches_only_dirty_streams() {
        let mut s = slots(vec![rect(0.0, Color::WHITE), rect(0.5, Color::WHITE)]);
        let mut b = Batcher::new();
        b.assign(&s, 0);
        b.redraw(0, &mut s, 0, 1000, &proj());
        settle(&mut s);

        s[1].primitive = rect(0.5, Color::BLACK);
        s[1].state = DiffState::RGBA;
        let (_, flush) = b.redraw(0, &mut s, 2, 1000, &proj());
        assert_eq!(flush, DiffState::RGBA);

        let rgba = &b.batches()[0].rgba;
        assert!(rgba[..16].iter().all(|&c| c == 255));
        assert_eq!(&rgba[16..20], &[0, 0, 0, 255]);
    }

    #[test]
    fn depth_levels_move_nearer_with_call_index() {
        assert!(depth_level(0, 1000) > depth_level(1, 1000));
        assert!(depth_level(999, 1000) >= 0.0);
        assert!(depth_level(0, 1000) < 1.0);
    }
}
