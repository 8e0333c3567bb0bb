//! Frame driver tying the draw list to batches and buffer mirrors.

use std::ops::Range;

use crate::scene::{DiffState, DrawList, Program};

use super::batch::{Batcher, MAX_DEPTH_LEVELS};
use super::buffers::{BufferBackend, BufferSet};

/// One indexed draw for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDraw {
    pub program: Program,
    /// Drawn with premultiplied-alpha blending after every opaque batch.
    pub ordered: bool,
    pub indices: Range<u32>,
}

/// CPU half of the renderer: batching plus mirror maintenance.
///
/// GPU-free; [`UiRenderer`](super::UiRenderer) wraps it with pipelines and
/// buffers. Tests drive it with a recording backend.
#[derive(Debug)]
pub struct Compositor {
    batcher: Batcher,
    buffers: BufferSet,
    draws: Vec<BatchDraw>,
    depth_levels: usize,
    /// Mirrors changed since the last flush.
    pending: DiffState,
}

impl Compositor {
    /// # Panics
    /// If `depth_levels` is zero or above [`MAX_DEPTH_LEVELS`].
    pub fn new(depth_levels: usize) -> Self {
        assert!(
            (1..=MAX_DEPTH_LEVELS).contains(&depth_levels),
            "depth levels must be within 1..={MAX_DEPTH_LEVELS}, got {depth_levels}"
        );
        Self {
            batcher: Batcher::new(),
            buffers: BufferSet::new(),
            draws: Vec::new(),
            depth_levels,
            pending: DiffState::empty(),
        }
    }

    #[inline]
    pub fn batcher(&self) -> &Batcher {
        &self.batcher
    }

    #[inline]
    pub fn buffers(&self) -> &BufferSet {
        &self.buffers
    }

    /// Draws in submission order: opaque batches first, then ordered ones.
    #[inline]
    pub fn draws(&self) -> &[BatchDraw] {
        &self.draws
    }

    /// Mirrors awaiting upload.
    #[inline]
    pub fn pending(&self) -> DiffState {
        self.pending
    }

    /// Applies this frame's draw list changes to batches and mirrors.
    ///
    /// Returns the mirrors that changed this frame (also accumulated until
    /// [`flush`](Self::flush)).
    ///
    /// # Panics
    /// If the frame has more calls than depth levels, or more vertices than
    /// 16-bit indices can address.
    pub fn prepare(&mut self, list: &mut DrawList) -> DiffState {
        if list.take_invalidated() {
            log::debug!("compositor: draw list invalidated, dropping {} batches", self.batcher.batches().len());
            self.batcher.clear();
            self.buffers.clear();
            self.draws.clear();
        }

        let changes = list.take_changes();
        if changes.is_empty() {
            return DiffState::empty();
        }

        let count = list.len();
        assert!(
            count <= self.depth_levels,
            "{count} draw calls exceed the {} available depth levels",
            self.depth_levels
        );

        let proj = list.projection();
        let k = self.batcher.first_invalid(list.slots(), count);
        self.batcher.truncate(k);
        list.truncate();

        let slots = list.slots_mut();
        self.batcher.assign(slots, k);

        let mut flush = DiffState::empty();
        let mut vertex_start = 0usize;
        let mut index_start = 0usize;

        for i in 0..self.batcher.batches().len() {
            let (size, dirty) = self.batcher.redraw(i, slots, k, self.depth_levels, &proj);
            flush |= dirty;

            let ordered = self.batcher.batches()[i].is_ordered(slots);
            let batch = &mut self.batcher.batches_mut()[i];
            // A dropped batch ahead of this one shifts it down the mirrors.
            if batch.vertex_start != vertex_start || batch.index_start != index_start {
                flush |= DiffState::FULL;
            }
            if !flush.is_empty() {
                self.buffers.write_batch(flush, batch, ordered, vertex_start, index_start);
            }

            vertex_start += size;
            index_start += batch.index_len;
        }

        if self.buffers.truncate(vertex_start, index_start) {
            flush |= DiffState::FULL;
        }

        self.draws.clear();
        self.draws.extend(self.batcher.batches().iter().map(|b| BatchDraw {
            program: b.program(slots),
            ordered: b.is_ordered(slots),
            indices: b.index_range(),
        }));

        flush.remove(DiffState::MISMATCH);
        self.pending |= flush;
        flush
    }

    /// Uploads pending mirrors; returns the number of uploads issued.
    pub fn flush(&mut self, backend: &mut impl BufferBackend) -> usize {
        let uploads = self.buffers.flush(self.pending, backend);
        self.pending = DiffState::empty();
        uploads
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(super::RendererConfig::default().depth_levels)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::coords::{Vec2, Viewport};
    use crate::paint::Color;
    use crate::render::buffers::tests::RecordingBackend;
    use crate::render::buffers::BufferKind;
    use crate::scene::mesh::XYZW_DIM;
    use crate::text::tests::unit_font;
    use crate::texture::{AtlasRegion, TextureId, UvRect};
    use half::f16;

    fn square() -> Viewport {
        Viewport::new(400.0, 400.0)
    }

    fn translucent() -> Color {
        Color::from_straight(1.0, 1.0, 1.0, 0.5)
    }

    fn region(texture: u32) -> AtlasRegion {
        AtlasRegion {
            uv: UvRect::new(0.0, 1.0, 1.0, 0.0),
            texture: TextureId::from_raw(texture),
            has_alpha: false,
        }
    }

    struct Harness {
        list: DrawList,
        comp: Compositor,
        backend: RecordingBackend,
    }

    impl Harness {
        fn new() -> Self {
            Self { list: DrawList::new(), comp: Compositor::default(), backend: RecordingBackend::default() }
        }

        /// Runs one frame and returns the number of uploads.
        fn frame(&mut self, draw: impl FnOnce(&mut DrawList)) -> usize {
            self.list.begin_frame(square());
            draw(&mut self.list);
            self.comp.prepare(&mut self.list);
            self.backend.reset();
            self.comp.flush(&mut self.backend)
        }

        fn batches(&self) -> Vec<Vec<usize>> {
            self.comp.batcher().batches().iter().map(|b| b.members().to_vec()).collect()
        }

        /// Mirrors hold exactly the batch streams and every draw stays in range.
        fn assert_consistent(&self) {
            let slots = self.list.slots();
            let mut expected = Vec::new();
            for b in self.comp.batcher().batches() {
                if b.is_ordered(slots) {
                    expected.extend_from_slice(&b.xyzw);
                } else {
                    for v in b.xyzw.chunks_exact(XYZW_DIM).rev() {
                        expected.extend_from_slice(v);
                    }
                }
            }
            assert_eq!(self.comp.buffers().positions(), &expected[..]);

            let index_count = self.comp.buffers().index_count() as u32;
            for d in self.comp.draws() {
                assert!(d.indices.end <= index_count, "draw {:?} beyond {index_count} indices", d.indices);
            }
            let uploaded = self.backend.last.get(&BufferKind::Position).map(Vec::as_slice);
            assert_eq!(uploaded, Some(self.comp.buffers().bytes(BufferKind::Position)));
        }
    }

    fn sprites(list: &mut DrawList, with_b: bool, b_overlaps: bool) {
        list.sprite(Vec2::new(0.0, 0.0), Vec2::new(0.25, 0.25), &region(0), translucent());
        if with_b {
            let x = if b_overlaps { 0.1 } else { -0.8 };
            list.sprite(Vec2::new(x, 0.0), Vec2::new(0.25, 0.25), &region(1), translucent());
        }
        list.sprite(Vec2::new(0.2, 0.0), Vec2::new(0.25, 0.25), &region(0), translucent());
    }

    // ── retained frames ───────────────────────────────────────────────────

    #[test]
    fn static_rect_uploads_only_on_first_frame() {
        let mut h = Harness::new();
        let draw = |l: &mut DrawList| l.rect(Vec2::zero(), Vec2::new(1.0, 1.0), Color::WHITE);

        assert_eq!(h.frame(draw), 4);
        assert_eq!(h.frame(draw), 0);
        assert_eq!(h.frame(draw), 0);
        assert_eq!(h.comp.draws().len(), 1);
        assert_eq!(h.comp.draws()[0].indices, 0..6);
    }

    #[test]
    fn identical_sequence_costs_nothing() {
        let mut h = Harness::new();
        h.frame(|l| sprites(l, true, true));
        assert_eq!(h.frame(|l| sprites(l, true, true)), 0);
        assert!(h.list.slots().iter().all(|s| s.state.is_empty()));
    }

    #[test]
    fn recolor_uploads_colors_only() {
        let mut h = Harness::new();
        h.frame(|l| {
            l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE);
            l.rect(Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.5), Color::WHITE);
        });
        let uploads = h.frame(|l| {
            l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE);
            l.rect(Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.5), Color::BLACK);
        });
        assert_eq!(uploads, 1);
        assert_eq!(h.backend.count_of(BufferKind::Color), 1);
    }

    #[test]
    fn skipped_flush_is_delivered_later() {
        let mut h = Harness::new();
        h.list.begin_frame(square());
        h.list.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE);
        h.comp.prepare(&mut h.list);

        assert_eq!(h.frame(|l| l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE)), 4);
    }

    // ── truncation ────────────────────────────────────────────────────────

    #[test]
    fn truncation_drops_slots_and_emptied_batches() {
        let mut h = Harness::new();
        h.frame(|l| {
            l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE);
            l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), translucent());
            l.rect(Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.5), Color::WHITE);
        });
        assert_eq!(h.batches(), vec![vec![0, 2], vec![1]]);

        h.frame(|l| l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE));
        assert_eq!(h.list.slots().len(), 1);
        assert_eq!(h.batches(), vec![vec![0]]);
        assert_eq!(h.comp.buffers().vertex_count(), 4);
        assert_eq!(h.comp.draws().len(), 1);
    }

    #[test]
    fn dropping_front_opaque_batch_shifts_the_rest() {
        let mut h = Harness::new();
        let rect = |l: &mut DrawList| l.rect(Vec2::new(-0.5, 0.0), Vec2::new(0.25, 0.25), Color::WHITE);
        h.frame(|l| {
            rect(l);
            l.sprite(Vec2::new(0.5, 0.0), Vec2::new(0.25, 0.25), &region(0), Color::WHITE);
        });
        assert_eq!(h.batches(), vec![vec![1], vec![0]]);
        h.assert_consistent();

        let uploads = h.frame(rect);
        assert_eq!(h.batches(), vec![vec![0]]);
        assert_eq!(uploads, 4);
        assert_eq!(h.comp.draws()[0].indices, 0..6);
        h.assert_consistent();
    }

    #[test]
    fn dropping_opaque_batch_shifts_untouched_ordered_batch() {
        let mut h = Harness::new();
        let glass = |l: &mut DrawList| l.rect(Vec2::zero(), Vec2::new(0.25, 0.25), translucent());
        h.frame(|l| {
            glass(l);
            l.rect(Vec2::new(0.5, 0.0), Vec2::new(0.25, 0.25), Color::WHITE);
        });
        assert_eq!(h.batches(), vec![vec![1], vec![0]]);

        h.frame(glass);
        assert_eq!(h.batches(), vec![vec![0]]);
        assert!(h.comp.draws()[0].ordered);
        assert_eq!(h.comp.draws()[0].indices, 0..6);
        h.assert_consistent();
    }

    #[test]
    fn replaced_call_moves_to_front_and_shifts_the_rest() {
        let mut h = Harness::new();
        h.frame(|l| sprites(l, true, true));
        h.frame(|l| {
            l.sprite(Vec2::new(0.0, 0.0), Vec2::new(0.25, 0.25), &region(0), translucent());
            l.rect(Vec2::new(-0.8, 0.5), Vec2::new(0.1, 0.1), Color::WHITE);
        });
        h.assert_consistent();
        assert_eq!(h.comp.buffers().vertex_count(), 8);
    }

    #[test]
    fn empty_frame_clears_everything() {
        let mut h = Harness::new();
        h.frame(|l| l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE));
        h.frame(|_| {});
        assert!(h.comp.batcher().is_empty());
        assert!(h.comp.draws().is_empty());
        assert_eq!(h.comp.buffers().vertex_count(), 0);
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn overlapping_sprites_split_then_merge() {
        let mut h = Harness::new();
        h.frame(|l| sprites(l, true, true));
        assert_eq!(h.batches(), vec![vec![0], vec![1], vec![2]]);

        h.frame(|l| sprites(l, false, true));
        assert_eq!(h.batches(), vec![vec![0, 1]]);
    }

    #[test]
    fn disjoint_sprite_lets_neighbors_share() {
        let mut h = Harness::new();
        h.frame(|l| sprites(l, true, false));
        assert_eq!(h.batches(), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn later_overlapping_call_is_nearer_and_drawn_after() {
        let mut h = Harness::new();
        h.frame(|l| sprites(l, true, true));

        let draws = h.comp.draws();
        assert!(draws.iter().all(|d| d.ordered));
        assert!(draws[0].indices.end <= draws[1].indices.start);

        // First vertex of each batch carries its slot's level.
        let pos = h.comp.buffers().positions();
        let level = |v: usize| f16::from_bits(pos[v * XYZW_DIM + 2]).to_f32();
        assert!(level(4) < level(0));
        assert!(level(8) < level(4));
    }

    #[test]
    fn aspect_change_rebuilds_from_scratch() {
        let mut h = Harness::new();
        h.frame(|l| l.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE));

        h.list.begin_frame(Viewport::new(800.0, 400.0));
        h.list.rect(Vec2::zero(), Vec2::new(0.5, 0.5), Color::WHITE);
        h.comp.prepare(&mut h.list);
        h.backend.reset();
        assert_eq!(h.comp.flush(&mut h.backend), 4);
        assert_eq!(h.comp.buffers().vertex_count(), 4);
    }

    // ── text ──────────────────────────────────────────────────────────────

    #[test]
    fn longer_text_resizes_its_batch() {
        let font = Arc::new(unit_font(TextureId::from_raw(0)));
        let mut h = Harness::new();
        h.frame(|l| l.text(Vec2::zero(), "a", &font, 0.25, Color::WHITE));
        assert_eq!(h.comp.buffers().vertex_count(), 4);

        let uploads = h.frame(|l| l.text(Vec2::zero(), "aaa", &font, 0.25, Color::WHITE));
        assert_eq!(uploads, 4);
        assert_eq!(h.comp.buffers().vertex_count(), 12);
        assert_eq!(h.comp.draws()[0].indices, 0..18);
    }

    #[test]
    #[should_panic(expected = "depth levels")]
    fn too_many_calls_panics() {
        let mut list = DrawList::new();
        let mut comp = Compositor::new(2);
        list.begin_frame(square());
        for _ in 0..3 {
            list.rect(Vec2::zero(), Vec2::new(0.1, 0.1), Color::WHITE);
        }
        comp.prepare(&mut list);
    }
}
