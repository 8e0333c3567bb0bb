use crate::coords::{Projection, Rect, Vec2, Viewport};

use super::shapes::Primitive;
use super::DiffState;

/// Retained state for the primitive produced by one call index.
#[derive(Debug, Clone)]
pub struct Slot {
    pub primitive: Primitive,
    /// Diff against the previous frame's primitive at this index.
    pub state: DiffState,
    /// Vertex count last written into the owning batch.
    pub vertices: usize,
}

/// Frame-to-frame matcher between draw calls and retained primitives.
///
/// Call `i` of a frame is compared against slot `i` of the previous frame;
/// only the diff travels on to batching. Calls issued in a different order
/// simply replace the affected slots.
///
/// # Clipping
///
/// [`clip`](Self::clip) replaces the clip rectangle outright, while
/// [`push_clip`](Self::push_clip) / [`pop_clip`](Self::pop_clip) scope it to a
/// nested region intersected with the parent.
///
/// ```ignore
/// list.begin_frame(viewport);
/// list.push_clip(panel);
/// list.rect(pos, size, color);
/// list.pop_clip();
/// ```
#[derive(Debug)]
pub struct DrawList {
    slots: Vec<Slot>,
    count: usize,
    flush: DiffState,

    projection: Projection,
    aspect: Option<Vec2>,
    invalidated: bool,

    /// Previous frame's changes were never picked up by a compositor.
    carry: bool,
    consumed: bool,

    clip: Rect,
    clip_stack: Vec<Rect>,
}

impl Default for DrawList {
    fn default() -> Self {
        let projection = Projection::default();
        Self {
            slots: Vec::new(),
            count: 0,
            flush: DiffState::empty(),
            projection,
            aspect: None,
            invalidated: false,
            carry: false,
            consumed: true,
            clip: projection.visible(),
            clip_stack: Vec::new(),
        }
    }
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Starts a frame: resets the call counter and clip, captures the projection.
    ///
    /// An aspect ratio change discards every slot; the compositor picks this up
    /// and drops its batches and mirrors.
    pub fn begin_frame(&mut self, viewport: Viewport) {
        let projection = viewport.projection();

        if let Some(prev) = self.aspect {
            if prev != projection.aspect {
                log::debug!(
                    "draw list: aspect changed ({:?} -> {:?}), discarding {} slots",
                    prev,
                    projection.aspect,
                    self.slots.len()
                );
                self.slots.clear();
                self.invalidated = true;
            }
        }
        self.aspect = Some(projection.aspect);
        self.projection = projection;

        self.carry = !self.consumed;
        if !self.carry {
            self.flush = DiffState::empty();
        }
        self.consumed = false;

        self.count = 0;
        self.clip = projection.visible();
        self.clip_stack.clear();
    }

    /// Matches `primitive` against the slot for the next call index.
    pub fn draw(&mut self, primitive: Primitive) {
        let i = self.count;

        match self.slots.get_mut(i) {
            Some(slot) => {
                let diff = slot.primitive.compare(&primitive, &self.projection);
                if !diff.is_empty() {
                    slot.primitive = primitive;
                }
                if self.carry {
                    slot.state |= diff;
                } else {
                    slot.state = diff;
                }
                self.flush |= diff;
            }
            None => {
                self.slots.push(Slot {
                    primitive,
                    state: DiffState::MISMATCH,
                    vertices: 0,
                });
                self.flush |= DiffState::FULL;
            }
        }

        self.count += 1;
    }

    /// This frame's accumulated changes, marking them as consumed.
    ///
    /// A call count below the retained slot count reports `RESIZED` so the
    /// truncation is applied even when no surviving slot changed.
    pub fn take_changes(&mut self) -> DiffState {
        let mut flush = self.flush;
        if self.count < self.slots.len() {
            flush |= DiffState::RESIZED;
        }
        self.flush = DiffState::empty();
        self.consumed = true;
        flush
    }

    /// Whether slots were discarded since the last call.
    pub(crate) fn take_invalidated(&mut self) -> bool {
        std::mem::take(&mut self.invalidated)
    }

    /// Drops slots beyond this frame's call count.
    pub(crate) fn truncate(&mut self) {
        self.slots.truncate(self.count);
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    // ── queries ───────────────────────────────────────────────────────────

    /// Draw calls issued so far this frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Every retained slot, including ones beyond this frame's call count
    /// that have not been truncated yet.
    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Bounding box of the most recent call this frame.
    ///
    /// # Panics
    /// If no call has been made since [`begin_frame`](Self::begin_frame).
    pub fn last_bounding_box(&self) -> Rect {
        assert!(self.count > 0, "last_bounding_box called before any draw call this frame");
        self.slots[self.count - 1].primitive.bounding_box()
    }

    /// Whether the most recent call's box contains `pointer`.
    #[inline]
    pub fn hovered(&self, pointer: Vec2) -> bool {
        self.last_bounding_box().contains(pointer)
    }

    // ── clipping ──────────────────────────────────────────────────────────

    #[inline]
    pub fn current_clip(&self) -> Rect {
        self.clip
    }

    /// Clips subsequent calls to the rectangle at `pos` with `size`.
    ///
    /// Negative sizes are normalized.
    #[inline]
    pub fn clip(&mut self, pos: Vec2, size: Vec2) {
        self.clip = Rect::from_origin_size(pos, size).normalized();
    }

    /// Restores the whole visible area as the clip.
    #[inline]
    pub fn reset_clip(&mut self) {
        self.clip = self.projection.visible();
    }

    /// Narrows the clip to `rect` intersected with the current clip until the
    /// matching [`pop_clip`](Self::pop_clip).
    pub fn push_clip(&mut self, rect: Rect) {
        self.clip_stack.push(self.clip);
        // Disjoint regions collapse to a zero-area clip; calls inside draw nothing.
        self.clip = self.clip.intersect(rect).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
    }

    /// Restores the clip saved by the most recent [`push_clip`](Self::push_clip).
    ///
    /// # Panics
    /// Panics (debug only) if called without a matching `push_clip`.
    pub fn pop_clip(&mut self) {
        debug_assert!(!self.clip_stack.is_empty(), "pop_clip called without matching push_clip");
        if let Some(clip) = self.clip_stack.pop() {
            self.clip = clip;
        }
    }
}
