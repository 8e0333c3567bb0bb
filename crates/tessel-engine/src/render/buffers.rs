//! CPU mirrors of the shared GPU buffers and their upload policy.
//!
//! All batches share one index buffer and three attribute buffers. Batches
//! are laid out back to back in batch-list order; a batch that changes causes
//! every later batch to be re-appended to the affected mirrors.

use crate::scene::mesh::{quad_indices, MAX_VERTICES, RGBA_DIM, UV_DIM, XYZW_DIM};
use crate::scene::DiffState;

use super::batch::Batch;

/// One of the four shared GPU buffers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    /// `u16` quad indices.
    Index,
    /// Half-float `(x, y, level, 0)` per vertex.
    Position,
    /// Normalized `u8` RGBA per vertex.
    Color,
    /// Half-float `(u, v)` per vertex.
    TexCoord,
}

impl BufferKind {
    pub const ALL: [BufferKind; 4] = [
        BufferKind::Index,
        BufferKind::Position,
        BufferKind::Color,
        BufferKind::TexCoord,
    ];

    /// The diff flag that dirties this buffer.
    pub fn dirty_flag(self) -> DiffState {
        match self {
            BufferKind::Index => DiffState::RESIZED,
            BufferKind::Position => DiffState::XYZW,
            BufferKind::Color => DiffState::RGBA,
            BufferKind::TexCoord => DiffState::UV,
        }
    }
}

/// Destination of mirror uploads.
///
/// Each call replaces the whole buffer contents.
pub trait BufferBackend {
    fn upload(&mut self, kind: BufferKind, bytes: &[u8]);
}

/// Flat CPU copies of the shared buffers.
#[derive(Debug, Default)]
pub struct BufferSet {
    pub(crate) index: Vec<u16>,
    pub(crate) xyzw: Vec<u16>,
    pub(crate) rgba: Vec<u8>,
    pub(crate) uv: Vec<u16>,
}

impl BufferSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.xyzw.len() / XYZW_DIM
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.index.len()
    }

    pub fn indices(&self) -> &[u16] {
        &self.index
    }

    pub fn positions(&self) -> &[u16] {
        &self.xyzw
    }

    pub fn colors(&self) -> &[u8] {
        &self.rgba
    }

    pub fn texcoords(&self) -> &[u16] {
        &self.uv
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.xyzw.clear();
        self.rgba.clear();
        self.uv.clear();
    }

    /// Mirror contents as bytes.
    pub fn bytes(&self, kind: BufferKind) -> &[u8] {
        match kind {
            BufferKind::Index => bytemuck::cast_slice(&self.index),
            BufferKind::Position => bytemuck::cast_slice(&self.xyzw),
            BufferKind::Color => &self.rgba,
            BufferKind::TexCoord => bytemuck::cast_slice(&self.uv),
        }
    }

    /// Re-appends `batch` at its offsets for every stream in `dirty`.
    ///
    /// `vertex_start` is the batch's first vertex in the shared buffers,
    /// `index_start` its first index. With `RESIZED` the batch's index range
    /// is regenerated and recorded on the batch. Opaque batches store their
    /// vertices in reverse so the nearest content rasterizes first.
    pub(crate) fn write_batch(
        &mut self,
        dirty: DiffState,
        batch: &mut Batch,
        ordered: bool,
        vertex_start: usize,
        index_start: usize,
    ) {
        let vertices = batch.vertex_count();
        assert!(
            vertex_start + vertices <= MAX_VERTICES,
            "{} vertices exceed the 16-bit index range ({MAX_VERTICES})",
            vertex_start + vertices
        );

        batch.vertex_start = vertex_start;
        if dirty.contains(DiffState::RESIZED) {
            self.index.truncate(index_start);
            quad_indices(vertex_start, vertices, &mut self.index);
            batch.index_start = index_start;
            batch.index_len = self.index.len() - index_start;
        }
        if dirty.contains(DiffState::XYZW) {
            append(&mut self.xyzw, vertex_start, XYZW_DIM, &batch.xyzw, ordered);
        }
        if dirty.contains(DiffState::RGBA) {
            append(&mut self.rgba, vertex_start, RGBA_DIM, &batch.rgba, ordered);
        }
        if dirty.contains(DiffState::UV) {
            append(&mut self.uv, vertex_start, UV_DIM, &batch.uv, ordered);
        }
    }

    /// Cuts mirrors longer than the live batches; returns whether anything was cut.
    pub(crate) fn truncate(&mut self, vertices: usize, indices: usize) -> bool {
        let longer = self.index.len() > indices || self.xyzw.len() > vertices * XYZW_DIM;
        self.index.truncate(indices);
        self.xyzw.truncate(vertices * XYZW_DIM);
        self.rgba.truncate(vertices * RGBA_DIM);
        self.uv.truncate(vertices * UV_DIM);
        longer
    }

    /// Uploads every mirror selected by `dirty`; returns the number of uploads.
    pub fn flush(&self, dirty: DiffState, backend: &mut impl BufferBackend) -> usize {
        let mut uploads = 0;
        for kind in BufferKind::ALL {
            if dirty.contains(kind.dirty_flag()) {
                backend.upload(kind, self.bytes(kind));
                uploads += 1;
            }
        }
        uploads
    }
}

fn append<T: Copy>(to: &mut Vec<T>, at_vertex: usize, dim: usize, from: &[T], ordered: bool) {
    to.truncate(at_vertex * dim);
    if ordered {
        to.extend_from_slice(from);
    } else {
        to.reserve(from.len());
        for v in from.chunks_exact(dim).rev() {
            to.extend_from_slice(v);
        }
    }
}

// ── wgpu backend ──────────────────────────────────────────────────────────

/// GPU copies of the shared buffers.
///
/// An upload larger than the current allocation replaces the buffer and
/// drops the old one; smaller uploads rewrite the whole range in place.
#[derive(Default)]
pub struct WgpuBuffers {
    index: Option<GpuBuffer>,
    xyzw: Option<GpuBuffer>,
    rgba: Option<GpuBuffer>,
    uv: Option<GpuBuffer>,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    len: u64,
}

impl WgpuBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: BufferKind) -> Option<&wgpu::Buffer> {
        self.slot(kind).as_ref().filter(|b| b.len > 0).map(|b| &b.buffer)
    }

    fn slot(&self, kind: BufferKind) -> &Option<GpuBuffer> {
        match kind {
            BufferKind::Index => &self.index,
            BufferKind::Position => &self.xyzw,
            BufferKind::Color => &self.rgba,
            BufferKind::TexCoord => &self.uv,
        }
    }

    fn slot_mut(&mut self, kind: BufferKind) -> &mut Option<GpuBuffer> {
        match kind {
            BufferKind::Index => &mut self.index,
            BufferKind::Position => &mut self.xyzw,
            BufferKind::Color => &mut self.rgba,
            BufferKind::TexCoord => &mut self.uv,
        }
    }

    /// Binds this uploader to a device for one flush.
    pub fn uploader<'a>(&'a mut self, device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> WgpuUploader<'a> {
        WgpuUploader { buffers: self, device, queue }
    }
}

/// [`BufferBackend`] writing through a wgpu queue.
pub struct WgpuUploader<'a> {
    buffers: &'a mut WgpuBuffers,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl BufferBackend for WgpuUploader<'_> {
    fn upload(&mut self, kind: BufferKind, bytes: &[u8]) {
        let len = bytes.len() as u64;
        let slot = self.buffers.slot_mut(kind);

        let needs_new = slot.as_ref().is_none_or(|b| b.capacity < len);
        if needs_new {
            let capacity = len.max(256).next_power_of_two();
            let usage = match kind {
                BufferKind::Index => wgpu::BufferUsages::INDEX,
                _ => wgpu::BufferUsages::VERTEX,
            } | wgpu::BufferUsages::COPY_DST;

            log::debug!("ui buffers: allocating {kind:?} buffer ({capacity} bytes)");
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessel ui buffer"),
                size: capacity,
                usage,
                mapped_at_creation: false,
            });
            *slot = Some(GpuBuffer { buffer, capacity, len: 0 });
        }

        if let Some(b) = slot.as_mut() {
            if len > 0 {
                self.queue.write_buffer(&b.buffer, 0, bytes);
            }
            b.len = len;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Counts uploads per buffer without a GPU.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingBackend {
        pub uploads: Vec<(BufferKind, usize)>,
        pub last: HashMap<BufferKind, Vec<u8>>,
    }

    impl RecordingBackend {
        pub fn count(&self) -> usize {
            self.uploads.len()
        }

        pub fn count_of(&self, kind: BufferKind) -> usize {
            self.uploads.iter().filter(|(k, _)| *k == kind).count()
        }

        pub fn reset(&mut self) {
            self.uploads.clear();
        }
    }

    impl BufferBackend for RecordingBackend {
        fn upload(&mut self, kind: BufferKind, bytes: &[u8]) {
            self.uploads.push((kind, bytes.len()));
            self.last.insert(kind, bytes.to_vec());
        }
    }

    fn batch(vertices: usize, fill: u16) -> Batch {
        let mut b = Batch::default();
        b.xyzw = (0..vertices * XYZW_DIM).map(|i| fill + (i / XYZW_DIM) as u16).collect();
        b.rgba = vec![fill as u8; vertices * RGBA_DIM];
        b.uv = vec![fill; vertices * UV_DIM];
        b
    }

    // ── assembly ──────────────────────────────────────────────────────────

    #[test]
    fn ordered_batch_appends_verbatim() {
        let mut set = BufferSet::new();
        let mut b = batch(4, 10);
        set.write_batch(DiffState::FULL, &mut b, true, 0, 0);

        assert_eq!(set.vertex_count(), 4);
        assert_eq!(set.indices(), &[0, 1, 3, 3, 1, 2]);
        assert_eq!(b.index_range(), 0..6);
        assert_eq!(set.positions()[0], 10);
        assert_eq!(set.positions()[12], 13);
    }

    #[test]
    fn opaque_batch_reverses_vertex_order() {
        let mut set = BufferSet::new();
        let mut b = batch(4, 10);
        set.write_batch(DiffState::FULL, &mut b, false, 0, 0);

        assert_eq!(&set.positions()[..4], &[13, 13, 13, 13]);
        assert_eq!(&set.positions()[12..], &[10, 10, 10, 10]);
    }

    #[test]
    fn later_batch_lands_after_earlier_one() {
        let mut set = BufferSet::new();
        let mut a = batch(4, 0);
        let mut b = batch(8, 100);
        set.write_batch(DiffState::FULL, &mut a, true, 0, 0);
        set.write_batch(DiffState::FULL, &mut b, true, 4, 6);

        assert_eq!(set.vertex_count(), 12);
        assert_eq!(b.index_range(), 6..18);
        assert_eq!(&set.indices()[6..12], &[4, 5, 7, 7, 5, 6]);
        assert_eq!(set.positions()[4 * XYZW_DIM], 100);
    }

    #[test]
    fn rewrite_truncates_at_batch_start() {
        let mut set = BufferSet::new();
        let mut a = batch(4, 0);
        let mut b = batch(4, 100);
        set.write_batch(DiffState::FULL, &mut a, true, 0, 0);
        set.write_batch(DiffState::FULL, &mut b, true, 4, 6);

        let mut b = batch(4, 200);
        set.write_batch(DiffState::RGBA, &mut b, true, 4, 6);
        assert_eq!(set.colors().len(), 8 * RGBA_DIM);
        assert_eq!(set.colors()[4 * RGBA_DIM], 200);
        assert_eq!(set.positions()[4 * XYZW_DIM], 100);
    }

    #[test]
    #[should_panic(expected = "16-bit index range")]
    fn oversized_batch_panics() {
        let mut set = BufferSet::new();
        let mut b = batch(8, 0);
        set.write_batch(DiffState::FULL, &mut b, true, MAX_VERTICES - 4, 0);
    }

    // ── flush ─────────────────────────────────────────────────────────────

    #[test]
    fn flush_uploads_only_dirty_mirrors() {
        let mut set = BufferSet::new();
        let mut b = batch(4, 1);
        set.write_batch(DiffState::FULL, &mut b, true, 0, 0);

        let mut backend = RecordingBackend::default();
        assert_eq!(set.flush(DiffState::empty(), &mut backend), 0);
        assert_eq!(backend.count(), 0);

        assert_eq!(set.flush(DiffState::RGBA | DiffState::UV, &mut backend), 2);
        assert_eq!(backend.count_of(BufferKind::Color), 1);
        assert_eq!(backend.count_of(BufferKind::TexCoord), 1);
        assert_eq!(backend.last[&BufferKind::Color].len(), 16);
    }

    #[test]
    fn truncate_reports_shrink() {
        let mut set = BufferSet::new();
        let mut b = batch(8, 1);
        set.write_batch(DiffState::FULL, &mut b, true, 0, 0);
        assert!(!set.truncate(8, 12));
        assert!(set.truncate(4, 6));
        assert_eq!(set.vertex_count(), 4);
        assert_eq!(set.index_count(), 6);
    }
}
