use bitflags::bitflags;

bitflags! {
    /// Which parts of a slot's geometry must be regenerated.
    ///
    /// Produced by comparing a draw call against the retained primitive and
    /// accumulated per batch and per frame to decide which buffers to rebuild.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DiffState: u8 {
        /// Vertex count or batch layout changed; indices must be rebuilt.
        const RESIZED  = 1 << 0;
        /// Variant or draw-program state changed; previous geometry is discarded.
        const MISMATCH = 1 << 1;

        /// Positions (and depth) changed.
        const XYZW     = 1 << 4;
        /// Colors changed.
        const RGBA     = 1 << 5;
        /// Texture coordinates changed.
        const UV       = 1 << 6;
    }
}

impl DiffState {
    /// Every buffer, including indices.
    pub const FULL: Self = Self::RESIZED
        .union(Self::XYZW)
        .union(Self::RGBA)
        .union(Self::UV);
}
