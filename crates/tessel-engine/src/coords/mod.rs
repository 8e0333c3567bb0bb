//! Coordinate and geometry types shared by the draw list, renderer and router.
//!
//! Canonical CPU space ("GUI units"):
//! - Origin at the viewport center
//! - +X right, +Y up
//! - The shorter viewport axis spans [-1, 1]
//!
//! Multiplying by [`Projection::aspect`] yields clip space.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::{Projection, Viewport};
