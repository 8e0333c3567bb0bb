//! Retained scene: primitives, per-frame diffing and vertex generation.
//!
//! Responsibilities:
//! - match each frame's draw calls against last frame's slots (`DrawList`)
//! - diff primitives into a `DiffState` mask and regenerate only dirty streams
//! - keep shape-specific geometry isolated per file under `scene::shapes`
//!
//! Batching and GPU buffers live in `render`; nothing here knows about them.

mod list;
mod state;

pub mod mesh;
pub mod shapes;

pub use list::{DrawList, Slot};
pub use shapes::{Primitive, Program, RectShape, ShapeBase, SpriteShape, TextShape};
pub use state::DiffState;
