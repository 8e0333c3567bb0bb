//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code translates platform events into `InputEvent`s in GUI units.

mod state;
mod types;

pub mod platform;

pub use state::InputState;
pub use types::{Action, InputEvent, Key, Modifiers, MouseButton};
