//! GPU rendering subsystem.
//!
//! The CPU half ([`Compositor`]) groups a [`DrawList`](crate::scene::DrawList)'s
//! slots into batches and keeps flat mirrors of the shared GPU buffers; the
//! GPU half ([`UiRenderer`]) uploads dirty mirrors and issues one indexed
//! draw per batch.
//!
//! Convention:
//! - vertex positions are emitted in clip space by the CPU (half floats)
//! - depth orders calls: later calls are nearer, `LessEqual` test
//! - colors are premultiplied; blended batches use `One, OneMinusSrcAlpha`

mod ctx;
mod pipeline;
mod renderer;
mod textures;

pub mod batch;
pub mod buffers;
pub mod compositor;

pub use batch::{Batch, Batcher, MAX_DEPTH_LEVELS};
pub use buffers::{BufferBackend, BufferKind, BufferSet, WgpuBuffers};
pub use compositor::{BatchDraw, Compositor};
pub use ctx::{RenderCtx, RenderTarget};
pub use renderer::{RendererConfig, UiRenderer};
