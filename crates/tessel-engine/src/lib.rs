//! Tessel: a retained-mode GUI rendering core on wgpu.
//!
//! The app re-issues its draw calls every frame into a [`scene::DrawList`];
//! call order is identity, so unchanged calls cost nothing. The
//! [`render::UiRenderer`] batches compatible primitives, keeps paint order
//! with the depth buffer and re-uploads only the buffers that changed.
//! [`interact::Router`] routes input to the widgets drawn this frame.

pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod interact;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod text;
pub mod texture;
pub mod window;
