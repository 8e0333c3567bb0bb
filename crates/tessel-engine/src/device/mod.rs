//! GPU device layer.
//!
//! Owns the wgpu instance, surface, device and depth attachment for one window.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
