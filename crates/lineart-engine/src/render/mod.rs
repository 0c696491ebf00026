//! GPU rendering subsystem.
//!
//! Renderers consume recorded geometry and issue GPU commands via wgpu.
//! Each renderer is responsible for its own GPU resources (pipelines, buffers).
//!
//! Convention:
//! - geometry is transformed to clip space on the CPU while it is recorded
//! - every pass renders into the frame's color target with the shared depth buffer

mod ctx;
pub mod lines;

pub use ctx::{RenderCtx, RenderTarget};
