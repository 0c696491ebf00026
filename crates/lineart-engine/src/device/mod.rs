//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - owning the depth and multisample attachments that follow the surface size
//! - acquiring frames and providing encoders/views for rendering

mod context;
mod init;
mod surface;

pub use context::Gpu;
pub use init::GpuInit;
pub use surface::{GpuFrame, SurfaceErrorAction, DEPTH_FORMAT};
