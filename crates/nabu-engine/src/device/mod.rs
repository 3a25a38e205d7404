//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - blocking until submitted work has completed

mod gpu;
mod init;

pub use gpu::Gpu;
pub use init::GpuInit;
