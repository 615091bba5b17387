//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue and configuring the surface
//! - acquiring and presenting frames
//! - [`WgpuBackend`]: the wgpu implementation of the graphics traits

mod backend;
mod gpu;

pub use backend::WgpuBackend;
pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
