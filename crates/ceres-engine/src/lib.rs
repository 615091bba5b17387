//! Ceres engine crate.
//!
//! A small 2.5D scene runtime: textured quads painted back-to-front, a busy-polling
//! input driver and an audio task on their own threads, and a session controller that
//! owns every GPU handle and releases them in one sweep.
//!
//! GPU work goes through the traits in [`gfx`]; [`device::WgpuBackend`] is the wgpu
//! implementation and [`window::Runtime`] wires it to a winit window.

pub mod audio;
pub mod device;
pub mod geometry;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod resource;
pub mod scene;
pub mod session;
pub mod task;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;
