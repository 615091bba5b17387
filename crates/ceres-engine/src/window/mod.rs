//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, the wgpu backend bound to it, and the session
//! that draws into it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
