//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The window runtime writes key transitions into a [`SharedKeyboard`]; the
//! [`InputDriver`] samples it on its own thread.

mod driver;
mod keyboard;
pub(crate) mod platform;
mod types;

pub use driver::InputDriver;
pub use keyboard::{KeySource, SharedKeyboard};
pub use types::{Key, KeyBindings, KeyState};
