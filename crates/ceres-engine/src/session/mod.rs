//! Session lifecycle: build the scene, run the background tasks, draw frames, tear down.

mod config;
mod controller;
mod error;
mod flags;

pub use config::{AudioConfig, InputConfig, SessionConfig};
pub use controller::SessionController;
pub use error::{SessionError, SessionState};
pub use flags::SessionFlags;
