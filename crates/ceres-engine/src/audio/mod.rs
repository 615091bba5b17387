//! Audio task: a background thread that plays music and one-shot effects on request.
//!
//! Callers only hold an [`AudioHandle`]; requests never block and never touch GPU state.

mod player;
mod task;

pub use player::{LogSoundPlayer, SoundPlayer};
pub use task::{AudioCommand, AudioHandle, AudioTask};

#[cfg(test)]
pub(crate) use task::channel;
