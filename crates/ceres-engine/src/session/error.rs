use std::fmt;

use crate::scene::EntityError;

/// Session lifecycle: `Constructed → Running → Closed`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SessionState {
    Constructed,
    Running,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Constructed => "constructed",
            SessionState::Running => "running",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Operation called in a state that does not allow it.
    #[error("cannot {operation}: session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("entity construction failed: {0}")]
    Entity(#[from] EntityError),

    #[error("audio task failed to start: {0}")]
    Audio(String),

    #[error("input driver failed to start: {0}")]
    Input(String),
}
