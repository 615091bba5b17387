/// Failures raised by a [`GraphicsDevice`](super::GraphicsDevice).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphicsError {
    /// The device could not satisfy an allocation (size over device limits, out of memory).
    #[error("graphics resource exhausted while allocating {resource}")]
    ResourceExhausted { resource: &'static str },

    /// A handle was used that the device does not know (never created or already released).
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    /// Attribute data does not match the layout the shading stage binds.
    #[error("attribute slot {slot} expects {expected} components, got {actual}")]
    LayoutMismatch { slot: u32, expected: u32, actual: u32 },
}
