//! GPU resource lifecycle.
//!
//! Images are decoded before anything is allocated, so a missing or corrupt file
//! never leaves a handle behind. Every allocation goes through [`ResourceRegistry`],
//! which releases the whole session's handles in one sweep at teardown.

mod loader;
mod registry;

pub use loader::{FileImageLoader, ImageLoader, LoadErrorKind, RawImage, ResourceLoadError};
pub use registry::{Checkpoint, ResourceCounts, ResourceRegistry};
