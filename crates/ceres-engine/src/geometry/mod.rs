//! Shape geometry: the shared unit-quad recipe and its GPU upload.

mod buffer;
mod quad;

pub use buffer::GeometryBuffer;
pub use quad::{quad_vertices, Corner, QUAD_INDICES, QUAD_TEX_COORDS};
