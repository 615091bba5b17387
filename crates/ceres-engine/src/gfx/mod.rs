//! Graphics abstraction.
//!
//! The core talks to the GPU only through these traits:
//! - [`GraphicsDevice`] creates and destroys handles (vertex arrays, buffers, textures)
//! - [`ShadingStage`] is the active program plus per-frame transform state; draw calls go here
//! - [`RenderBackend`] adds frame acquisition and presentation
//!
//! All implementations are owned by, and only called from, the thread that owns the
//! graphics context. Background tasks never hold one.

mod error;
mod handle;

pub use error::GraphicsError;
pub use handle::{BufferId, TextureId, VertexArrayId};

use crate::resource::RawImage;
use crate::scene::Camera;

/// Attribute slot for vertex positions (3 x f32).
pub const POSITION_SLOT: u32 = 0;
/// Components per position.
pub const POSITION_COMPONENTS: u32 = 3;
/// Attribute slot for texture coordinates (2 x f32).
pub const TEX_COORD_SLOT: u32 = 1;
/// Components per texture coordinate.
pub const TEX_COORD_COMPONENTS: u32 = 2;

/// Returns the component count the shading stage binds at `slot`, if the slot exists.
pub fn slot_components(slot: u32) -> Option<u32> {
    match slot {
        POSITION_SLOT => Some(POSITION_COMPONENTS),
        TEX_COORD_SLOT => Some(TEX_COORD_COMPONENTS),
        _ => None,
    }
}

/// GPU resource allocation.
///
/// Every `create_*` returns a fresh handle that is never reused for another resource
/// while it is alive. `destroy_*` on an unknown handle is ignored by implementations
/// (with a diagnostic), so a stray release cannot free somebody else's resource.
pub trait GraphicsDevice {
    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GraphicsError>;

    /// Uploads `indices` and binds them as the index buffer of `vao`.
    fn create_index_buffer(
        &mut self,
        vao: VertexArrayId,
        indices: &[u32],
    ) -> Result<BufferId, GraphicsError>;

    /// Uploads `data` and binds it to attribute `slot` of `vao`, `components` floats per vertex.
    fn create_attribute_buffer(
        &mut self,
        vao: VertexArrayId,
        slot: u32,
        components: u32,
        data: &[f32],
    ) -> Result<BufferId, GraphicsError>;

    fn create_texture(&mut self, image: &RawImage) -> Result<TextureId, GraphicsError>;

    fn destroy_vertex_array(&mut self, id: VertexArrayId);
    fn destroy_buffer(&mut self, id: BufferId);
    fn destroy_texture(&mut self, id: TextureId);
}

/// The active shading program and its per-frame state.
///
/// Calls between `start` and `stop` form one pass; binds are reset by `unbind`.
pub trait ShadingStage {
    fn start(&mut self);
    fn stop(&mut self);

    /// Loads the camera's view transform for the current pass.
    fn load_view_matrix(&mut self, camera: &Camera);

    /// Loads a world-space translation applied to the next draw.
    fn load_entity_offset(&mut self, offset: [f32; 3]);

    fn bind_vertex_array(&mut self, id: VertexArrayId);
    fn bind_texture(&mut self, unit: u32, id: TextureId);
    fn draw_indexed(&mut self, index_count: u32);
    fn unbind(&mut self);

    /// Releases the stage's own GPU resources (pipeline, uniforms).
    fn release(&mut self);
}

/// Outcome of acquiring a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    /// A frame was acquired and cleared; drawing may proceed.
    Ready,
    /// Transient failure; skip this frame.
    Skip,
    /// Unrecoverable; the session should shut down.
    Fatal,
}

/// Full backend used by the frame loop.
pub trait RenderBackend: GraphicsDevice + ShadingStage {
    /// Acquires the next frame and clears it.
    fn prepare(&mut self) -> FrameStatus;

    /// Submits everything recorded since `prepare` and presents it.
    fn present(&mut self);

    fn resize(&mut self, width: u32, height: u32);
}
