//! Test doubles: a recording backend, an in-memory image loader and a recording sound player.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::audio::SoundPlayer;
use crate::gfx::{
    slot_components, BufferId, FrameStatus, GraphicsDevice, GraphicsError, RenderBackend,
    ShadingStage, TextureId, VertexArrayId,
};
use crate::resource::{ImageLoader, RawImage, ResourceCounts, ResourceLoadError};
use crate::scene::Camera;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    CreateVertexArray(VertexArrayId),
    CreateIndexBuffer { vao: VertexArrayId, len: usize },
    CreateAttribute { vao: VertexArrayId, slot: u32, components: u32, len: usize },
    CreateTexture { id: TextureId, width: u32, height: u32 },
    DestroyVertexArray(VertexArrayId),
    DestroyBuffer(BufferId),
    DestroyTexture(TextureId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Start,
    Stop,
    ViewMatrix(Camera),
    Offset([f32; 3]),
    BindVertexArray(VertexArrayId),
    BindTexture(u32, TextureId),
    DrawIndexed(u32),
    Unbind,
}

/// One draw call with the state bound when it was issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub vao: Option<VertexArrayId>,
    pub texture: Option<TextureId>,
    pub index_count: u32,
    pub offset: [f32; 3],
}

/// `RenderBackend` that records every call and tracks live handles.
#[derive(Debug)]
pub struct RecordingBackend {
    next_id: u32,
    vertex_arrays: HashSet<VertexArrayId>,
    buffers: HashSet<BufferId>,
    textures: HashSet<TextureId>,
    device_events: Vec<DeviceEvent>,
    stage_events: Vec<StageEvent>,
    budget: Option<usize>,
    double_releases: usize,
    frame_status: FrameStatus,
    prepared: usize,
    presented: usize,
    stage_released: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            vertex_arrays: HashSet::new(),
            buffers: HashSet::new(),
            textures: HashSet::new(),
            device_events: Vec::new(),
            stage_events: Vec::new(),
            budget: None,
            double_releases: 0,
            frame_status: FrameStatus::Ready,
            prepared: 0,
            presented: 0,
            stage_released: false,
        }
    }

    /// Lets `n` more creations succeed; every one after that fails with `ResourceExhausted`.
    pub fn fail_after(&mut self, n: usize) {
        self.budget = Some(n);
    }

    pub fn set_frame_status(&mut self, status: FrameStatus) {
        self.frame_status = status;
    }

    pub fn live(&self) -> ResourceCounts {
        ResourceCounts {
            vertex_arrays: self.vertex_arrays.len(),
            buffers: self.buffers.len(),
            textures: self.textures.len(),
        }
    }

    /// Destroy calls on handles that were not live.
    pub fn double_releases(&self) -> usize {
        self.double_releases
    }

    pub fn stage_released(&self) -> bool {
        self.stage_released
    }

    /// `(prepare calls, present calls)`.
    pub fn frames(&self) -> (usize, usize) {
        (self.prepared, self.presented)
    }

    pub fn device_events(&self) -> Vec<DeviceEvent> {
        self.device_events.clone()
    }

    pub fn stage_events(&self) -> Vec<StageEvent> {
        self.stage_events.clone()
    }

    pub fn clear_events(&mut self) {
        self.device_events.clear();
        self.stage_events.clear();
    }

    /// Draw calls in issue order, with the vertex array, texture and offset bound at the time.
    pub fn draw_sequence(&self) -> Vec<DrawCall> {
        let mut vao = None;
        let mut texture = None;
        let mut offset = [0.0; 3];
        let mut draws = Vec::new();

        for ev in &self.stage_events {
            match ev {
                StageEvent::Offset(o) => offset = *o,
                StageEvent::BindVertexArray(v) => vao = Some(*v),
                StageEvent::BindTexture(_, t) => texture = Some(*t),
                StageEvent::Unbind => {
                    vao = None;
                    texture = None;
                }
                StageEvent::DrawIndexed(index_count) => draws.push(DrawCall {
                    vao,
                    texture,
                    index_count: *index_count,
                    offset,
                }),
                StageEvent::Start | StageEvent::Stop | StageEvent::ViewMatrix(_) => {}
            }
        }
        draws
    }

    fn allocate(&mut self, resource: &'static str) -> Result<u32, GraphicsError> {
        if let Some(budget) = self.budget.as_mut() {
            if *budget == 0 {
                return Err(GraphicsError::ResourceExhausted { resource });
            }
            *budget -= 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    fn check_vao(&self, vao: VertexArrayId) -> Result<(), GraphicsError> {
        if self.vertex_arrays.contains(&vao) {
            Ok(())
        } else {
            Err(GraphicsError::UnknownHandle {
                kind: "vertex array",
                id: vao.0,
            })
        }
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for RecordingBackend {
    fn create_vertex_array(&mut self) -> Result<VertexArrayId, GraphicsError> {
        let id = VertexArrayId(self.allocate("vertex array")?);
        self.vertex_arrays.insert(id);
        self.device_events.push(DeviceEvent::CreateVertexArray(id));
        Ok(id)
    }

    fn create_index_buffer(
        &mut self,
        vao: VertexArrayId,
        indices: &[u32],
    ) -> Result<BufferId, GraphicsError> {
        self.check_vao(vao)?;
        let id = BufferId(self.allocate("index buffer")?);
        self.buffers.insert(id);
        self.device_events.push(DeviceEvent::CreateIndexBuffer {
            vao,
            len: indices.len(),
        });
        Ok(id)
    }

    fn create_attribute_buffer(
        &mut self,
        vao: VertexArrayId,
        slot: u32,
        components: u32,
        data: &[f32],
    ) -> Result<BufferId, GraphicsError> {
        self.check_vao(vao)?;
        let expected = slot_components(slot).unwrap_or(0);
        if expected != components {
            return Err(GraphicsError::LayoutMismatch {
                slot,
                expected,
                actual: components,
            });
        }
        let id = BufferId(self.allocate("attribute buffer")?);
        self.buffers.insert(id);
        self.device_events.push(DeviceEvent::CreateAttribute {
            vao,
            slot,
            components,
            len: data.len(),
        });
        Ok(id)
    }

    fn create_texture(&mut self, image: &RawImage) -> Result<TextureId, GraphicsError> {
        let id = TextureId(self.allocate("texture")?);
        self.textures.insert(id);
        self.device_events.push(DeviceEvent::CreateTexture {
            id,
            width: image.width,
            height: image.height,
        });
        Ok(id)
    }

    fn destroy_vertex_array(&mut self, id: VertexArrayId) {
        if !self.vertex_arrays.remove(&id) {
            self.double_releases += 1;
        }
        self.device_events.push(DeviceEvent::DestroyVertexArray(id));
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if !self.buffers.remove(&id) {
            self.double_releases += 1;
        }
        self.device_events.push(DeviceEvent::DestroyBuffer(id));
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if !self.textures.remove(&id) {
            self.double_releases += 1;
        }
        self.device_events.push(DeviceEvent::DestroyTexture(id));
    }
}

impl ShadingStage for RecordingBackend {
    fn start(&mut self) {
        self.stage_events.push(StageEvent::Start);
    }

    fn stop(&mut self) {
        self.stage_events.push(StageEvent::Stop);
    }

    fn load_view_matrix(&mut self, camera: &Camera) {
        self.stage_events.push(StageEvent::ViewMatrix(*camera));
    }

    fn load_entity_offset(&mut self, offset: [f32; 3]) {
        self.stage_events.push(StageEvent::Offset(offset));
    }

    fn bind_vertex_array(&mut self, id: VertexArrayId) {
        self.stage_events.push(StageEvent::BindVertexArray(id));
    }

    fn bind_texture(&mut self, unit: u32, id: TextureId) {
        self.stage_events.push(StageEvent::BindTexture(unit, id));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.stage_events.push(StageEvent::DrawIndexed(index_count));
    }

    fn unbind(&mut self) {
        self.stage_events.push(StageEvent::Unbind);
    }

    fn release(&mut self) {
        self.stage_released = true;
    }
}

impl RenderBackend for RecordingBackend {
    fn prepare(&mut self) -> FrameStatus {
        self.prepared += 1;
        self.frame_status
    }

    fn present(&mut self) {
        self.presented += 1;
    }

    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Single-colour RGBA8 image.
pub fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> RawImage {
    let rgba = rgba
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 4)
        .collect();
    RawImage { width, height, rgba }
}

/// Image loader backed by a map. Unknown paths are `NotFound`.
#[derive(Debug, Default, Clone)]
pub struct MemoryImageLoader {
    images: HashMap<PathBuf, Option<RawImage>>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        self.images
            .insert(path.into(), Some(solid_image(width, height, [255, 255, 255, 255])));
        self
    }

    /// Registers a path that exists but does not decode.
    pub fn with_corrupt(mut self, path: impl Into<PathBuf>) -> Self {
        self.images.insert(path.into(), None);
        self
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load(&self, path: &Path) -> Result<RawImage, ResourceLoadError> {
        match self.images.get(path) {
            Some(Some(image)) => Ok(image.clone()),
            Some(None) => Err(ResourceLoadError::decode(path, "corrupt test image")),
            None => Err(ResourceLoadError::not_found(path)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Music(PathBuf),
    Effect(PathBuf),
    StopAll,
}

/// Sound player that records requests. Clones share one log.
#[derive(Debug, Default, Clone)]
pub struct RecordingPlayer {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: PlayerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl SoundPlayer for RecordingPlayer {
    fn start_music(&mut self, path: &Path) {
        self.push(PlayerEvent::Music(path.to_path_buf()));
    }

    fn play_effect(&mut self, path: &Path) {
        self.push(PlayerEvent::Effect(path.to_path_buf()));
    }

    fn stop_all(&mut self) {
        self.push(PlayerEvent::StopAll);
    }
}
