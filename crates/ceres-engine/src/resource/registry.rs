use crate::gfx::{BufferId, GraphicsDevice, GraphicsError, TextureId, VertexArrayId};

use super::RawImage;

/// Number of live handles per resource kind.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ResourceCounts {
    pub vertex_arrays: usize,
    pub buffers: usize,
    pub textures: usize,
}

impl ResourceCounts {
    #[inline]
    pub fn total(&self) -> usize {
        self.vertex_arrays + self.buffers + self.textures
    }
}

/// Registry position captured before a multi-allocation operation.
///
/// Passing it to [`ResourceRegistry::rollback`] destroys everything recorded since.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Checkpoint(ResourceCounts);

/// Tracks every GPU handle allocated during a session for bulk teardown.
///
/// Invariants:
/// - each handle is recorded in exactly one set, at most once
/// - handles are only removed by `release_all` or `rollback`, which destroy them exactly once
///
/// The registry does not own the device; every allocating or releasing call borrows it,
/// which keeps all GPU work on the caller's (render) thread.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    vertex_arrays: Vec<VertexArrayId>,
    buffers: Vec<BufferId>,
    textures: Vec<TextureId>,
}

impl ResourceRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_vertex_array<D>(
        &mut self,
        device: &mut D,
    ) -> Result<VertexArrayId, GraphicsError>
    where
        D: GraphicsDevice + ?Sized,
    {
        let id = device.create_vertex_array()?;
        debug_assert!(!self.vertex_arrays.contains(&id), "{id} recorded twice");
        self.vertex_arrays.push(id);
        log::trace!("allocated {id}");
        Ok(id)
    }

    pub fn allocate_index_buffer<D>(
        &mut self,
        device: &mut D,
        vao: VertexArrayId,
        indices: &[u32],
    ) -> Result<BufferId, GraphicsError>
    where
        D: GraphicsDevice + ?Sized,
    {
        let id = device.create_index_buffer(vao, indices)?;
        self.record_buffer(id);
        Ok(id)
    }

    pub fn allocate_attribute_buffer<D>(
        &mut self,
        device: &mut D,
        vao: VertexArrayId,
        slot: u32,
        components: u32,
        data: &[f32],
    ) -> Result<BufferId, GraphicsError>
    where
        D: GraphicsDevice + ?Sized,
    {
        let id = device.create_attribute_buffer(vao, slot, components, data)?;
        self.record_buffer(id);
        Ok(id)
    }

    pub fn allocate_texture<D>(
        &mut self,
        device: &mut D,
        image: &RawImage,
    ) -> Result<TextureId, GraphicsError>
    where
        D: GraphicsDevice + ?Sized,
    {
        let id = device.create_texture(image)?;
        debug_assert!(!self.textures.contains(&id), "{id} recorded twice");
        self.textures.push(id);
        log::trace!("allocated {id} ({}x{})", image.width, image.height);
        Ok(id)
    }

    fn record_buffer(&mut self, id: BufferId) {
        debug_assert!(!self.buffers.contains(&id), "{id} recorded twice");
        self.buffers.push(id);
        log::trace!("allocated {id}");
    }

    /// Current handle counts.
    pub fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            vertex_arrays: self.vertex_arrays.len(),
            buffers: self.buffers.len(),
            textures: self.textures.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    pub fn vertex_arrays(&self) -> &[VertexArrayId] {
        &self.vertex_arrays
    }

    pub fn buffers(&self) -> &[BufferId] {
        &self.buffers
    }

    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.counts())
    }

    /// Destroys and forgets every handle recorded after `checkpoint`, newest first.
    ///
    /// Returns how many handles were released.
    pub fn rollback<D>(&mut self, checkpoint: Checkpoint, device: &mut D) -> ResourceCounts
    where
        D: GraphicsDevice + ?Sized,
    {
        let Checkpoint(at) = checkpoint;
        let mut released = ResourceCounts::default();

        while self.buffers.len() > at.buffers {
            if let Some(id) = self.buffers.pop() {
                device.destroy_buffer(id);
                released.buffers += 1;
            }
        }
        while self.vertex_arrays.len() > at.vertex_arrays {
            if let Some(id) = self.vertex_arrays.pop() {
                device.destroy_vertex_array(id);
                released.vertex_arrays += 1;
            }
        }
        while self.textures.len() > at.textures {
            if let Some(id) = self.textures.pop() {
                device.destroy_texture(id);
                released.textures += 1;
            }
        }

        if released.total() > 0 {
            log::debug!("rolled back {} handles", released.total());
        }
        released
    }

    /// Destroys every recorded handle: vertex arrays, then buffers, then textures.
    ///
    /// The sets are drained, so a second call releases nothing.
    pub fn release_all<D>(&mut self, device: &mut D) -> ResourceCounts
    where
        D: GraphicsDevice + ?Sized,
    {
        let released = self.counts();

        for id in self.vertex_arrays.drain(..) {
            device.destroy_vertex_array(id);
        }
        for id in self.buffers.drain(..) {
            device.destroy_buffer(id);
        }
        for id in self.textures.drain(..) {
            device.destroy_texture(id);
        }

        log::info!(
            "released {} vertex arrays, {} buffers, {} textures",
            released.vertex_arrays,
            released.buffers,
            released.textures
        );
        released
    }
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        if !self.is_empty() {
            log::warn!(
                "resource registry dropped with {} outstanding handles; release_all was not called",
                self.counts().total()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{solid_image, RecordingBackend};

    fn tiny() -> RawImage {
        solid_image(1, 1, [255; 4])
    }

    #[test]
    fn allocations_are_recorded_per_kind() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();

        let vao = reg.allocate_vertex_array(&mut dev).unwrap();
        reg.allocate_index_buffer(&mut dev, vao, &[0, 1, 2]).unwrap();
        reg.allocate_attribute_buffer(&mut dev, vao, 0, 3, &[0.0; 9]).unwrap();
        reg.allocate_texture(&mut dev, &tiny()).unwrap();

        assert_eq!(
            reg.counts(),
            ResourceCounts { vertex_arrays: 1, buffers: 2, textures: 1 }
        );
        assert_eq!(dev.live().total(), 4);
    }

    #[test]
    fn release_all_leaves_nothing_outstanding() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();

        for _ in 0..3 {
            let vao = reg.allocate_vertex_array(&mut dev).unwrap();
            reg.allocate_index_buffer(&mut dev, vao, &[0, 1, 2]).unwrap();
            reg.allocate_texture(&mut dev, &tiny()).unwrap();
        }

        let released = reg.release_all(&mut dev);
        assert_eq!(released.total(), 9);
        assert!(reg.is_empty());
        assert_eq!(dev.live().total(), 0);
        assert_eq!(dev.double_releases(), 0);
    }

    #[test]
    fn release_all_twice_is_safe() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();
        reg.allocate_vertex_array(&mut dev).unwrap();

        assert_eq!(reg.release_all(&mut dev).total(), 1);
        assert_eq!(reg.release_all(&mut dev).total(), 0);
        assert_eq!(dev.double_releases(), 0);
    }

    #[test]
    fn release_all_on_empty_registry() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();
        assert_eq!(reg.release_all(&mut dev), ResourceCounts::default());
    }

    #[test]
    fn failed_allocation_records_nothing() {
        let mut dev = RecordingBackend::new();
        dev.fail_after(0);
        let mut reg = ResourceRegistry::new();

        let err = reg.allocate_vertex_array(&mut dev).unwrap_err();
        assert!(matches!(err, GraphicsError::ResourceExhausted { .. }));
        assert!(reg.is_empty());
    }

    #[test]
    fn rollback_releases_only_newer_handles() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();

        let kept = reg.allocate_texture(&mut dev, &tiny()).unwrap();
        let cp = reg.checkpoint();
        let vao = reg.allocate_vertex_array(&mut dev).unwrap();
        reg.allocate_index_buffer(&mut dev, vao, &[0]).unwrap();
        reg.allocate_texture(&mut dev, &tiny()).unwrap();

        let released = reg.rollback(cp, &mut dev);
        assert_eq!(released.total(), 3);
        assert_eq!(reg.textures(), &[kept]);
        assert_eq!(dev.live().total(), 1);
    }
}
