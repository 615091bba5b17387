use crate::gfx::{
    GraphicsDevice, GraphicsError, VertexArrayId, POSITION_COMPONENTS, POSITION_SLOT,
    TEX_COORD_COMPONENTS, TEX_COORD_SLOT,
};
use crate::resource::ResourceRegistry;

/// One renderable shape on the GPU: a vertex array with its index and attribute buffers bound.
///
/// Immutable once built.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GeometryBuffer {
    vertex_array: VertexArrayId,
    index_count: u32,
}

impl GeometryBuffer {
    /// Uploads a shape and binds it to a new vertex array.
    ///
    /// Order: vertex array, index buffer, positions at slot 0, texture coordinates at slot 1.
    /// Every handle goes through `registry`; on failure the caller rolls back to a checkpoint.
    pub fn build<D>(
        registry: &mut ResourceRegistry,
        device: &mut D,
        positions: &[f32],
        tex_coords: &[f32],
        indices: &[u32],
    ) -> Result<Self, GraphicsError>
    where
        D: GraphicsDevice + ?Sized,
    {
        debug_assert_eq!(positions.len() % POSITION_COMPONENTS as usize, 0);
        debug_assert_eq!(
            positions.len() / POSITION_COMPONENTS as usize,
            tex_coords.len() / TEX_COORD_COMPONENTS as usize,
            "positions and texture coordinates disagree on vertex count"
        );

        let vertex_array = registry.allocate_vertex_array(device)?;
        registry.allocate_index_buffer(device, vertex_array, indices)?;
        store_attribute(
            registry,
            device,
            vertex_array,
            POSITION_SLOT,
            POSITION_COMPONENTS,
            positions,
        )?;
        store_attribute(
            registry,
            device,
            vertex_array,
            TEX_COORD_SLOT,
            TEX_COORD_COMPONENTS,
            tex_coords,
        )?;

        Ok(Self {
            vertex_array,
            index_count: indices.len() as u32,
        })
    }

    #[inline]
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

fn store_attribute<D>(
    registry: &mut ResourceRegistry,
    device: &mut D,
    vao: VertexArrayId,
    slot: u32,
    components: u32,
    data: &[f32],
) -> Result<(), GraphicsError>
where
    D: GraphicsDevice + ?Sized,
{
    log::debug!(
        "storing attribute array at slot {slot} ({components} components, {} floats)",
        data.len()
    );
    registry.allocate_attribute_buffer(device, vao, slot, components, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{quad_vertices, QUAD_INDICES, QUAD_TEX_COORDS};
    use crate::testing::{DeviceEvent, RecordingBackend};

    #[test]
    fn build_follows_vertex_array_recipe() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();
        let positions = quad_vertices([0.0, 0.0, -1.0], 1.0, 1.0);

        let geom =
            GeometryBuffer::build(&mut reg, &mut dev, &positions, &QUAD_TEX_COORDS, &QUAD_INDICES)
                .unwrap();

        assert_eq!(geom.index_count(), 6);
        let vao = geom.vertex_array();
        assert_eq!(
            dev.device_events(),
            vec![
                DeviceEvent::CreateVertexArray(vao),
                DeviceEvent::CreateIndexBuffer { vao, len: 6 },
                DeviceEvent::CreateAttribute { vao, slot: 0, components: 3, len: 12 },
                DeviceEvent::CreateAttribute { vao, slot: 1, components: 2, len: 8 },
            ]
        );
        assert_eq!(reg.counts().vertex_arrays, 1);
        assert_eq!(reg.counts().buffers, 3);
        reg.release_all(&mut dev);
    }

    #[test]
    fn failure_mid_build_propagates() {
        let mut dev = RecordingBackend::new();
        // vertex array + index buffer succeed, position attribute fails
        dev.fail_after(2);
        let mut reg = ResourceRegistry::new();
        let positions = quad_vertices([0.0; 3], 1.0, 1.0);

        let err =
            GeometryBuffer::build(&mut reg, &mut dev, &positions, &QUAD_TEX_COORDS, &QUAD_INDICES)
                .unwrap_err();
        assert!(matches!(err, GraphicsError::ResourceExhausted { .. }));
        assert_eq!(reg.counts().total(), 2);
        reg.release_all(&mut dev);
    }
}
