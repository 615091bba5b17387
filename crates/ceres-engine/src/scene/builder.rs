use std::path::PathBuf;

use crate::geometry::{quad_vertices, GeometryBuffer, QUAD_INDICES, QUAD_TEX_COORDS};
use crate::gfx::{GraphicsDevice, GraphicsError};
use crate::resource::{ImageLoader, ResourceLoadError, ResourceRegistry};

use super::entity::{Movement, RenderableEntity, Texture, TexturedModel};

/// Placement and image of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub name: String,
    pub image: PathBuf,
    pub position: [f32; 3],
    pub width: f32,
    pub height: f32,
}

impl EntitySpec {
    pub fn new(
        name: impl Into<String>,
        image: impl Into<PathBuf>,
        position: [f32; 3],
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            position,
            width,
            height,
        }
    }
}

/// Failure to construct an entity. Nothing from the failed entity stays registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    #[error(transparent)]
    Resource(#[from] ResourceLoadError),
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

/// Builds an entity: load image → upload texture → generate quad → upload geometry → wrap.
///
/// The image is decoded before the first allocation, so a load failure registers no handles.
/// A graphics failure rolls back every handle this call allocated.
pub fn build_entity<D, L>(
    registry: &mut ResourceRegistry,
    device: &mut D,
    loader: &L,
    spec: &EntitySpec,
    movement: Option<Movement>,
) -> Result<RenderableEntity, EntityError>
where
    D: GraphicsDevice + ?Sized,
    L: ImageLoader + ?Sized,
{
    let image = loader.load(&spec.image).map_err(|e| {
        log::error!("entity `{}`: {e}", spec.name);
        e
    })?;

    let checkpoint = registry.checkpoint();
    let model = match upload_model(registry, device, spec, &image) {
        Ok(model) => model,
        Err(e) => {
            log::error!("entity `{}`: {e}", spec.name);
            registry.rollback(checkpoint, device);
            return Err(e.into());
        }
    };

    log::debug!(
        "built entity `{}` at {:?} ({}x{}) with {} / {}",
        spec.name,
        spec.position,
        spec.width,
        spec.height,
        model.geometry.vertex_array(),
        model.texture.id()
    );

    let entity = RenderableEntity::new(&*spec.name, spec.position, spec.width, spec.height, model);
    Ok(match movement {
        Some(m) => entity.with_movement(m),
        None => entity,
    })
}

fn upload_model<D>(
    registry: &mut ResourceRegistry,
    device: &mut D,
    spec: &EntitySpec,
    image: &crate::resource::RawImage,
) -> Result<TexturedModel, GraphicsError>
where
    D: GraphicsDevice + ?Sized,
{
    let texture_id = registry.allocate_texture(device, image)?;
    let vertices = quad_vertices(spec.position, spec.width, spec.height);
    let geometry =
        GeometryBuffer::build(registry, device, &vertices, &QUAD_TEX_COORDS, &QUAD_INDICES)?;

    Ok(TexturedModel {
        geometry,
        texture: Texture::new(texture_id, &spec.image),
    })
}
