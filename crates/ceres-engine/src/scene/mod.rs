//! Scene entities and paint order.
//!
//! Responsibilities:
//! - build textured-quad entities through one construction path
//! - keep a flat, caller-ordered paint list (no hierarchy, no re-sorting)
//! - expose the only cross-thread state (entity positions) as atomics

mod builder;
mod camera;
mod composer;
mod entity;
mod transform;

pub use builder::{build_entity, EntityError, EntitySpec};
pub use camera::{Camera, CameraConfig};
pub use composer::{SceneComposer, ENTITY_TEXTURE_UNIT};
pub use entity::{Direction, MoverHandle, Movement, RenderableEntity, Texture, TexturedModel};
pub use transform::SharedTransform;
