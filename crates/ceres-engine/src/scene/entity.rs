use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::geometry::GeometryBuffer;
use crate::gfx::TextureId;

use super::transform::SharedTransform;

/// A GPU texture plus the image it was produced from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Texture {
    id: TextureId,
    source: PathBuf,
}

impl Texture {
    pub fn new(id: TextureId, source: impl Into<PathBuf>) -> Self {
        Self {
            id,
            source: source.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Geometry + texture pairing drawn as one unit.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TexturedModel {
    pub geometry: GeometryBuffer,
    pub texture: Texture,
}

/// Movement command directions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector in world space (+Y up, +X right).
    pub fn unit(self) -> [f32; 3] {
        match self {
            Direction::Up => [0.0, 1.0, 0.0],
            Direction::Down => [0.0, -1.0, 0.0],
            Direction::Left => [-1.0, 0.0, 0.0],
            Direction::Right => [1.0, 0.0, 0.0],
        }
    }
}

/// Movement capability attached to entities that respond to direction commands.
///
/// Each command moves a fixed `step`; there is no elapsed-time scaling.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Movement {
    pub step: f32,
}

impl Movement {
    pub fn new(step: f32) -> Self {
        Self { step }
    }

    pub fn apply(&self, transform: &SharedTransform, direction: Direction) {
        let [dx, dy, dz] = direction.unit();
        transform.translate([dx * self.step, dy * self.step, dz * self.step]);
    }
}

/// The part of a movable entity a background task may hold.
///
/// Carries no GPU state, so it is safe to send to the input thread.
#[derive(Debug, Clone)]
pub struct MoverHandle {
    transform: Arc<SharedTransform>,
    movement: Movement,
}

impl MoverHandle {
    pub fn new(transform: Arc<SharedTransform>, movement: Movement) -> Self {
        Self { transform, movement }
    }

    pub fn movement(&self, direction: Direction) {
        self.movement.apply(&self.transform, direction);
    }

    pub fn transform(&self) -> &SharedTransform {
        &self.transform
    }
}

/// A drawable scene entity: a textured quad with a live position and a fixed extent.
///
/// `baked_position` is where the quad's vertices were generated; the live position
/// lives in `transform` and is the only source of truth for movement. The draw pass
/// translates by the difference.
#[derive(Debug)]
pub struct RenderableEntity {
    name: String,
    transform: Arc<SharedTransform>,
    baked_position: [f32; 3],
    width: f32,
    height: f32,
    model: TexturedModel,
    movement: Option<Movement>,
}

impl RenderableEntity {
    pub fn new(
        name: impl Into<String>,
        position: [f32; 3],
        width: f32,
        height: f32,
        model: TexturedModel,
    ) -> Self {
        Self {
            name: name.into(),
            transform: Arc::new(SharedTransform::new(position)),
            baked_position: position,
            width,
            height,
            model,
            movement: None,
        }
    }

    /// Attaches a movement capability.
    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> [f32; 3] {
        self.transform.position()
    }

    pub fn transform(&self) -> &SharedTransform {
        &self.transform
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn model(&self) -> &TexturedModel {
        &self.model
    }

    /// Thread-safe movement handle, `None` for static entities.
    pub fn mover(&self) -> Option<MoverHandle> {
        self.movement
            .map(|movement| MoverHandle::new(Arc::clone(&self.transform), movement))
    }

    /// Translation from the baked vertex position to the live position.
    pub fn draw_offset(&self) -> [f32; 3] {
        let [x, y, z] = self.transform.position();
        let [bx, by, bz] = self.baked_position;
        [x - bx, y - by, z - bz]
    }
}
