use std::sync::Arc;

use crate::gfx::ShadingStage;

use super::entity::RenderableEntity;

/// Texture unit every entity binds its texture to.
pub const ENTITY_TEXTURE_UNIT: u32 = 0;

/// Ordered paint list.
///
/// Entities are painted in insertion order: earlier entries first, later entries on top.
/// Callers append back-to-front. No sorting, culling, or batching happens here; every
/// entity is drawn every frame.
#[derive(Debug, Default, Clone)]
pub struct SceneComposer {
    entities: Vec<Arc<RenderableEntity>>,
}

impl SceneComposer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity` to the end of the paint order.
    #[inline]
    pub fn append(&mut self, entity: Arc<RenderableEntity>) {
        self.entities.push(entity);
    }

    /// Entities in paint order.
    #[cfg(test)]
    pub(crate) fn entities(&self) -> &[Arc<RenderableEntity>] {
        &self.entities
    }

    /// Issues one indexed draw per entity, in paint order.
    pub fn draw_all<S>(&self, stage: &mut S)
    where
        S: ShadingStage + ?Sized,
    {
        for entity in &self.entities {
            let model = entity.model();

            stage.load_entity_offset(entity.draw_offset());
            stage.bind_vertex_array(model.geometry.vertex_array());
            stage.bind_texture(ENTITY_TEXTURE_UNIT, model.texture.id());
            stage.draw_indexed(model.geometry.index_count());
            stage.unbind();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceRegistry;
    use crate::scene::{build_entity, EntitySpec};
    use crate::testing::{MemoryImageLoader, RecordingBackend, StageEvent};

    fn build(
        reg: &mut ResourceRegistry,
        dev: &mut RecordingBackend,
        loader: &MemoryImageLoader,
        name: &str,
        x: f32,
    ) -> Arc<RenderableEntity> {
        let spec = EntitySpec::new(name, format!("{name}.png"), [x, 0.0, -1.0], 1.0, 1.0);
        Arc::new(build_entity(reg, dev, loader, &spec, None).unwrap())
    }

    #[test]
    fn draw_all_visits_entities_in_insertion_order() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();
        let names = ["e0", "e1", "e2", "e3", "e4"];
        let loader = names
            .iter()
            .fold(MemoryImageLoader::new(), |l, n| l.with_image(format!("{n}.png"), 1, 1));

        // Insert in a scrambled order; drawing must follow it exactly.
        let order = [3usize, 0, 4, 1, 2];
        let built: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, n)| build(&mut reg, &mut dev, &loader, n, i as f32))
            .collect();

        let mut scene = SceneComposer::new();
        for &i in &order {
            scene.append(Arc::clone(&built[i]));
        }

        dev.clear_events();
        scene.draw_all(&mut dev);

        let drawn: Vec<_> = dev.draw_sequence().into_iter().map(|d| d.texture).collect();
        let expected: Vec<_> = order.iter().map(|&i| built[i].model().texture.id()).collect();
        assert_eq!(drawn, expected);
        reg.release_all(&mut dev);
    }

    #[test]
    fn each_draw_binds_then_unbinds() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();
        let loader = MemoryImageLoader::new().with_image("only.png", 1, 1);
        let e = build(&mut reg, &mut dev, &loader, "only", 0.0);

        let mut scene = SceneComposer::new();
        scene.append(Arc::clone(&e));
        dev.clear_events();
        scene.draw_all(&mut dev);

        assert_eq!(
            dev.stage_events(),
            vec![
                StageEvent::Offset([0.0, 0.0, 0.0]),
                StageEvent::BindVertexArray(e.model().geometry.vertex_array()),
                StageEvent::BindTexture(ENTITY_TEXTURE_UNIT, e.model().texture.id()),
                StageEvent::DrawIndexed(6),
                StageEvent::Unbind,
            ]
        );
        reg.release_all(&mut dev);
    }

    #[test]
    fn duplicate_entries_are_drawn_each_time() {
        let mut dev = RecordingBackend::new();
        let mut reg = ResourceRegistry::new();
        let loader = MemoryImageLoader::new().with_image("dup.png", 1, 1);
        let e = build(&mut reg, &mut dev, &loader, "dup", 0.0);

        let mut scene = SceneComposer::new();
        scene.append(Arc::clone(&e));
        scene.append(Arc::clone(&e));
        dev.clear_events();
        scene.draw_all(&mut dev);

        assert_eq!(dev.draw_sequence().len(), 2);
        reg.release_all(&mut dev);
    }

    #[test]
    fn empty_scene_draws_nothing() {
        let mut dev = RecordingBackend::new();
        SceneComposer::new().draw_all(&mut dev);
        assert!(dev.stage_events().is_empty());
    }
}
