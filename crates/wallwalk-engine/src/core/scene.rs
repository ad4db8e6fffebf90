use crate::api::types::EntityId;
use crate::components::entity::Entity;

/// The live entities, in spawn order.
///
/// Step resolution walks this order, so it is kept stable across removals.
/// Lookups are linear; levels hold tens of walkers, not thousands.
#[derive(Debug, Default)]
pub struct Scene {
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Take an entity out, keeping the others in order.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.entities.remove(index))
    }

    /// Drop every dead or finished entity; returns their ids in spawn order.
    pub fn despawn_terminal(&mut self) -> Vec<EntityId> {
        let (gone, kept): (Vec<Entity>, Vec<Entity>) = std::mem::take(&mut self.entities)
            .into_iter()
            .partition(|e| e.state.is_terminal());
        self.entities = kept;
        gone.iter().map(Entity::id).collect()
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.entities.iter_mut()
    }

    /// First entity carrying `tag`, in spawn order.
    pub fn find_by_tag(&self, tag: &str) -> Option<&Entity> {
        self.iter().find(|e| e.tag == tag)
    }

    pub fn find_all_by_tag(&self, tag: &str) -> Vec<&Entity> {
        self.iter().filter(|e| e.tag == tag).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Grid;
    use crate::systems::brain::IdleBrain;
    use glam::{IVec2, Vec2};

    fn walkers(n: u32) -> Scene {
        let mut scene = Scene::new();
        for i in 0..n {
            scene.spawn(Entity::new(EntityId(i), IdleBrain));
        }
        scene
    }

    #[test]
    fn lookup_by_id() {
        let grid = Grid::new(8, 8, 1.0);
        let mut scene = Scene::new();
        scene.spawn(Entity::new(EntityId(7), IdleBrain).at_cell(&grid, IVec2::new(1, 2)));
        assert_eq!(scene.get(EntityId(7)).unwrap().state.position, Vec2::new(1.5, 2.5));
        assert!(scene.contains(EntityId(7)));
        assert!(!scene.contains(EntityId(8)));

        scene.get_mut(EntityId(7)).unwrap().tag = "moved".into();
        assert_eq!(scene.find_by_tag("moved").unwrap().id(), EntityId(7));
    }

    #[test]
    fn despawn_keeps_order() {
        let mut scene = walkers(4);
        assert!(scene.despawn(EntityId(1)).is_some());
        assert!(scene.despawn(EntityId(1)).is_none());
        let ids: Vec<EntityId> = scene.iter().map(Entity::id).collect();
        assert_eq!(ids, vec![EntityId(0), EntityId(2), EntityId(3)]);
    }

    #[test]
    fn despawn_terminal_keeps_the_living() {
        let mut scene = walkers(4);
        scene.get_mut(EntityId(1)).unwrap().state.alive = false;
        scene.get_mut(EntityId(3)).unwrap().state.goal_reached = true;
        assert_eq!(scene.despawn_terminal(), vec![EntityId(1), EntityId(3)]);
        assert_eq!(scene.len(), 2);
        assert!(scene.despawn_terminal().is_empty());

        scene.clear();
        assert!(scene.is_empty());
    }

    #[test]
    fn tags_group_entities() {
        let mut scene = Scene::new();
        scene.spawn(Entity::new(EntityId(1), IdleBrain).with_tag("lead"));
        scene.spawn(Entity::new(EntityId(2), IdleBrain).with_tag("walker"));
        scene.spawn(Entity::new(EntityId(3), IdleBrain).with_tag("walker"));
        assert_eq!(scene.find_all_by_tag("walker").len(), 2);
        assert!(scene.find_by_tag("ghost").is_none());
    }
}
