//! Effectors: behaviour triggered when an entity arrives in a cell or on a surface.
//!
//! Effectors live in the `EffectorStore`; surfaces and cells only hold their
//! ids, so a removed effector is simply skipped by later lookups.

use std::collections::HashMap;
use std::fmt;

use glam::IVec2;

use crate::api::types::EffectorId;
use crate::components::entity::EntityState;
use crate::components::moves::EntityMove;
use crate::components::requests::{MoveQueue, PushRequest};
use crate::core::flags::{EffectorFlags, MoveFlags};
use crate::core::grid::Cell;
use crate::core::world::World;

/// Whether an effector acted on the entity.
/// An effector that acted stops propagation to the remaining effectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectResult {
    Passed,
    Acted,
}

/// What an effector may touch while reacting to an arrival.
pub struct EffectContext<'a> {
    pub entity: &'a mut EntityState,
    /// The entity's pending move requests (drained on the next fetch).
    pub requests: &'a mut MoveQueue,
    /// Follow-up move for the move being finished. Takes precedence over
    /// queued requests and the brain on the next fetch.
    pub chain: &'a mut Option<EntityMove>,
    /// Cell the entity is arriving in.
    pub cell: Cell,
    pub world: &'a World,
}

impl EffectContext<'_> {
    pub fn chain_move(&mut self, next: EntityMove) {
        *self.chain = Some(next);
    }
}

pub trait Effector: fmt::Debug {
    /// Capabilities the motion resolver filters on.
    fn flags(&self) -> EffectorFlags {
        EffectorFlags::NONE
    }

    fn on_entity_enter(&mut self, ctx: &mut EffectContext<'_>) -> EffectResult;

    fn on_entity_exit(&mut self, _entity: &mut EntityState) {}

    /// Whether an entity may not step into `cell` right now.
    fn blocks_passage(&self, _cell: Cell, _world: &World) -> bool {
        false
    }
}

/// Owns every effector; geometry refers to them by id.
#[derive(Debug, Default)]
pub struct EffectorStore {
    effectors: HashMap<EffectorId, Box<dyn Effector>>,
    next_id: u32,
}

impl EffectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effector: impl Effector + 'static) -> EffectorId {
        self.insert(Box::new(effector))
    }

    pub fn insert(&mut self, effector: Box<dyn Effector>) -> EffectorId {
        let id = EffectorId(self.next_id);
        self.next_id += 1;
        self.effectors.insert(id, effector);
        id
    }

    pub fn remove(&mut self, id: EffectorId) -> Option<Box<dyn Effector>> {
        self.effectors.remove(&id)
    }

    pub fn get(&self, id: EffectorId) -> Option<&dyn Effector> {
        self.effectors.get(&id).map(|e| e.as_ref())
    }

    pub fn flags(&self, id: EffectorId) -> EffectorFlags {
        self.get(id).map(|e| e.flags()).unwrap_or(EffectorFlags::NONE)
    }

    /// Detach an effector while it runs against a `&World`.
    pub(crate) fn take(&mut self, id: EffectorId) -> Option<Box<dyn Effector>> {
        self.effectors.remove(&id)
    }

    pub(crate) fn restore(&mut self, id: EffectorId, effector: Box<dyn Effector>) {
        self.effectors.insert(id, effector);
    }

    pub fn len(&self) -> usize {
        self.effectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effectors.is_empty()
    }
}

// -- Built-in effectors --

/// Marks arriving entities as having reached their goal.
#[derive(Debug, Default)]
pub struct GoalEffector {
    pub arrivals: u32,
}

impl Effector for GoalEffector {
    fn on_entity_enter(&mut self, ctx: &mut EffectContext<'_>) -> EffectResult {
        if !ctx.entity.alive || ctx.entity.goal_reached {
            return EffectResult::Passed;
        }
        ctx.entity.goal_reached = true;
        self.arrivals += 1;
        EffectResult::Acted
    }
}

/// Kills whatever arrives.
#[derive(Debug, Default)]
pub struct HazardEffector;

impl Effector for HazardEffector {
    fn on_entity_enter(&mut self, ctx: &mut EffectContext<'_>) -> EffectResult {
        if !ctx.entity.alive {
            return EffectResult::Passed;
        }
        ctx.entity.alive = false;
        EffectResult::Acted
    }
}

/// Queues a push along `direction` for the next fetch.
#[derive(Debug, Clone)]
pub struct PushEffector {
    pub direction: IVec2,
    pub priority: i32,
}

impl PushEffector {
    pub fn new(direction: IVec2) -> Self {
        Self { direction, priority: 0 }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Effector for PushEffector {
    fn on_entity_enter(&mut self, ctx: &mut EffectContext<'_>) -> EffectResult {
        ctx.requests
            .push(PushRequest::new(self.direction).with_priority(self.priority));
        EffectResult::Acted
    }
}

/// Chains an ethereal jump to `destination`, landing on whatever surface
/// faces the entity's current up there.
#[derive(Debug, Clone)]
pub struct TeleportEffector {
    pub destination: Cell,
}

impl Effector for TeleportEffector {
    fn on_entity_enter(&mut self, ctx: &mut EffectContext<'_>) -> EffectResult {
        let grid = &ctx.world.grid;
        let destination = grid.clamp_cell(self.destination);
        let next = EntityMove::to_cell(grid, destination, ctx.entity.rotation)
            .with_flags(MoveFlags::ETHEREAL)
            .inferred(ctx.world);
        ctx.chain_move(next);
        EffectResult::Acted
    }
}

/// Refuses entry into its cell unless a solid surface is registered there.
#[derive(Debug, Default)]
pub struct RequireSurfaceEffector;

impl Effector for RequireSurfaceEffector {
    fn flags(&self) -> EffectorFlags {
        EffectorFlags::BLOCKING | EffectorFlags::REQUIRES_SURFACE
    }

    fn on_entity_enter(&mut self, _ctx: &mut EffectContext<'_>) -> EffectResult {
        EffectResult::Passed
    }

    fn blocks_passage(&self, cell: Cell, world: &World) -> bool {
        !world.surfaces.surfaces_at(cell).any(|s| s.is_solid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::surface::Surface;

    #[test]
    fn store_assigns_ids_and_removes() {
        let mut store = EffectorStore::new();
        let a = store.add(GoalEffector::default());
        let b = store.add(HazardEffector);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert!(store.remove(a).is_some());
        assert!(store.get(a).is_none());
        assert!(store.get(b).is_some());
    }

    #[test]
    fn take_and_restore_keep_id() {
        let mut store = EffectorStore::new();
        let id = store.add(RequireSurfaceEffector);
        let e = store.take(id).unwrap();
        assert!(store.is_empty());
        store.restore(id, e);
        assert!(store.flags(id).contains(EffectorFlags::BLOCKING));
        assert_eq!(store.flags(EffectorId(42)), EffectorFlags::NONE);
    }

    #[test]
    fn require_surface_blocks_bare_cells() {
        let mut world = World::new(crate::core::grid::Grid::new(4, 4, 1.0));
        let cell = IVec2::new(1, 1);
        let gate = RequireSurfaceEffector;
        assert!(gate.blocks_passage(cell, &world));
        world.surfaces.register(
            Surface::floor(cell).with_flags(crate::core::flags::SurfaceFlags::VIRTUAL),
        );
        assert!(gate.blocks_passage(cell, &world));
        world.surfaces.register(Surface::floor(cell));
        assert!(!gate.blocks_passage(cell, &world));
    }
}
