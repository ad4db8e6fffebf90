// core/world.rs
//
// The simulation context: everything a move, brain or placement check reads.
// Built explicitly and passed by reference; nothing here is global.

use glam::IVec2;

use crate::api::types::{EffectorId, SurfaceId};
use crate::components::effector::EffectorStore;
use crate::core::grid::{Cell, Grid};
use crate::systems::placement::ObstacleMap;
use crate::systems::registry::{push_unique, SurfaceRegistry};

/// Unsupported steps an entity may fall and still land safely.
pub const DEFAULT_SAFE_FALL_HEIGHT: u32 = 3;

#[derive(Debug)]
pub struct World {
    pub grid: Grid,
    pub surfaces: SurfaceRegistry,
    pub effectors: EffectorStore,
    pub obstacles: ObstacleMap,
    /// Cell delta an unsupported entity falls by each step.
    pub gravity: IVec2,
    /// Landing after this many (or more) unsupported steps is fatal unless
    /// the surface suppresses fall damage.
    pub safe_fall_height: u32,
}

impl World {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            surfaces: SurfaceRegistry::new(),
            effectors: EffectorStore::new(),
            obstacles: ObstacleMap::new(),
            gravity: IVec2::NEG_Y,
            safe_fall_height: DEFAULT_SAFE_FALL_HEIGHT,
        }
    }

    pub fn with_gravity(mut self, gravity: IVec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_safe_fall_height(mut self, height: u32) -> Self {
        self.safe_fall_height = height;
        self
    }

    /// Effectors relevant to an entity resting in `cell`, optionally on `surface`:
    /// the surface's own effectors first, then the cell's free-standing ones.
    pub fn effectors_for(&self, cell: Cell, surface: Option<SurfaceId>) -> Vec<EffectorId> {
        let mut out = Vec::new();
        if let Some(surface) = surface.and_then(|id| self.surfaces.get(id)) {
            push_unique(&mut out, &surface.effectors);
        }
        push_unique(&mut out, self.surfaces.free_effectors_at(cell));
        out
    }

    /// Every effector present in `cell`, bound or free-standing.
    pub fn effectors_in_cell(&self, cell: Cell) -> Vec<EffectorId> {
        self.surfaces.effectors_at(cell)
    }
}
