use std::fmt;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Handle to a surface registered in the surface registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// Handle to an effector owned by the effector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectorId(pub u32);

/// Handle to an obstacle placed in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity #{}", self.0)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface #{}", self.0)
    }
}

impl fmt::Display for EffectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effector #{}", self.0)
    }
}

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obstacle #{}", self.0)
    }
}

/// Lifecycle signal emitted by the simulation for the rendering/animation layer.
/// Drained once per frame via `Simulation::drain_events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Entity entered the simulation at the given cell.
    Spawned { id: EntityId, cell: IVec2 },
    /// Entity was killed while finishing a move into `cell`.
    Died { id: EntityId, cell: IVec2 },
    /// Entity reached a goal at `cell`.
    GoalReached { id: EntityId, cell: IVec2 },
    /// Entity was removed from the scene (one step after dying or finishing).
    Destroyed { id: EntityId },
}

impl SimEvent {
    pub fn entity(&self) -> EntityId {
        match *self {
            SimEvent::Spawned { id, .. }
            | SimEvent::Died { id, .. }
            | SimEvent::GoalReached { id, .. }
            | SimEvent::Destroyed { id } => id,
        }
    }
}
