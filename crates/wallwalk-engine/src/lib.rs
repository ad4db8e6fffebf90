//! Grid movement and surface resolution for wall-walking entities.
//!
//! Entities live on an integer grid and stand on oriented surfaces (floors,
//! walls, ceilings). Each discrete time step finishes every entity's current
//! move, runs the effectors it lands on and fetches the next move from a
//! chained follow-up, a queued request or its brain. Frames in between only
//! interpolate poses for rendering.

pub mod api;
pub mod bridge;
pub mod components;
pub mod core;
pub mod error;
pub mod extensions;
pub mod systems;

// Re-export key types at crate root for convenience
pub use crate::api::sim::{SimConfig, Simulation};
pub use crate::api::types::{EffectorId, EntityId, ObstacleId, SimEvent, SurfaceId};
pub use crate::bridge::pose::{PoseBuffer, PoseInstance};
pub use crate::components::effector::{
    EffectContext, EffectResult, Effector, EffectorStore, GoalEffector, HazardEffector,
    PushEffector, RequireSurfaceEffector, TeleportEffector,
};
pub use crate::components::entity::{Entity, EntityState, Pose};
pub use crate::components::moves::EntityMove;
pub use crate::components::obstacle::{Obstacle, ObstacleRecord, SurfaceTemplate};
pub use crate::components::requests::{MoveQueue, MoveRequest, PushRequest};
pub use crate::components::surface::Surface;
pub use crate::core::flags::{EffectorFlags, MoveFlags, PlacementFlags, SurfaceFlags};
pub use crate::core::grid::{Cell, Grid};
pub use crate::core::scene::Scene;
pub use crate::core::time::FixedTimestep;
pub use crate::core::world::World;
pub use crate::error::SimError;
pub use crate::extensions::Easing;
pub use crate::systems::brain::{fatal_flags, Brain, IdleBrain, ScriptedBrain, WalkerBrain};
pub use crate::systems::motion::{limit_motion, Blocker, MotionLimit};
pub use crate::systems::placement::{ObstacleMap, PlacementResult};
pub use crate::systems::registry::SurfaceRegistry;
pub use crate::systems::stepping::{fetch_move, finish_move_instantly, interpolate};
