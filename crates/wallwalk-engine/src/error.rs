use glam::IVec2;
use thiserror::Error;

use crate::api::types::{EntityId, ObstacleId, SurfaceId};

/// Hard errors: a broken invariant or invalid setup, never an expected game state.
///
/// Blocked motion and failed placements are ordinary values (`MotionLimit`,
/// `PlacementResult`) and never surface here.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("{0} is not registered")]
    UnknownSurface(SurfaceId),
    #[error("{0} is not placed")]
    UnknownObstacle(ObstacleId),
    #[error("{0} is not in the scene")]
    UnknownEntity(EntityId),
    #[error("{0} is already in the scene")]
    DuplicateEntity(EntityId),
    #[error("move request for {0} cannot execute: entity is no longer alive")]
    DeadEntity(EntityId),
    #[error("{obstacle} footprint overlaps {other} at cell ({}, {})", cell.x, cell.y)]
    FootprintOverlap {
        obstacle: ObstacleId,
        other: ObstacleId,
        cell: IVec2,
    },
}
