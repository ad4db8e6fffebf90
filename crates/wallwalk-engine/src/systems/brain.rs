//! Brains: decide what an entity does when nothing else asks it to move.
//!
//! A brain is consulted last during a fetch, after chained moves and queued
//! requests, and always produces a move (a hold when it has nothing to do).

use std::collections::VecDeque;
use std::fmt;

use glam::{IVec2, Vec2};

use crate::components::entity::EntityState;
use crate::components::moves::EntityMove;
use crate::components::surface::Surface;
use crate::core::flags::{EffectorFlags, MoveFlags, SurfaceFlags};
use crate::core::math::{forward_from_up, rotation_from_up, to_cell_delta, DEFAULT_MAX_NORMAL_DELTA_DEG};
use crate::core::world::World;
use crate::systems::motion::{limit_motion, Blocker};

pub trait Brain: fmt::Debug {
    fn next_move(&mut self, entity: &EntityState, world: &World) -> EntityMove;
}

/// Flags for a move that ends on `surface`.
///
/// Fatal surfaces always kill. Landing after a long fall kills unless the
/// surface suppresses fall damage; a move that ends unsupported never does.
pub fn fatal_flags(surface: Option<&Surface>, falling: bool) -> MoveFlags {
    match surface {
        Some(s) if s.flags.contains(SurfaceFlags::FATAL) => MoveFlags::FATAL,
        Some(s) if falling && !s.flags.contains(SurfaceFlags::SUPPRESS_FALL) => MoveFlags::FATAL,
        _ => MoveFlags::NONE,
    }
}

/// Whether landing now counts as the end of a long fall.
pub fn is_long_fall(entity: &EntityState, world: &World) -> bool {
    entity.fall_height >= world.safe_fall_height
}

/// Move `entity` by `delta` as far as the geometry allows, keeping its
/// rotation and binding whatever surface faces its up at the destination.
pub fn step_move(entity: &EntityState, world: &World, delta: IVec2) -> EntityMove {
    let limited = limit_motion(
        world,
        delta,
        entity.cell,
        entity.up(),
        SurfaceFlags::VIRTUAL,
        EffectorFlags::BLOCKING,
    );
    let target = entity.cell + limited.motion;
    let mv = EntityMove::to_cell(&world.grid, target, entity.rotation).inferred(world);
    let surface = mv.bound_surface().and_then(|id| world.surfaces.get(id));
    let flags = fatal_flags(surface, is_long_fall(entity, world));
    mv.with_flags(flags)
}

/// Never moves.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleBrain;

impl Brain for IdleBrain {
    fn next_move(&mut self, entity: &EntityState, _world: &World) -> EntityMove {
        EntityMove::hold(entity)
    }
}

/// Plays back a fixed list of relative cell steps, then holds.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBrain {
    steps: VecDeque<IVec2>,
    looping: bool,
}

impl ScriptedBrain {
    pub fn new(steps: impl IntoIterator<Item = IVec2>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            looping: false,
        }
    }

    /// Replay the steps forever instead of holding at the end.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Brain for ScriptedBrain {
    fn next_move(&mut self, entity: &EntityState, world: &World) -> EntityMove {
        let Some(delta) = self.steps.pop_front() else {
            return EntityMove::hold(entity);
        };
        if self.looping {
            self.steps.push_back(delta);
        }
        step_move(entity, world, delta)
    }
}

/// Lemming-style walker: follows the surface it stands on in its facing
/// direction, climbs walls it runs into, wraps around outside corners,
/// turns around at dead ends and falls with world gravity when unsupported.
#[derive(Debug, Clone, Copy)]
pub struct WalkerBrain {
    /// +1 or -1: which way along the surface tangent the walker heads.
    pub facing: i32,
}

impl Default for WalkerBrain {
    fn default() -> Self {
        Self { facing: 1 }
    }
}

impl WalkerBrain {
    pub fn new(facing: i32) -> Self {
        Self {
            facing: if facing < 0 { -1 } else { 1 },
        }
    }

    fn fall(&self, entity: &EntityState, world: &World) -> EntityMove {
        let gravity = world.gravity;
        if gravity == IVec2::ZERO {
            return EntityMove::hold(entity);
        }
        let landing_normal = -gravity.as_vec2();
        let long_fall = is_long_fall(entity, world);

        let limited = limit_motion(
            world,
            gravity,
            entity.cell,
            entity.up(),
            SurfaceFlags::VIRTUAL,
            EffectorFlags::BLOCKING,
        );
        match limited.blocker {
            // Something solid lines the bottom of this very cell.
            Some(Blocker::Surface(id)) if limited.motion == IVec2::ZERO => {
                if let Some(floor) = world.surfaces.get(id) {
                    return land(entity, world, floor, long_fall);
                }
                EntityMove::hold(entity)
            }
            Some(Blocker::Bounds) if limited.motion == IVec2::ZERO => {
                log::debug!("{} fell out of the grid at {:?}", entity.id, entity.cell);
                EntityMove::hold(entity).with_flags(MoveFlags::FATAL)
            }
            _ if limited.motion == IVec2::ZERO => EntityMove::hold(entity),
            _ => {
                let dest = entity.cell + limited.motion;
                match world.surfaces.get_surface(
                    dest,
                    landing_normal,
                    DEFAULT_MAX_NORMAL_DELTA_DEG,
                    SurfaceFlags::VIRTUAL,
                ) {
                    Some(floor) => land(entity, world, floor, long_fall).with_vertical_snap_point(0.5),
                    None => EntityMove::to_cell(&world.grid, dest, rotation_from_up(landing_normal)),
                }
            }
        }
    }

    fn walk(&mut self, entity: &EntityState, world: &World, surface: &Surface) -> EntityMove {
        let up = surface.normal;
        let forward = forward_from_up(up, self.facing);
        let f = walker_forward(up, self.facing);
        let u = to_cell_delta(up);

        let limited = limit_motion(
            world,
            f,
            entity.cell,
            up,
            SurfaceFlags::VIRTUAL,
            EffectorFlags::BLOCKING,
        );
        if limited.motion != f {
            let wall = match limited.blocker {
                Some(Blocker::Surface(id)) if limited.motion == IVec2::ZERO => world.surfaces.get(id),
                _ => None,
            };
            if let Some(wall) = wall {
                log::trace!("{} climbs {}", entity.id, wall.id);
                return EntityMove::onto_surface(&world.grid, wall)
                    .with_flags(fatal_flags(Some(wall), false));
            }
            self.facing = -self.facing;
            log::trace!("{} turns around at {:?}", entity.id, entity.cell);
            return EntityMove::hold(entity);
        }

        let dest = entity.cell + f;
        if let Some(next) = world.surfaces.get_surface(
            dest,
            up,
            DEFAULT_MAX_NORMAL_DELTA_DEG,
            SurfaceFlags::VIRTUAL,
        ) {
            return EntityMove::onto_surface(&world.grid, next)
                .with_flags(fatal_flags(Some(next), false));
        }

        // Outside corner: the face of the block we were standing on.
        let wrap = f - u;
        let around = limit_motion(
            world,
            wrap,
            entity.cell,
            up,
            SurfaceFlags::VIRTUAL,
            EffectorFlags::BLOCKING,
        );
        if around.motion == wrap {
            if let Some(face) = world.surfaces.get_surface(
                entity.cell + wrap,
                forward,
                DEFAULT_MAX_NORMAL_DELTA_DEG,
                SurfaceFlags::VIRTUAL,
            ) {
                return EntityMove::onto_surface(&world.grid, face)
                    .with_flags(fatal_flags(Some(face), false));
            }
        }

        EntityMove::to_cell(&world.grid, dest, entity.rotation)
    }
}

fn land(entity: &EntityState, world: &World, floor: &Surface, long_fall: bool) -> EntityMove {
    let rotation = if floor.flags.contains(SurfaceFlags::IGNORE_ROTATION_ON_LANDING) {
        entity.rotation
    } else {
        floor.standing_rotation()
    };
    EntityMove::new(floor.standing_position(&world.grid), rotation)
        .with_surface(floor.id)
        .with_flags(fatal_flags(Some(floor), long_fall))
}

impl Brain for WalkerBrain {
    fn next_move(&mut self, entity: &EntityState, world: &World) -> EntityMove {
        match entity.standing_surface.and_then(|id| world.surfaces.get(id)) {
            Some(surface) => self.walk(entity, world, surface),
            None => self.fall(entity, world),
        }
    }
}

/// Cell delta a walker facing `facing` heads along on a surface facing `up`.
pub fn walker_forward(up: Vec2, facing: i32) -> IVec2 {
    to_cell_delta(forward_from_up(up, facing))
}
