//! Motion resolver.
//!
//! Walls are checked on a 4-connected grid: any motion is walked as unit
//! orthogonal steps, the whole first axis before the second. Which axis goes
//! first is decided by the bisector of the entity's up vector and the motion
//! direction, so an entity wrapping around a convex corner steps along its
//! surface before dropping past the edge.

use glam::{IVec2, Vec2};

use crate::api::types::{EffectorId, SurfaceId};
use crate::core::flags::{EffectorFlags, SurfaceFlags};
use crate::core::grid::Cell;
use crate::core::world::World;

/// A wall blocks a step when its normal lies within this angle of the
/// reversed step direction.
pub const WALL_NORMAL_TOLERANCE_DEG: f32 = 45.0;

/// Bisector components closer than this are a tie.
const AXIS_TIE_EPSILON: f32 = 1e-4;

/// What stopped a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    /// A wall in the source cell of the blocked step.
    Surface(SurfaceId),
    /// An effector in the destination cell refusing passage.
    Effector(EffectorId),
    /// The step would leave the grid.
    Bounds,
}

/// The motion actually possible and what cut it short, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionLimit {
    pub motion: IVec2,
    pub blocker: Option<Blocker>,
}

impl MotionLimit {
    pub fn is_blocked(&self) -> bool {
        self.blocker.is_some()
    }

    pub fn blocking_surface(&self) -> Option<SurfaceId> {
        match self.blocker {
            Some(Blocker::Surface(id)) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Which axis a motion travels first.
///
/// Single-axis motions are trivial. For diagonals the bisector of `up` and
/// the motion's sign direction picks the dominant axis; an exact tie goes to
/// X. Using the sign direction (not the raw magnitude) keeps the choice
/// stable for any prefix of the same motion.
pub fn first_axis(raw: IVec2, up: Vec2) -> Axis {
    if raw.x == 0 {
        return Axis::Y;
    }
    if raw.y == 0 {
        return Axis::X;
    }
    let direction = raw.signum().as_vec2().normalize();
    let bisector = up.normalize_or_zero() + direction;
    let (bx, by) = (bisector.x.abs(), bisector.y.abs());
    if by > bx + AXIS_TIE_EPSILON {
        Axis::Y
    } else {
        Axis::X
    }
}

/// Unit steps making up `raw`, in travel order. Lazy: a caller that stops
/// at the first blocker never walks the rest of an oversized motion.
pub fn step_sequence(raw: IVec2, up: Vec2) -> impl Iterator<Item = IVec2> {
    let x_steps = std::iter::repeat(IVec2::new(raw.x.signum(), 0)).take(raw.x.unsigned_abs() as usize);
    let y_steps = std::iter::repeat(IVec2::new(0, raw.y.signum())).take(raw.y.unsigned_abs() as usize);
    match first_axis(raw, up) {
        Axis::X => x_steps.chain(y_steps),
        Axis::Y => y_steps.chain(x_steps),
    }
}

/// Limit `raw` motion from `source` to what the geometry allows.
///
/// Walls carrying any of `skip_wall_flags` are ignored; only effectors
/// advertising one of `relevant_effector_flags` are consulted. Calling this
/// again with the returned motion returns it unchanged.
pub fn limit_motion(
    world: &World,
    raw: IVec2,
    source: Cell,
    up: Vec2,
    skip_wall_flags: SurfaceFlags,
    relevant_effector_flags: EffectorFlags,
) -> MotionLimit {
    if raw == IVec2::ZERO {
        return MotionLimit { motion: IVec2::ZERO, blocker: None };
    }

    let mut cell = source;
    let mut travelled = IVec2::ZERO;
    for step in step_sequence(raw, up) {
        if let Some(blocker) =
            step_blocker(world, cell, step, skip_wall_flags, relevant_effector_flags)
        {
            return MotionLimit { motion: travelled, blocker: Some(blocker) };
        }
        cell += step;
        travelled += step;
    }
    MotionLimit { motion: travelled, blocker: None }
}

fn step_blocker(
    world: &World,
    from: Cell,
    step: IVec2,
    skip_wall_flags: SurfaceFlags,
    relevant_effector_flags: EffectorFlags,
) -> Option<Blocker> {
    let to = from + step;
    if !world.grid.contains(to) {
        return Some(Blocker::Bounds);
    }

    if let Some(wall) = world.surfaces.get_surface(
        from,
        -step.as_vec2(),
        WALL_NORMAL_TOLERANCE_DEG,
        skip_wall_flags,
    ) {
        return Some(Blocker::Surface(wall.id));
    }

    if relevant_effector_flags.is_empty() {
        return None;
    }
    world
        .effectors_in_cell(to)
        .into_iter()
        .find(|id| {
            world.effectors.get(*id).is_some_and(|e| {
                e.flags().intersects(relevant_effector_flags) && e.blocks_passage(to, world)
            })
        })
        .map(Blocker::Effector)
}
