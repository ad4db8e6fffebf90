//! Entity stepping: the per-step finish/fetch cycle and the per-frame
//! interpolation between steps.
//!
//! Only `step_entity` (via `finish_move_instantly`) changes an entity's
//! cell, standing surface, fall height or lifecycle flags. `interpolate`
//! only moves the visual pose.

use glam::Vec2;

use crate::api::types::SimEvent;
use crate::components::effector::{EffectContext, EffectResult};
use crate::components::entity::{Entity, EntityState};
use crate::components::moves::EntityMove;
use crate::core::math::{angle_delta, wrap_angle};
use crate::core::world::World;
use crate::error::SimError;
use crate::extensions::easing::Easing;

/// Default number of candidate moves a fetch may reject before giving up.
pub const DEFAULT_MAX_FETCH_ATTEMPTS: u32 = 8;

/// Resolve one time step for a live entity: finish its current move, then
/// fetch the next one unless the entity died or reached its goal.
pub fn step_entity(
    entity: &mut Entity,
    world: &mut World,
    max_fetch_attempts: u32,
    events: &mut Vec<SimEvent>,
) -> Result<(), SimError> {
    let chained = finish_move_instantly(entity, world, events);
    if entity.state.is_terminal() {
        entity.requests.clear();
        return Ok(());
    }
    let next = fetch_move(entity, world, chained, max_fetch_attempts)?;
    entity.begin_move(next);
    Ok(())
}

/// Complete the current move at once: snap to its target, run exit and
/// enter effectors, apply fatality and update the grid state.
///
/// Returns the follow-up move chained by the finished move or one of its
/// effectors. Does nothing for an idle entity.
pub fn finish_move_instantly(
    entity: &mut Entity,
    world: &mut World,
    events: &mut Vec<SimEvent>,
) -> Option<EntityMove> {
    let mut mv = entity.current_move.take()?;
    let mut chain = mv.take_next();

    let target_cell = mv.target_cell(world);
    let entering = mv.effectors(world);
    let state = &mut entity.state;
    let previous_cell = state.cell;
    let was_alive = state.alive;
    let had_goal = state.goal_reached;

    state.position = mv.target_position();
    state.rotation = wrap_angle(mv.target_rotation());
    state.velocity = Vec2::ZERO;

    if target_cell != previous_cell {
        for id in world.effectors_for(previous_cell, state.standing_surface) {
            if let Some(mut effector) = world.effectors.take(id) {
                effector.on_entity_exit(state);
                world.effectors.restore(id, effector);
            }
        }
    }

    for id in entering {
        // Missing ids are effectors removed since the geometry was built.
        let Some(mut effector) = world.effectors.take(id) else {
            continue;
        };
        let result = {
            let mut ctx = EffectContext {
                entity: &mut *state,
                requests: &mut entity.requests,
                chain: &mut chain,
                cell: target_cell,
                world: &*world,
            };
            effector.on_entity_enter(&mut ctx)
        };
        world.effectors.restore(id, effector);
        if result == EffectResult::Acted {
            log::trace!("{} acted on {}", id, state.id);
            break;
        }
    }

    if mv.is_fatal() {
        state.alive = false;
    }
    state.cell = target_cell;
    state.standing_surface = mv.bound_surface().filter(|id| world.surfaces.contains(*id));
    state.fall_height = match state.standing_surface {
        Some(_) => 0,
        None => state.fall_height + 1,
    };

    if was_alive && !state.alive {
        log::debug!("{} died at {:?}", state.id, target_cell);
        events.push(SimEvent::Died { id: state.id, cell: target_cell });
    }
    if !had_goal && state.goal_reached {
        log::debug!("{} reached its goal at {:?}", state.id, target_cell);
        events.push(SimEvent::GoalReached { id: state.id, cell: target_cell });
    }
    chain
}

/// Pick the entity's next move.
///
/// Sources in order: the chained follow-up, the lowest-priority queued
/// request, then the brain. Candidates that would change nothing are
/// skipped; a brain repeating the same no-op move is taken at its word.
/// Whatever is still queued afterwards is discarded.
pub fn fetch_move(
    entity: &mut Entity,
    world: &World,
    chained: Option<EntityMove>,
    max_attempts: u32,
) -> Result<EntityMove, SimError> {
    let result = pick_move(entity, world, chained, max_attempts);
    entity.requests.clear();
    result
}

fn pick_move(
    entity: &mut Entity,
    world: &World,
    mut chained: Option<EntityMove>,
    max_attempts: u32,
) -> Result<EntityMove, SimError> {
    let mut last: Option<EntityMove> = None;
    for _ in 0..max_attempts.max(1) {
        let candidate = match chained.take() {
            Some(mv) => mv,
            None => match entity.requests.pop() {
                Some(request) => request.process(&entity.state, world)?,
                None => entity.brain.next_move(&entity.state, world),
            },
        };
        let repeated = last.as_ref() == Some(&candidate);
        if repeated || !is_noop(&candidate, &entity.state, world) {
            return Ok(candidate);
        }
        last = Some(candidate);
    }
    log::warn!(
        "{} produced {} no-op moves in a row, accepting the last one",
        entity.state.id,
        max_attempts
    );
    Ok(last.unwrap_or_else(|| EntityMove::hold(&entity.state)))
}

/// A move that is already reached and changes nothing else about the entity.
/// Being reached alone is not enough: a landing in place rebinds the surface.
fn is_noop(mv: &EntityMove, state: &EntityState, world: &World) -> bool {
    !mv.is_fatal()
        && mv.next_move().is_none()
        && mv.bound_surface() == state.standing_surface
        && mv.reached(state.position, state.rotation, world.grid.cell_scale())
}

/// Move the visual pose toward the current move's target.
///
/// `alpha` is the progress through the current time step. Displacement
/// along the target's up vector follows `vertical_snap_point`; the rest
/// follows the eased progress. Velocity is this frame's displacement over
/// `frame_dt`.
pub fn interpolate(entity: &mut Entity, alpha: f32, easing: Easing, frame_dt: f32) {
    let Some(mv) = entity.current_move.as_ref() else {
        entity.state.velocity = Vec2::ZERO;
        return;
    };
    let t = easing.apply(alpha);
    let origin = entity.move_origin;

    let delta = mv.target_position() - origin.position;
    let up = mv.up();
    let vertical = up * delta.dot(up);
    let lateral = delta - vertical;
    let vertical_t = 1.0 + (t - 1.0) * mv.vertical_snap_point();
    let position = origin.position + lateral * t + vertical * vertical_t;

    let turn = angle_delta(origin.rotation, mv.target_rotation());
    let rotation = wrap_angle(origin.rotation + turn * t);

    let state = &mut entity.state;
    state.velocity = if frame_dt > 0.0 {
        (position - state.position) / frame_dt
    } else {
        Vec2::ZERO
    };
    state.position = position;
    state.rotation = rotation;
}
