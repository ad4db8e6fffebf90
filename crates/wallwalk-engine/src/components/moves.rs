use glam::Vec2;

use crate::api::types::{EffectorId, SurfaceId};
use crate::components::entity::EntityState;
use crate::components::surface::Surface;
use crate::core::flags::{EffectorFlags, MoveFlags, SurfaceFlags};
use crate::core::grid::{Cell, Grid};
use crate::core::math::{angle_delta, up_from_rotation, DEFAULT_MAX_NORMAL_DELTA_DEG};
use crate::core::world::World;
use crate::systems::motion::limit_motion;

/// Position tolerance for `reached`, as a fraction of the cell scale.
pub const REACH_POSITION_EPSILON: f32 = 0.025;
/// Rotation tolerance for `reached`, in degrees.
pub const REACH_ROTATION_EPSILON_DEG: f32 = 2.5;

/// A resolved move: where the entity ends up, how it is oriented, and what it
/// stands on afterwards.
///
/// Built with the `with_*` methods, then handed to an entity which executes
/// it on the next time step and discards it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMove {
    target_position: Vec2,
    target_rotation: f32,
    bound_surface: Option<SurfaceId>,
    flags: MoveFlags,
    /// 0 = already at the final height, 1 = approaches it with the rest of the move.
    vertical_snap_point: f32,
    next_move: Option<Box<EntityMove>>,
}

impl EntityMove {
    pub fn new(target_position: Vec2, target_rotation: f32) -> Self {
        Self {
            target_position,
            target_rotation,
            bound_surface: None,
            flags: MoveFlags::NONE,
            vertical_snap_point: 1.0,
            next_move: None,
        }
    }

    /// Move to the center of `cell` with the given rotation, unbound.
    pub fn to_cell(grid: &Grid, cell: Cell, rotation: f32) -> Self {
        Self::new(grid.cell_center(cell), rotation)
    }

    /// Move onto a surface's standing pose, bound to it.
    pub fn onto_surface(grid: &Grid, surface: &Surface) -> Self {
        Self::new(surface.standing_position(grid), surface.standing_rotation())
            .with_surface(surface.id)
    }

    /// Stay where the entity is, on whatever it stands on.
    pub fn hold(entity: &EntityState) -> Self {
        let mv = Self::new(entity.position, entity.rotation);
        match entity.standing_surface {
            Some(surface) => mv.with_surface(surface),
            None => mv,
        }
    }

    // -- Builder pattern --

    pub fn with_surface(mut self, surface: SurfaceId) -> Self {
        self.bound_surface = Some(surface);
        self
    }

    pub fn with_flags(mut self, flags: MoveFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_vertical_snap_point(mut self, snap: f32) -> Self {
        self.vertical_snap_point = snap.clamp(0.0, 1.0);
        self
    }

    pub fn with_next(mut self, next: EntityMove) -> Self {
        self.next_move = Some(Box::new(next));
        self
    }

    /// `infer_surface` with the default tolerance, skipping virtual surfaces
    /// and snapping to the found surface.
    pub fn inferred(mut self, world: &World) -> Self {
        self.infer_surface(world, DEFAULT_MAX_NORMAL_DELTA_DEG, SurfaceFlags::VIRTUAL, true);
        self
    }

    /// Bind the surface at the target cell facing this move's up vector.
    ///
    /// When `adjust_pose` is set the target pose snaps to the surface's
    /// standing pose. Returns the bound surface, if one was found.
    pub fn infer_surface(
        &mut self,
        world: &World,
        max_normal_delta_deg: f32,
        skip_wall_flags: SurfaceFlags,
        adjust_pose: bool,
    ) -> Option<SurfaceId> {
        let cell = self.target_cell(world);
        let surface =
            world
                .surfaces
                .get_surface(cell, self.up(), max_normal_delta_deg, skip_wall_flags)?;
        self.bound_surface = Some(surface.id);
        if adjust_pose {
            self.target_position = surface.standing_position(&world.grid);
            self.target_rotation = surface.standing_rotation();
        }
        Some(surface.id)
    }

    // -- Accessors --

    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    pub fn target_rotation(&self) -> f32 {
        self.target_rotation
    }

    pub fn bound_surface(&self) -> Option<SurfaceId> {
        self.bound_surface
    }

    pub fn flags(&self) -> MoveFlags {
        self.flags
    }

    pub fn is_fatal(&self) -> bool {
        self.flags.contains(MoveFlags::FATAL)
    }

    pub fn is_ethereal(&self) -> bool {
        self.flags.contains(MoveFlags::ETHEREAL)
    }

    pub fn vertical_snap_point(&self) -> f32 {
        self.vertical_snap_point
    }

    pub fn next_move(&self) -> Option<&EntityMove> {
        self.next_move.as_deref()
    }

    pub fn take_next(&mut self) -> Option<EntityMove> {
        self.next_move.take().map(|next| *next)
    }

    /// Up vector at the target rotation.
    pub fn up(&self) -> Vec2 {
        up_from_rotation(self.target_rotation)
    }

    /// The bound surface's cell if it is still registered, otherwise the
    /// cell under the target position.
    pub fn target_cell(&self, world: &World) -> Cell {
        self.bound_surface
            .and_then(|id| world.surfaces.get(id))
            .map(|surface| surface.cell)
            .unwrap_or_else(|| world.grid.world_to_cell(self.target_position))
    }

    /// Whether nothing blocks the way from `source` to the target cell.
    /// Ethereal moves skip the check.
    pub fn is_move_valid(&self, source: Cell, world: &World) -> bool {
        if self.is_ethereal() {
            return true;
        }
        let raw = self.target_cell(world) - source;
        let limited = limit_motion(
            world,
            raw,
            source,
            self.up(),
            SurfaceFlags::VIRTUAL,
            EffectorFlags::BLOCKING,
        );
        limited.motion == raw
    }

    /// Whether a pose is close enough to the target to count as arrived.
    pub fn reached(&self, position: Vec2, rotation: f32, cell_scale: f32) -> bool {
        let close = position.distance(self.target_position) <= REACH_POSITION_EPSILON * cell_scale;
        let aligned = angle_delta(rotation, self.target_rotation).abs().to_degrees()
            <= REACH_ROTATION_EPSILON_DEG;
        close && aligned
    }

    /// Effectors triggered when this move finishes: the bound surface's,
    /// then the free-standing ones at the target cell.
    pub fn effectors(&self, world: &World) -> Vec<EffectorId> {
        world.effectors_for(self.target_cell(world), self.bound_surface)
    }
}
