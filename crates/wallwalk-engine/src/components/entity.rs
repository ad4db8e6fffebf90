use glam::Vec2;

use crate::api::types::{EntityId, SurfaceId};
use crate::components::moves::EntityMove;
use crate::components::requests::MoveQueue;
use crate::components::surface::Surface;
use crate::core::grid::{Cell, Grid};
use crate::core::math::up_from_rotation;
use crate::systems::brain::Brain;

/// Position and rotation of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec2,
    pub rotation: f32,
}

/// Grid-authoritative state of an entity, plus its visual pose.
///
/// Only the time step changes `cell`, `standing_surface`, `fall_height`,
/// `alive` and `goal_reached`; per-frame interpolation only touches
/// `position`, `rotation` and `velocity`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub id: EntityId,
    pub cell: Cell,
    pub position: Vec2,
    /// Rotation in radians; rotation 0 stands upright on a floor.
    pub rotation: f32,
    /// Derived from the last frame's positional delta.
    pub velocity: Vec2,
    /// None while falling.
    pub standing_surface: Option<SurfaceId>,
    /// Unsupported steps taken in a row.
    pub fall_height: u32,
    pub alive: bool,
    pub goal_reached: bool,
}

impl EntityState {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            cell: Cell::ZERO,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            standing_surface: None,
            fall_height: 0,
            alive: true,
            goal_reached: false,
        }
    }

    /// Place at the center of `cell`.
    pub fn at(mut self, grid: &Grid, cell: Cell, rotation: f32) -> Self {
        self.cell = grid.clamp_cell(cell);
        self.position = grid.cell_center(self.cell);
        self.rotation = rotation;
        self
    }

    /// Place on a surface's standing pose.
    pub fn on(mut self, grid: &Grid, surface: &Surface) -> Self {
        self.cell = surface.cell;
        self.position = surface.standing_position(grid);
        self.rotation = surface.standing_rotation();
        self.standing_surface = Some(surface.id);
        self.fall_height = 0;
        self
    }

    pub fn pose(&self) -> Pose {
        Pose { position: self.position, rotation: self.rotation }
    }

    pub fn up(&self) -> Vec2 {
        up_from_rotation(self.rotation)
    }

    pub fn is_falling(&self) -> bool {
        self.standing_surface.is_none()
    }

    /// Dead or finished: removed on the next resolution pass.
    pub fn is_terminal(&self) -> bool {
        !self.alive || self.goal_reached
    }
}

/// Grid-bound actor: state, the move it is executing, pending requests and
/// the brain that decides what to do when nothing else does.
#[derive(Debug)]
pub struct Entity {
    /// String tag for finding entities by name.
    pub tag: String,
    pub state: EntityState,
    /// None = idle, waiting for the next fetch.
    pub current_move: Option<EntityMove>,
    /// Pose the current move started from; interpolation runs from here.
    pub(crate) move_origin: Pose,
    pub requests: MoveQueue,
    pub(crate) brain: Box<dyn Brain>,
}

impl Entity {
    /// Create a new entity at the origin cell, driven by `brain`.
    pub fn new(id: EntityId, brain: impl Brain + 'static) -> Self {
        Self {
            tag: String::new(),
            state: EntityState::new(id),
            current_move: None,
            move_origin: Pose::default(),
            requests: MoveQueue::new(),
            brain: Box::new(brain),
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn at_cell(mut self, grid: &Grid, cell: Cell) -> Self {
        let rotation = self.state.rotation;
        self.state = self.state.at(grid, cell, rotation);
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.state.rotation = rotation;
        self
    }

    pub fn standing_on(mut self, grid: &Grid, surface: &Surface) -> Self {
        self.state = self.state.on(grid, surface);
        self
    }

    pub fn id(&self) -> EntityId {
        self.state.id
    }

    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    pub fn goal_reached(&self) -> bool {
        self.state.goal_reached
    }

    pub fn current_move(&self) -> Option<&EntityMove> {
        self.current_move.as_ref()
    }

    /// Start executing `mv` from the current pose.
    pub(crate) fn begin_move(&mut self, mv: EntityMove) {
        self.move_origin = self.state.pose();
        self.current_move = Some(mv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::brain::IdleBrain;
    use glam::IVec2;

    #[test]
    fn builder_places_entity() {
        let grid = Grid::new(8, 8, 1.0);
        let e = Entity::new(EntityId(3), IdleBrain)
            .with_tag("walker")
            .at_cell(&grid, IVec2::new(2, 5));
        assert_eq!(e.id(), EntityId(3));
        assert_eq!(e.tag, "walker");
        assert_eq!(e.state.cell, IVec2::new(2, 5));
        assert_eq!(e.state.position, Vec2::new(2.5, 5.5));
        assert!(e.state.is_falling());
        assert!(e.current_move().is_none());
    }

    #[test]
    fn standing_on_surface_adopts_pose() {
        let grid = Grid::new(8, 8, 1.0);
        let mut wall = Surface::new(IVec2::new(4, 4), Vec2::X);
        wall.id = SurfaceId(12);
        let e = Entity::new(EntityId(1), IdleBrain).standing_on(&grid, &wall);
        assert_eq!(e.state.standing_surface, Some(SurfaceId(12)));
        assert_eq!(e.state.cell, IVec2::new(4, 4));
        assert!((e.state.up() - Vec2::X).length() < 1e-5);
        assert!(!e.state.is_falling());
    }

    #[test]
    fn out_of_bounds_cells_clamp() {
        let grid = Grid::new(4, 4, 1.0);
        let s = EntityState::new(EntityId(0)).at(&grid, IVec2::new(9, -2), 0.0);
        assert_eq!(s.cell, IVec2::new(3, 0));
    }

    #[test]
    fn terminal_states() {
        let mut s = EntityState::new(EntityId(0));
        assert!(!s.is_terminal());
        s.goal_reached = true;
        assert!(s.is_terminal());
        s.goal_reached = false;
        s.alive = false;
        assert!(s.is_terminal());
    }
}
