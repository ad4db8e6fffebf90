use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::api::types::{ObstacleId, SurfaceId};
use crate::components::surface::Surface;
use crate::core::flags::{PlacementFlags, SurfaceFlags};
use crate::core::grid::Cell;
use crate::core::math::{quarter_turn, quarter_turn_radians, up_from_rotation};

/// A surface an obstacle carries with it, described relative to its anchor
/// in the obstacle's unrotated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceTemplate {
    pub offset: IVec2,
    pub normal: Vec2,
    pub flags: SurfaceFlags,
    pub priority: i32,
}

impl SurfaceTemplate {
    pub fn new(offset: IVec2, normal: Vec2) -> Self {
        Self {
            offset,
            normal,
            flags: SurfaceFlags::NONE,
            priority: 0,
        }
    }

    /// Floor lining the top of the footprint cell at `offset`.
    pub fn top(offset: IVec2) -> Self {
        Self::new(offset + IVec2::Y, Vec2::Y)
    }

    pub fn with_flags(mut self, flags: SurfaceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The concrete surface for an obstacle anchored at `anchor`.
    pub fn instantiate(&self, anchor: Cell, quarter_turns: u8) -> Surface {
        let normal = Vec2::from_angle(quarter_turn_radians(quarter_turns)).rotate(self.normal);
        Surface::new(anchor + quarter_turn(self.offset, quarter_turns), normal)
            .with_flags(self.flags)
            .with_priority(self.priority)
    }
}

/// A multi-cell object placed on the grid: crates, blocks, bridges.
///
/// The footprint is a set of cell offsets from the anchor, rotated by the
/// obstacle's orientation. Placed footprints never overlap.
#[derive(Debug, Clone)]
pub struct Obstacle {
    /// Name used in placement messages.
    pub tag: String,
    pub footprint: Vec<IVec2>,
    /// Whether pushes may displace it.
    pub movable: bool,
    pub requirements: PlacementFlags,
    pub surfaces: Vec<SurfaceTemplate>,
    pub(crate) anchor: Cell,
    pub(crate) quarter_turns: u8,
    /// Handles of the owned surfaces while placed.
    pub(crate) registered: Vec<SurfaceId>,
}

impl Obstacle {
    pub fn new(footprint: impl IntoIterator<Item = IVec2>) -> Self {
        let mut footprint: Vec<IVec2> = footprint.into_iter().collect();
        if footprint.is_empty() {
            footprint.push(IVec2::ZERO);
        }
        Self {
            tag: String::new(),
            footprint,
            movable: false,
            requirements: PlacementFlags::NONE,
            surfaces: Vec::new(),
            anchor: Cell::ZERO,
            quarter_turns: 0,
            registered: Vec::new(),
        }
    }

    /// One-cell obstacle.
    pub fn single() -> Self {
        Self::new([IVec2::ZERO])
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn movable(mut self) -> Self {
        self.movable = true;
        self
    }

    pub fn with_requirements(mut self, requirements: PlacementFlags) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_surface(mut self, template: SurfaceTemplate) -> Self {
        self.surfaces.push(template);
        self
    }

    pub fn with_quarter_turns(mut self, quarter_turns: u8) -> Self {
        self.quarter_turns = quarter_turns % 4;
        self
    }

    pub fn anchor(&self) -> Cell {
        self.anchor
    }

    pub fn quarter_turns(&self) -> u8 {
        self.quarter_turns
    }

    pub fn registered_surfaces(&self) -> &[SurfaceId] {
        &self.registered
    }

    /// Footprint cells for a hypothetical anchor and orientation.
    pub fn cells_at(&self, anchor: Cell, quarter_turns: u8) -> Vec<Cell> {
        self.footprint
            .iter()
            .map(|offset| anchor + quarter_turn(*offset, quarter_turns))
            .collect()
    }

    /// Footprint cells where the obstacle currently is.
    pub fn cells(&self) -> Vec<Cell> {
        self.cells_at(self.anchor, self.quarter_turns)
    }

    /// Up vector for an orientation.
    pub fn up_for(quarter_turns: u8) -> Vec2 {
        up_from_rotation(quarter_turn_radians(quarter_turns))
    }

    pub fn up(&self) -> Vec2 {
        Self::up_for(self.quarter_turns)
    }

    pub fn record(&self, id: ObstacleId) -> ObstacleRecord {
        ObstacleRecord {
            id,
            tag: self.tag.clone(),
            anchor: self.anchor,
            quarter_turns: self.quarter_turns,
            cells: self.cells(),
            movable: self.movable,
        }
    }
}

/// Serializable snapshot of a placed obstacle, for saving levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub id: ObstacleId,
    pub tag: String,
    pub anchor: IVec2,
    pub quarter_turns: u8,
    pub cells: Vec<IVec2>,
    pub movable: bool,
}
