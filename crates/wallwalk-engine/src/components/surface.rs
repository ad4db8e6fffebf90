use glam::Vec2;

use crate::api::types::{EffectorId, SurfaceId};
use crate::core::flags::SurfaceFlags;
use crate::core::grid::{Cell, Grid};
use crate::core::math::rotation_from_up;

/// An oriented standing plane bound to one cell.
///
/// A surface registered in cell `c` with normal `n` lines the side of `c`
/// facing `-n`: a floor (n = +Y) is the bottom of its cell, and an entity
/// standing on it occupies that same cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Assigned by the registry on registration.
    pub id: SurfaceId,
    /// Owning cell. Change it through `SurfaceRegistry::move_surface`.
    pub cell: Cell,
    /// Unit vector an entity's up points along while standing here.
    pub normal: Vec2,
    /// World-space correction from the cell center (thin walls, ledges).
    pub offset: Vec2,
    /// Lower wins when several surfaces match a lookup equally well.
    pub priority: i32,
    pub flags: SurfaceFlags,
    /// Effectors triggered by entities arriving on this surface.
    pub effectors: Vec<EffectorId>,
}

impl Surface {
    /// Create a surface at `cell` facing `normal`. The normal is normalized;
    /// a zero normal never matches a lookup.
    pub fn new(cell: Cell, normal: Vec2) -> Self {
        Self {
            id: SurfaceId(u32::MAX),
            cell,
            normal: normal.normalize_or_zero(),
            offset: Vec2::ZERO,
            priority: 0,
            flags: SurfaceFlags::NONE,
            effectors: Vec::new(),
        }
    }

    /// Floor surface (normal +Y).
    pub fn floor(cell: Cell) -> Self {
        Self::new(cell, Vec2::Y)
    }

    /// Ceiling surface (normal -Y).
    pub fn ceiling(cell: Cell) -> Self {
        Self::new(cell, Vec2::NEG_Y)
    }

    // -- Builder pattern --

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_flags(mut self, flags: SurfaceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_effector(mut self, effector: EffectorId) -> Self {
        self.effectors.push(effector);
        self
    }

    /// Where an entity standing on this surface rests.
    pub fn standing_position(&self, grid: &Grid) -> Vec2 {
        grid.cell_center(self.cell) + self.offset
    }

    /// Rotation of an entity standing on this surface.
    pub fn standing_rotation(&self) -> f32 {
        rotation_from_up(self.normal)
    }

    pub fn is_solid(&self) -> bool {
        !self.flags.contains(SurfaceFlags::VIRTUAL)
    }
}
