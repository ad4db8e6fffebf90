//! Integer simulation grid.
//!
//! Cells are `IVec2` values used as lookup keys; the grid only knows bounds
//! and the world-space mapping. Cell (0, 0) sits at the bottom-left corner.

use glam::{IVec2, Vec2};

/// Discrete grid coordinate.
pub type Cell = IVec2;

/// Largest side length a grid can have; cell coordinates are `i32`.
pub const MAX_GRID_SIDE: u32 = i32::MAX as u32;

/// Largest total cell count a grid can have.
pub const MAX_GRID_CELLS: u64 = i32::MAX as u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: i32,
    height: i32,
    /// World units per cell.
    cell_scale: f32,
    /// World position of the grid's bottom-left corner.
    origin: Vec2,
}

impl Grid {
    /// Create a grid of `width × height` cells. Each side is clamped to
    /// `1..=MAX_GRID_SIDE`.
    pub fn new(width: u32, height: u32, cell_scale: f32) -> Self {
        Self {
            width: width.clamp(1, MAX_GRID_SIDE) as i32,
            height: height.clamp(1, MAX_GRID_SIDE) as i32,
            cell_scale,
            origin: Vec2::ZERO,
        }
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_scale(&self) -> f32 {
        self.cell_scale
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Whether `cell` lies inside `[0, width) × [0, height)`.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Clamp each axis of `cell` into bounds independently.
    pub fn clamp_cell(&self, cell: Cell) -> Cell {
        IVec2::new(
            cell.x.clamp(0, self.width - 1),
            cell.y.clamp(0, self.height - 1),
        )
    }

    /// The cell enclosing a world position. Positions outside the grid clamp
    /// to the nearest edge cell instead of failing.
    pub fn world_to_cell(&self, position: Vec2) -> Cell {
        let local = (position - self.origin) / self.cell_scale;
        self.clamp_cell(IVec2::new(local.x.floor() as i32, local.y.floor() as i32))
    }

    /// World position of a cell's center.
    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        self.origin + (cell.as_vec2() + Vec2::splat(0.5)) * self.cell_scale
    }

    /// World-space bounds of the grid (min, max).
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let size = Vec2::new(self.width as f32, self.height as f32) * self.cell_scale;
        (self.origin, self.origin + size)
    }

    /// Iterate every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| IVec2::new(x, y)))
    }

    /// Number of cells.
    pub fn capacity(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
