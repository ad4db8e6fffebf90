//! Obstacle placement: footprint validation and the obstacle index.
//!
//! Every mutation validates first and only touches the world when the
//! whole change is legal. Failures are ordinary `PlacementResult` values;
//! only an unknown obstacle id is a hard error.

use std::collections::HashMap;
use std::fmt;

use glam::{IVec2, Vec2};

use crate::api::types::ObstacleId;
use crate::components::obstacle::{Obstacle, ObstacleRecord};
use crate::core::flags::{PlacementFlags, SurfaceFlags};
use crate::core::grid::Cell;
use crate::core::world::World;
use crate::error::SimError;

/// Tolerance between an obstacle's up and the surface it requires.
pub const PLACEMENT_NORMAL_TOLERANCE_DEG: f32 = 30.0;

/// Outcome of a placement check or mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementResult {
    /// Legal. Pushes report the first obstacle they shoved aside.
    Success { displaced: Option<ObstacleId> },
    /// A footprint cell is taken by another obstacle.
    Conflict {
        obstacle: ObstacleId,
        other: ObstacleId,
        cell: Cell,
    },
    /// A footprint cell lies outside the grid.
    OutOfBounds { obstacle: ObstacleId, cell: Cell },
    /// The obstacle needs a surface under its anchor and there is none.
    MissingSurface {
        obstacle: ObstacleId,
        cell: Cell,
        normal: Vec2,
    },
    Compound(Vec<PlacementResult>),
    /// `cause` happened to another obstacle because `blamed` acted.
    SideEffect {
        blamed: ObstacleId,
        cause: Box<PlacementResult>,
    },
}

impl PlacementResult {
    pub fn success() -> Self {
        PlacementResult::Success { displaced: None }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PlacementResult::Success { .. })
    }

    /// Merge several results: all successes give a success carrying the
    /// first displaced obstacle, a single failure is returned as is, and
    /// several failures become a `Compound`.
    pub fn combine(results: impl IntoIterator<Item = PlacementResult>) -> Self {
        let mut displaced = None;
        let mut failures = Vec::new();
        for result in results {
            match result {
                PlacementResult::Success { displaced: d } => {
                    displaced = displaced.or(d);
                }
                failure => failures.push(failure),
            }
        }
        match failures.len() {
            0 => PlacementResult::Success { displaced },
            1 => failures.remove(0),
            _ => PlacementResult::Compound(failures),
        }
    }

    /// Attribute a failure to `other`.
    pub fn blame(self, other: ObstacleId) -> Self {
        if self.is_success() {
            return self;
        }
        PlacementResult::SideEffect {
            blamed: other,
            cause: Box::new(self),
        }
    }

    /// Obstacles implicated in the failure, deduplicated in first-seen order.
    pub fn problem_obstacles(&self) -> Vec<ObstacleId> {
        let mut out = Vec::new();
        self.collect_problems(&mut out);
        out
    }

    fn collect_problems(&self, out: &mut Vec<ObstacleId>) {
        let implicated = match self {
            PlacementResult::Success { .. } => vec![],
            PlacementResult::Conflict { obstacle, other, .. } => vec![*obstacle, *other],
            PlacementResult::OutOfBounds { obstacle, .. }
            | PlacementResult::MissingSurface { obstacle, .. } => vec![*obstacle],
            PlacementResult::SideEffect { blamed, .. } => vec![*blamed],
            PlacementResult::Compound(results) => {
                for result in results {
                    result.collect_problems(out);
                }
                return;
            }
        };
        for id in implicated {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }

    /// Human-readable explanation, one line per failure.
    pub fn reason(&self) -> String {
        match self {
            PlacementResult::Success { .. } => "placement is valid".to_string(),
            PlacementResult::Conflict { obstacle, other, cell } => {
                format!("{} overlaps {} at cell ({}, {})", obstacle, other, cell.x, cell.y)
            }
            PlacementResult::OutOfBounds { obstacle, cell } => {
                format!("{} leaves the grid at cell ({}, {})", obstacle, cell.x, cell.y)
            }
            PlacementResult::MissingSurface { obstacle, cell, normal } => format!(
                "{} needs a surface facing ({:.2}, {:.2}) at cell ({}, {})",
                obstacle, normal.x, normal.y, cell.x, cell.y
            ),
            PlacementResult::Compound(results) => results
                .iter()
                .map(PlacementResult::reason)
                .collect::<Vec<_>>()
                .join("\n"),
            PlacementResult::SideEffect { blamed, cause } => {
                format!("{} is blocked: {}", blamed, cause.reason())
            }
        }
    }
}

impl fmt::Display for PlacementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

/// A footprint cell already held by another obstacle.
#[derive(Debug, Clone, Copy)]
struct Overlap {
    other: ObstacleId,
    cell: Cell,
}

/// Placed obstacles and the cells they occupy.
#[derive(Debug, Default)]
pub struct ObstacleMap {
    obstacles: HashMap<ObstacleId, Obstacle>,
    occupancy: HashMap<Cell, ObstacleId>,
    next_id: u32,
}

impl ObstacleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.obstacles.contains_key(&id)
    }

    /// Obstacle occupying `cell`, if any.
    pub fn at(&self, cell: Cell) -> Option<ObstacleId> {
        self.occupancy.get(&cell).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObstacleId> + '_ {
        self.obstacles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Id the next placed obstacle will receive.
    pub fn peek_id(&self) -> ObstacleId {
        ObstacleId(self.next_id)
    }

    fn allocate_id(&mut self) -> ObstacleId {
        let id = ObstacleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn occupy(&mut self, id: ObstacleId, cells: &[Cell]) -> Result<(), Overlap> {
        for cell in cells {
            if let Some(other) = self.occupancy.get(cell) {
                if *other != id {
                    return Err(Overlap { other: *other, cell: *cell });
                }
            }
        }
        for cell in cells {
            self.occupancy.insert(*cell, id);
        }
        Ok(())
    }

    fn vacate(&mut self, id: ObstacleId, cells: &[Cell]) {
        for cell in cells {
            if self.occupancy.get(cell) == Some(&id) {
                self.occupancy.remove(cell);
            }
        }
    }
}

impl World {
    /// Whether `obstacle`, not yet placed, would fit at `cell` in its
    /// current orientation.
    pub fn check_placement(&self, obstacle: &Obstacle, cell: Cell) -> PlacementResult {
        let id = self.obstacles.peek_id();
        self.validate(id, obstacle, cell, obstacle.quarter_turns, &[])
    }

    /// Whether placed obstacle `id` could move its anchor to `cell`.
    pub fn can_be_placed(&self, id: ObstacleId, cell: Cell) -> Result<PlacementResult, SimError> {
        let obstacle = self.obstacle(id)?;
        Ok(self.validate(id, obstacle, cell, obstacle.quarter_turns, &[]))
    }

    pub fn obstacle(&self, id: ObstacleId) -> Result<&Obstacle, SimError> {
        self.obstacles.get(id).ok_or(SimError::UnknownObstacle(id))
    }

    fn validate(
        &self,
        id: ObstacleId,
        obstacle: &Obstacle,
        anchor: Cell,
        quarter_turns: u8,
        moving: &[ObstacleId],
    ) -> PlacementResult {
        let mut results = Vec::new();
        for cell in obstacle.cells_at(anchor, quarter_turns) {
            if !self.grid.contains(cell) {
                results.push(PlacementResult::OutOfBounds { obstacle: id, cell });
                continue;
            }
            if let Some(other) = self.obstacles.at(cell) {
                if other != id && !moving.contains(&other) {
                    results.push(PlacementResult::Conflict { obstacle: id, other, cell });
                }
            }
        }
        if obstacle.requirements.contains(PlacementFlags::REQUIRES_SURFACE) {
            if let Some(missing) = self.missing_support(id, obstacle, anchor, quarter_turns) {
                results.push(missing);
            }
        }
        PlacementResult::combine(results)
    }

    fn missing_support(
        &self,
        id: ObstacleId,
        obstacle: &Obstacle,
        anchor: Cell,
        quarter_turns: u8,
    ) -> Option<PlacementResult> {
        let up = Obstacle::up_for(quarter_turns);
        let own = &obstacle.registered;
        let support = self.surfaces.find_surface(
            anchor,
            up,
            PLACEMENT_NORMAL_TOLERANCE_DEG,
            SurfaceFlags::VIRTUAL,
            |s| !own.contains(&s.id),
        );
        match support {
            Some(_) => None,
            None => Some(PlacementResult::MissingSurface { obstacle: id, cell: anchor, normal: up }),
        }
    }

    /// Place a new obstacle with its anchor at `cell`.
    pub fn place_obstacle(&mut self, mut obstacle: Obstacle, cell: Cell) -> Result<ObstacleId, PlacementResult> {
        let result = self.check_placement(&obstacle, cell);
        if !result.is_success() {
            log::debug!("cannot place {:?}: {}", obstacle.tag, result);
            return Err(result);
        }
        let id = self.obstacles.allocate_id();
        obstacle.anchor = cell;
        self.install(id, obstacle).map_err(|overlap| PlacementResult::Conflict {
            obstacle: id,
            other: overlap.other,
            cell: overlap.cell,
        })?;
        Ok(id)
    }

    /// Move a placed obstacle's anchor to `cell`.
    pub fn move_obstacle(&mut self, id: ObstacleId, cell: Cell) -> Result<PlacementResult, SimError> {
        let quarter_turns = self.obstacle(id)?.quarter_turns;
        self.relocate_checked(id, cell, quarter_turns)
    }

    /// Rotate a placed obstacle about its anchor by `quarter_turns` × 90°
    /// counter-clockwise (negative turns clockwise).
    pub fn rotate_obstacle(&mut self, id: ObstacleId, quarter_turns: i32) -> Result<PlacementResult, SimError> {
        let obstacle = self.obstacle(id)?;
        let anchor = obstacle.anchor;
        let turns = (obstacle.quarter_turns as i32 + quarter_turns).rem_euclid(4) as u8;
        self.relocate_checked(id, anchor, turns)
    }

    fn relocate_checked(&mut self, id: ObstacleId, anchor: Cell, quarter_turns: u8) -> Result<PlacementResult, SimError> {
        let obstacle = self.obstacle(id)?;
        let result = self.validate(id, obstacle, anchor, quarter_turns, &[]);
        if result.is_success() {
            self.relocate(&[(id, anchor, quarter_turns)])?;
        }
        Ok(result)
    }

    /// Shove an obstacle by `delta`, displacing movable obstacles in the way
    /// along the same delta. Failures further down the chain are blamed on
    /// the obstacle that pushed into them.
    pub fn push_obstacle(&mut self, id: ObstacleId, delta: IVec2) -> Result<PlacementResult, SimError> {
        self.obstacle(id)?;
        let mut chain = Vec::new();
        let result = self.plan_push(id, delta, &mut chain);
        if !result.is_success() {
            return Ok(result);
        }
        let moves: Vec<(ObstacleId, Cell, u8)> = chain
            .iter()
            .filter_map(|pushed| {
                self.obstacles
                    .get(*pushed)
                    .map(|o| (*pushed, o.anchor + delta, o.quarter_turns))
            })
            .collect();
        self.relocate(&moves)?;
        Ok(PlacementResult::Success { displaced: chain.get(1).copied() })
    }

    fn plan_push(&self, id: ObstacleId, delta: IVec2, chain: &mut Vec<ObstacleId>) -> PlacementResult {
        chain.push(id);
        let Some(obstacle) = self.obstacles.get(id) else {
            return PlacementResult::success();
        };
        let anchor = obstacle.anchor + delta;
        let mut results = Vec::new();
        for cell in obstacle.cells_at(anchor, obstacle.quarter_turns) {
            if !self.grid.contains(cell) {
                results.push(PlacementResult::OutOfBounds { obstacle: id, cell });
                continue;
            }
            let Some(other) = self.obstacles.at(cell) else {
                continue;
            };
            if chain.contains(&other) {
                continue;
            }
            let movable = self.obstacles.get(other).is_some_and(|o| o.movable);
            if movable {
                results.push(self.plan_push(other, delta, chain).blame(id));
            } else {
                results.push(PlacementResult::Conflict { obstacle: id, other, cell });
            }
        }
        if obstacle.requirements.contains(PlacementFlags::REQUIRES_SURFACE) {
            if let Some(missing) = self.missing_support(id, obstacle, anchor, obstacle.quarter_turns) {
                results.push(missing);
            }
        }
        PlacementResult::combine(results)
    }

    /// Take an obstacle off the grid, deregistering its surfaces.
    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Result<Obstacle, SimError> {
        let mut obstacle = self
            .obstacles
            .obstacles
            .remove(&id)
            .ok_or(SimError::UnknownObstacle(id))?;
        self.obstacles.vacate(id, &obstacle.cells());
        for surface in obstacle.registered.drain(..) {
            self.surfaces.deregister(surface);
        }
        log::debug!("removed {}", id);
        Ok(obstacle)
    }

    /// Snapshot of every placed obstacle, ordered by id.
    pub fn obstacle_records(&self) -> Vec<ObstacleRecord> {
        let mut records: Vec<ObstacleRecord> = self
            .obstacles
            .obstacles
            .iter()
            .map(|(id, obstacle)| obstacle.record(*id))
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    fn install(&mut self, id: ObstacleId, mut obstacle: Obstacle) -> Result<(), Overlap> {
        self.obstacles.occupy(id, &obstacle.cells())?;
        obstacle.registered = obstacle
            .surfaces
            .iter()
            .map(|t| self.surfaces.register(t.instantiate(obstacle.anchor, obstacle.quarter_turns)))
            .collect();
        log::debug!(
            "placed {} {:?} at ({}, {})",
            id, obstacle.tag, obstacle.anchor.x, obstacle.anchor.y
        );
        self.obstacles.obstacles.insert(id, obstacle);
        Ok(())
    }

    /// Apply already-validated moves. Every obstacle is lifted (footprint
    /// and surfaces) before any is put down again.
    fn relocate(&mut self, moves: &[(ObstacleId, Cell, u8)]) -> Result<(), SimError> {
        let mut lifted = Vec::with_capacity(moves.len());
        for &(id, anchor, quarter_turns) in moves {
            let mut obstacle = self
                .obstacles
                .obstacles
                .remove(&id)
                .ok_or(SimError::UnknownObstacle(id))?;
            self.obstacles.vacate(id, &obstacle.cells());
            for surface in obstacle.registered.drain(..) {
                self.surfaces.deregister(surface);
            }
            obstacle.anchor = anchor;
            obstacle.quarter_turns = quarter_turns;
            lifted.push((id, obstacle));
        }
        for (id, obstacle) in lifted {
            self.install(id, obstacle)
                .map_err(|overlap| SimError::FootprintOverlap {
                    obstacle: id,
                    other: overlap.other,
                    cell: overlap.cell,
                })?;
        }
        Ok(())
    }
}
