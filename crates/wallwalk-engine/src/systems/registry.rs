//! Surface registry: per-cell buckets of standing surfaces.
//!
//! Geometry owners (tiles, walls, obstacles) register a surface when it
//! appears and deregister it before registering a changed replacement.
//! Free-standing effectors are bucketed here too so one lookup answers
//! "what reacts in this cell".

use std::collections::HashMap;

use glam::Vec2;

use crate::api::types::{EffectorId, SurfaceId};
use crate::components::surface::Surface;
use crate::core::flags::SurfaceFlags;
use crate::core::grid::Cell;
use crate::core::math::angle_between_deg;
use crate::error::SimError;

/// Angular distances closer than this count as a tie.
const NORMAL_TIE_EPSILON_DEG: f32 = 1e-3;

#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<SurfaceId, Surface>,
    /// Registration order within a cell is kept for deterministic tie-breaks.
    by_cell: HashMap<Cell, Vec<SurfaceId>>,
    free_effectors: HashMap<Cell, Vec<EffectorId>>,
    next_id: u32,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface under its cell. Returns the assigned handle.
    pub fn register(&mut self, mut surface: Surface) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        surface.id = id;
        log::trace!(
            "register {} at ({}, {}) normal ({:.2}, {:.2})",
            id, surface.cell.x, surface.cell.y, surface.normal.x, surface.normal.y
        );
        self.by_cell.entry(surface.cell).or_default().push(id);
        self.surfaces.insert(id, surface);
        id
    }

    /// Remove a surface. Returns it so the owner can re-register an updated copy.
    pub fn deregister(&mut self, id: SurfaceId) -> Option<Surface> {
        let surface = self.surfaces.remove(&id)?;
        self.unbucket(surface.cell, id);
        log::trace!("deregister {}", id);
        Some(surface)
    }

    /// Reassign a surface to another cell, keeping its handle.
    pub fn move_surface(&mut self, id: SurfaceId, cell: Cell) -> Result<(), SimError> {
        let old = match self.surfaces.get_mut(&id) {
            Some(surface) => std::mem::replace(&mut surface.cell, cell),
            None => return Err(SimError::UnknownSurface(id)),
        };
        if old != cell {
            self.unbucket(old, id);
            self.by_cell.entry(cell).or_default().push(id);
        }
        Ok(())
    }

    fn unbucket(&mut self, cell: Cell, id: SurfaceId) {
        if let Some(bucket) = self.by_cell.get_mut(&cell) {
            bucket.retain(|s| *s != id);
            if bucket.is_empty() {
                self.by_cell.remove(&cell);
            }
        }
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    /// All surfaces registered at `cell`, in registration order.
    pub fn surfaces_at(&self, cell: Cell) -> impl Iterator<Item = &Surface> + '_ {
        self.by_cell
            .get(&cell)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.surfaces.get(id))
    }

    /// The surface at `cell` best matching `desired_normal`.
    ///
    /// Candidates must not carry any of `skip` and must lie within
    /// `max_normal_delta_deg` of the desired normal. The smallest angular
    /// distance wins; ties go to the lowest priority.
    pub fn get_surface(
        &self,
        cell: Cell,
        desired_normal: Vec2,
        max_normal_delta_deg: f32,
        skip: SurfaceFlags,
    ) -> Option<&Surface> {
        self.find_surface(cell, desired_normal, max_normal_delta_deg, skip, |_| true)
    }

    /// `get_surface` with an extra filter on candidates.
    pub fn find_surface(
        &self,
        cell: Cell,
        desired_normal: Vec2,
        max_normal_delta_deg: f32,
        skip: SurfaceFlags,
        mut accept: impl FnMut(&Surface) -> bool,
    ) -> Option<&Surface> {
        let mut best: Option<(&Surface, f32)> = None;
        for surface in self.surfaces_at(cell) {
            if surface.flags.intersects(skip) || !accept(surface) {
                continue;
            }
            let delta = angle_between_deg(surface.normal, desired_normal);
            if delta > max_normal_delta_deg {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, current_delta)) => {
                    if (delta - current_delta).abs() <= NORMAL_TIE_EPSILON_DEG {
                        surface.priority < current.priority
                    } else {
                        delta < current_delta
                    }
                }
            };
            if better {
                best = Some((surface, delta));
            }
        }
        best.map(|(surface, _)| surface)
    }

    /// Add a free-standing effector to a cell.
    pub fn add_effector(&mut self, cell: Cell, effector: EffectorId) {
        let bucket = self.free_effectors.entry(cell).or_default();
        if !bucket.contains(&effector) {
            bucket.push(effector);
        }
    }

    /// Remove a free-standing effector. Returns whether it was present.
    pub fn remove_effector(&mut self, cell: Cell, effector: EffectorId) -> bool {
        let Some(bucket) = self.free_effectors.get_mut(&cell) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|e| *e != effector);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            self.free_effectors.remove(&cell);
        }
        removed
    }

    /// Free-standing effectors registered directly in `cell`.
    pub fn free_effectors_at(&self, cell: Cell) -> &[EffectorId] {
        self.free_effectors.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Effectors bound to every surface at `cell` plus the free-standing ones,
    /// deduplicated in first-seen order.
    pub fn effectors_at(&self, cell: Cell) -> Vec<EffectorId> {
        let mut out = Vec::new();
        for surface in self.surfaces_at(cell) {
            push_unique(&mut out, &surface.effectors);
        }
        push_unique(&mut out, self.free_effectors_at(cell));
        out
    }

    /// Number of registered surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

pub(crate) fn push_unique(out: &mut Vec<EffectorId>, ids: &[EffectorId]) {
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    const C: IVec2 = IVec2::new(2, 3);

    #[test]
    fn register_and_deregister() {
        let mut reg = SurfaceRegistry::new();
        let id = reg.register(Surface::floor(C));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(id).unwrap().id, id);
        assert_eq!(reg.surfaces_at(C).count(), 1);

        let removed = reg.deregister(id).unwrap();
        assert_eq!(removed.cell, C);
        assert!(reg.is_empty());
        assert_eq!(reg.surfaces_at(C).count(), 0);
        assert!(reg.deregister(id).is_none());
    }

    #[test]
    fn move_surface_keeps_bucket_in_sync() {
        let mut reg = SurfaceRegistry::new();
        let id = reg.register(Surface::floor(C));
        let target = IVec2::new(5, 5);
        reg.move_surface(id, target).unwrap();
        assert_eq!(reg.get(id).unwrap().cell, target);
        assert_eq!(reg.surfaces_at(C).count(), 0);
        assert_eq!(reg.surfaces_at(target).next().unwrap().id, id);
        assert!(matches!(
            reg.move_surface(SurfaceId(99), target),
            Err(SimError::UnknownSurface(SurfaceId(99)))
        ));
    }

    #[test]
    fn closest_normal_wins() {
        let mut reg = SurfaceRegistry::new();
        let floor = reg.register(Surface::floor(C));
        let wall = reg.register(Surface::new(C, Vec2::NEG_X));
        let tilted = Vec2::new(-1.0, 0.4);
        assert_eq!(reg.get_surface(C, tilted, 60.0, SurfaceFlags::NONE).unwrap().id, wall);
        assert_eq!(reg.get_surface(C, Vec2::Y, 60.0, SurfaceFlags::NONE).unwrap().id, floor);
    }

    #[test]
    fn priority_breaks_ties() {
        let mut reg = SurfaceRegistry::new();
        reg.register(Surface::floor(C).with_priority(5));
        let preferred = reg.register(Surface::floor(C).with_priority(-1));
        reg.register(Surface::floor(C).with_priority(3));
        let got = reg.get_surface(C, Vec2::Y, 60.0, SurfaceFlags::NONE).unwrap();
        assert_eq!(got.id, preferred);
    }

    #[test]
    fn skip_flags_and_threshold_exclude_candidates() {
        let mut reg = SurfaceRegistry::new();
        reg.register(Surface::floor(C).with_flags(SurfaceFlags::VIRTUAL));
        let ramp = reg.register(Surface::new(C, Vec2::new(1.0, 1.0)));
        let got = reg.get_surface(C, Vec2::Y, 60.0, SurfaceFlags::VIRTUAL).unwrap();
        assert_eq!(got.id, ramp);
        assert!(reg.get_surface(C, Vec2::Y, 30.0, SurfaceFlags::VIRTUAL).is_none());
        assert!(reg.get_surface(IVec2::ZERO, Vec2::Y, 60.0, SurfaceFlags::NONE).is_none());
    }

    #[test]
    fn find_surface_applies_filter() {
        let mut reg = SurfaceRegistry::new();
        let own = reg.register(Surface::floor(C));
        let other = reg.register(Surface::floor(C).with_priority(1));
        let got = reg.find_surface(C, Vec2::Y, 30.0, SurfaceFlags::NONE, |s| s.id != own);
        assert_eq!(got.unwrap().id, other);
    }

    #[test]
    fn effectors_union_surfaces_and_free_standing() {
        let mut reg = SurfaceRegistry::new();
        reg.register(Surface::floor(C).with_effector(EffectorId(1)).with_effector(EffectorId(2)));
        reg.register(Surface::new(C, Vec2::X).with_effector(EffectorId(2)));
        reg.add_effector(C, EffectorId(3));
        reg.add_effector(C, EffectorId(1));
        assert_eq!(reg.effectors_at(C), vec![EffectorId(1), EffectorId(2), EffectorId(3)]);

        assert!(reg.remove_effector(C, EffectorId(3)));
        assert!(!reg.remove_effector(C, EffectorId(3)));
        assert_eq!(reg.effectors_at(C), vec![EffectorId(1), EffectorId(2)]);
    }
}
