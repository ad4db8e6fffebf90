use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::api::types::{EntityId, SimEvent};
use crate::bridge::pose::{PoseBuffer, PoseInstance};
use crate::components::entity::Entity;
use crate::core::grid::{Grid, MAX_GRID_CELLS, MAX_GRID_SIDE};
use crate::core::scene::Scene;
use crate::core::time::{FixedTimestep, DEFAULT_MAX_STEPS_PER_FRAME};
use crate::core::world::{World, DEFAULT_SAFE_FALL_HEIGHT};
use crate::error::SimError;
use crate::extensions::easing::Easing;
use crate::systems::stepping::{fetch_move, interpolate, step_entity, DEFAULT_MAX_FETCH_ATTEMPTS};

/// Configuration for a simulation, provided by the game.
///
/// Every field has a default, so a JSON config only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// World units per cell.
    pub cell_scale: f32,
    /// World position of the grid's bottom-left corner.
    pub origin: Vec2,
    /// Seconds per time step (default: 0.25).
    pub time_step: f32,
    /// Cap on time steps run in one frame (default: 10).
    pub max_steps_per_frame: u32,
    /// Candidate moves a fetch may skip before settling (default: 8).
    pub max_fetch_attempts: u32,
    /// Unsupported steps an entity survives falling (default: 3).
    pub safe_fall_height: u32,
    /// Cell delta unsupported walkers fall by each step.
    pub gravity: IVec2,
    /// Curve for visual interpolation between steps.
    pub easing: Easing,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 18,
            cell_scale: 1.0,
            origin: Vec2::ZERO,
            time_step: 0.25,
            max_steps_per_frame: DEFAULT_MAX_STEPS_PER_FRAME,
            max_fetch_attempts: DEFAULT_MAX_FETCH_ATTEMPTS,
            safe_fall_height: DEFAULT_SAFE_FALL_HEIGHT,
            gravity: IVec2::NEG_Y,
            easing: Easing::Linear,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_GRID_SIDE || self.height > MAX_GRID_SIDE {
            return Err(SimError::InvalidConfig(format!(
                "grid sides are limited to {}, got {}x{}",
                MAX_GRID_SIDE, self.width, self.height
            )));
        }
        if u64::from(self.width) * u64::from(self.height) > MAX_GRID_CELLS {
            return Err(SimError::InvalidConfig(format!(
                "grid of {}x{} exceeds {} cells",
                self.width, self.height, MAX_GRID_CELLS
            )));
        }
        if !(self.cell_scale.is_finite() && self.cell_scale > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "cell_scale must be positive, got {}",
                self.cell_scale
            )));
        }
        if !self.origin.is_finite() {
            return Err(SimError::InvalidConfig("origin must be finite".to_string()));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.max_steps_per_frame == 0 {
            return Err(SimError::InvalidConfig("max_steps_per_frame must be at least 1".to_string()));
        }
        if self.max_fetch_attempts == 0 {
            return Err(SimError::InvalidConfig("max_fetch_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Owns the world, the entities and the clock, and drives the step cycle.
pub struct Simulation {
    pub world: World,
    pub scene: Scene,
    clock: FixedTimestep,
    config: SimConfig,
    events: Vec<SimEvent>,
    next_id: u32,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height, config.cell_scale).with_origin(config.origin);
        let world = World::new(grid)
            .with_gravity(config.gravity)
            .with_safe_fall_height(config.safe_fall_height);
        let clock = FixedTimestep::new(config.time_step).with_max_steps(config.max_steps_per_frame);
        log::info!(
            "simulation ready: {}x{} cells, step {}s",
            config.width, config.height, config.time_step
        );
        Ok(Self {
            world,
            scene: Scene::new(),
            clock,
            config,
            events: Vec::new(),
            next_id: 1,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.world.grid
    }

    /// Generate the next unused entity ID.
    pub fn next_entity_id(&mut self) -> EntityId {
        loop {
            let id = EntityId(self.next_id);
            self.next_id += 1;
            if !self.scene.contains(id) {
                return id;
            }
        }
    }

    /// Add an entity and fetch its first move, so the next time step
    /// already executes it.
    pub fn spawn(&mut self, mut entity: Entity) -> Result<EntityId, SimError> {
        let id = entity.id();
        if self.scene.contains(id) {
            return Err(SimError::DuplicateEntity(id));
        }
        let first = fetch_move(&mut entity, &self.world, None, self.config.max_fetch_attempts)?;
        entity.begin_move(first);
        let cell = entity.state.cell;
        self.scene.spawn(entity);
        self.events.push(SimEvent::Spawned { id, cell });
        log::debug!("spawned {} at ({}, {})", id, cell.x, cell.y);
        Ok(id)
    }

    /// Remove an entity right away.
    pub fn despawn(&mut self, id: EntityId) -> Result<Entity, SimError> {
        let entity = self.scene.despawn(id).ok_or(SimError::UnknownEntity(id))?;
        self.events.push(SimEvent::Destroyed { id });
        Ok(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.scene.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.scene.get_mut(id)
    }

    /// Run one discrete step: destroy entities that died or finished on the
    /// previous step, then finish and refetch every remaining entity's move.
    ///
    /// An error stops the pass where it occurred. Entities earlier in spawn
    /// order have already advanced and later ones have not, so the step is
    /// left partially applied.
    pub fn handle_time_step(&mut self) -> Result<(), SimError> {
        for id in self.scene.despawn_terminal() {
            log::debug!("destroyed {}", id);
            self.events.push(SimEvent::Destroyed { id });
        }
        let max_attempts = self.config.max_fetch_attempts;
        for entity in self.scene.iter_mut() {
            step_entity(entity, &mut self.world, max_attempts, &mut self.events)?;
        }
        Ok(())
    }

    /// Advance by a frame of `dt` seconds: run the time steps that fell due,
    /// then interpolate every entity's pose. Returns the number of steps run.
    pub fn frame(&mut self, dt: f32) -> Result<u32, SimError> {
        let steps = self.clock.accumulate(dt);
        for _ in 0..steps {
            self.handle_time_step()?;
        }
        let alpha = self.clock.alpha();
        let easing = self.config.easing;
        for entity in self.scene.iter_mut() {
            interpolate(entity, alpha, easing, dt);
        }
        Ok(steps)
    }

    /// Progress through the current time step (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.clock.alpha()
    }

    /// Time steps run since creation.
    pub fn step_count(&self) -> u64 {
        self.clock.step_count()
    }

    /// Lifecycle events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SimEvent> {
        self.events.drain(..)
    }

    /// Write one pose per entity, in scene order.
    pub fn write_poses(&self, buffer: &mut PoseBuffer) {
        buffer.clear();
        for entity in self.scene.iter() {
            buffer.push(PoseInstance::from_state(&entity.state));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::surface::Surface;
    use crate::systems::brain::{IdleBrain, ScriptedBrain};

    fn small() -> SimConfig {
        SimConfig {
            width: 8,
            height: 8,
            time_step: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn config_from_partial_json() {
        let json = r#"{ "width": 12, "gravity": [1, 0], "easing": "smoothstep" }"#;
        let config = SimConfig::from_json(json).unwrap();
        assert_eq!(config.width, 12);
        assert_eq!(config.height, 18);
        assert_eq!(config.gravity, IVec2::X);
        assert_eq!(config.easing, Easing::Smoothstep);
    }

    #[test]
    fn config_errors() {
        assert!(matches!(SimConfig::from_json("{ nope"), Err(SimError::ConfigParse(_))));
        assert!(matches!(
            SimConfig::from_json(r#"{ "width": 0 }"#),
            Err(SimError::InvalidConfig(_))
        ));
        let bad = SimConfig { time_step: 0.0, ..Default::default() };
        assert!(Simulation::new(bad).is_err());
        let bad = SimConfig { cell_scale: f32::NAN, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn oversized_grids_are_rejected() {
        let wide = SimConfig { width: 3_000_000_000, ..small() };
        assert!(matches!(wide.validate(), Err(SimError::InvalidConfig(_))));
        assert!(Simulation::new(wide).is_err());

        let huge = SimConfig { width: 100_000, height: 100_000, ..small() };
        assert!(matches!(huge.validate(), Err(SimError::InvalidConfig(_))));

        let edge = SimConfig { width: MAX_GRID_SIDE, height: 1, ..small() };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn spawn_fetches_first_move() {
        let mut sim = Simulation::new(small()).unwrap();
        let id = sim.next_entity_id();
        let grid = sim.grid().clone();
        sim.spawn(Entity::new(id, ScriptedBrain::new([IVec2::X])).at_cell(&grid, IVec2::new(2, 2)))
            .unwrap();
        let mv = sim.entity(id).unwrap().current_move().unwrap();
        assert_eq!(mv.target_cell(&sim.world), IVec2::new(3, 2));
        assert_eq!(
            sim.drain_events().collect::<Vec<_>>(),
            vec![SimEvent::Spawned { id, cell: IVec2::new(2, 2) }]
        );
    }

    #[test]
    fn duplicate_and_unknown_entities() {
        let mut sim = Simulation::new(small()).unwrap();
        sim.spawn(Entity::new(EntityId(1), IdleBrain)).unwrap();
        assert!(matches!(
            sim.spawn(Entity::new(EntityId(1), IdleBrain)),
            Err(SimError::DuplicateEntity(EntityId(1)))
        ));
        // Ids handed out skip the one already in use.
        assert_eq!(sim.next_entity_id(), EntityId(2));
        assert!(sim.despawn(EntityId(1)).is_ok());
        assert!(matches!(sim.despawn(EntityId(1)), Err(SimError::UnknownEntity(_))));
    }

    #[test]
    fn frames_accumulate_into_steps() {
        let mut sim = Simulation::new(small()).unwrap();
        assert_eq!(sim.frame(0.2).unwrap(), 0);
        assert_eq!(sim.frame(0.2).unwrap(), 0);
        assert_eq!(sim.frame(0.2).unwrap(), 1);
        assert_eq!(sim.step_count(), 1);
        assert!((sim.alpha() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn frame_interpolates_between_steps() {
        let mut sim = Simulation::new(small()).unwrap();
        let floor = sim.world.surfaces.register(Surface::floor(IVec2::new(2, 2)));
        sim.world.surfaces.register(Surface::floor(IVec2::new(3, 2)));
        let surface = sim.world.surfaces.get(floor).unwrap().clone();
        let grid = sim.grid().clone();
        let id = sim
            .spawn(Entity::new(EntityId(5), ScriptedBrain::new([IVec2::X])).standing_on(&grid, &surface))
            .unwrap();

        sim.frame(0.25).unwrap();
        let e = sim.entity(id).unwrap();
        assert!((e.state.position - Vec2::new(3.0, 2.5)).length() < 1e-4);
        // Authoritative cell only changes on the step.
        assert_eq!(e.state.cell, IVec2::new(2, 2));

        let mut poses = PoseBuffer::new();
        sim.write_poses(&mut poses);
        assert_eq!(poses.instance_count(), 1);
        assert!((poses.instances[0].vx - 2.0).abs() < 1e-3);
    }
}
