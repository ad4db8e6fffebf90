//! End-to-end step scenarios driven through `Simulation`.

use std::f32::consts::PI;

use glam::{IVec2, Vec2};
use wallwalk_engine::{
    Brain, Entity, EntityId, GoalEffector, HazardEffector, Obstacle, PoseBuffer, PushEffector,
    PushRequest, ScriptedBrain, SimConfig, SimEvent, Simulation, Surface, SurfaceId,
    SurfaceFlags, SurfaceTemplate, TeleportEffector, WalkerBrain,
};

fn sim() -> Simulation {
    Simulation::new(SimConfig {
        width: 10,
        height: 10,
        time_step: 0.5,
        ..Default::default()
    })
    .unwrap()
}

fn floors(sim: &mut Simulation, y: i32, xs: impl IntoIterator<Item = i32>) -> Vec<SurfaceId> {
    xs.into_iter()
        .map(|x| sim.world.surfaces.register(Surface::floor(IVec2::new(x, y))))
        .collect()
}

fn spawn_on(sim: &mut Simulation, surface: SurfaceId, brain: impl Brain + 'static) -> EntityId {
    let id = sim.next_entity_id();
    let grid = sim.grid().clone();
    let surface = sim.world.surfaces.get(surface).unwrap().clone();
    sim.spawn(Entity::new(id, brain).standing_on(&grid, &surface)).unwrap()
}

#[test]
fn stepping_off_a_ledge_starts_a_fall() {
    let mut sim = sim();
    let start = floors(&mut sim, 2, [2])[0];
    let id = spawn_on(&mut sim, start, ScriptedBrain::new([IVec2::X]));

    sim.handle_time_step().unwrap();
    let state = &sim.entity(id).unwrap().state;
    assert_eq!(state.cell, IVec2::new(3, 2));
    assert_eq!(state.standing_surface, None);
    assert_eq!(state.fall_height, 1);
}

#[test]
fn fall_height_tracks_support_every_step() {
    let mut sim = sim();
    let ground = floors(&mut sim, 4, [0, 1, 2, 3, 4]);
    floors(&mut sim, 1, [5, 6, 7]);
    let a = spawn_on(&mut sim, ground[0], WalkerBrain::default());
    spawn_on(&mut sim, ground[3], WalkerBrain::new(-1));

    let mut fell = false;
    for _ in 0..20 {
        sim.handle_time_step().unwrap();
        for entity in sim.scene.iter() {
            let s = &entity.state;
            if s.alive && !s.goal_reached {
                assert_eq!(s.fall_height == 0, s.standing_surface.is_some(), "{:?}", s);
            }
            if entity.id() == a && s.fall_height > 0 {
                fell = true;
            }
        }
    }
    assert!(fell);
}

#[test]
fn long_fall_is_fatal_unless_cushioned() {
    let mut sim = sim();
    let ledge = floors(&mut sim, 8, [1])[0];
    floors(&mut sim, 1, [2]);
    let soft = sim
        .world
        .surfaces
        .register(Surface::floor(IVec2::new(5, 1)).with_flags(SurfaceFlags::SUPPRESS_FALL));
    let high = sim.world.surfaces.register(Surface::floor(IVec2::new(4, 8)));

    let doomed = spawn_on(&mut sim, ledge, WalkerBrain::default());
    let lucky = spawn_on(&mut sim, high, WalkerBrain::default());
    // One step off the ledge, six in the air, then both land.
    for _ in 0..8 {
        sim.handle_time_step().unwrap();
    }
    let events: Vec<SimEvent> = sim.drain_events().collect();
    assert!(events.contains(&SimEvent::Died { id: doomed, cell: IVec2::new(2, 1) }));
    assert!(!events.iter().any(|e| matches!(e, SimEvent::Died { id, .. } if *id == lucky)));
    assert_eq!(sim.entity(lucky).unwrap().state.standing_surface, Some(soft));
}

#[test]
fn goal_is_reported_then_entity_destroyed() {
    let mut sim = sim();
    let path = floors(&mut sim, 2, [2, 3, 4, 5]);
    let goal = sim.world.effectors.add(GoalEffector::default());
    sim.world.surfaces.add_effector(IVec2::new(4, 2), goal);
    let id = spawn_on(&mut sim, path[0], WalkerBrain::default());

    sim.handle_time_step().unwrap();
    sim.handle_time_step().unwrap();
    assert!(sim.entity(id).unwrap().goal_reached());
    sim.handle_time_step().unwrap();
    assert!(sim.entity(id).is_none());

    let events: Vec<SimEvent> = sim.drain_events().collect();
    assert_eq!(
        events,
        vec![
            SimEvent::Spawned { id, cell: IVec2::new(2, 2) },
            SimEvent::GoalReached { id, cell: IVec2::new(4, 2) },
            SimEvent::Destroyed { id },
        ]
    );
}

#[test]
fn hazard_on_a_surface_kills() {
    let mut sim = sim();
    let hazard = sim.world.effectors.add(HazardEffector);
    let start = floors(&mut sim, 2, [2])[0];
    sim.world
        .surfaces
        .register(Surface::floor(IVec2::new(3, 2)).with_effector(hazard));
    let id = spawn_on(&mut sim, start, WalkerBrain::default());

    sim.handle_time_step().unwrap();
    assert!(!sim.entity(id).unwrap().is_alive());
    sim.handle_time_step().unwrap();
    assert!(sim.scene.is_empty());
}

#[test]
fn push_effector_launches_on_next_fetch() {
    let mut sim = sim();
    let pad = sim.world.effectors.add(PushEffector::new(IVec2::new(0, 2)));
    let path = floors(&mut sim, 2, [2, 3]);
    sim.world.surfaces.add_effector(IVec2::new(3, 2), pad);
    let id = spawn_on(&mut sim, path[0], WalkerBrain::default());

    sim.handle_time_step().unwrap();
    let entity = sim.entity(id).unwrap();
    let mv = entity.current_move().unwrap();
    assert_eq!(mv.target_cell(&sim.world), IVec2::new(3, 4));
    assert!(mv.bound_surface().is_none());
}

#[test]
fn oversized_push_stops_at_the_grid_edge() {
    let mut sim = sim();
    let start = floors(&mut sim, 2, [2])[0];
    let id = sim.next_entity_id();
    let grid = sim.grid().clone();
    let surface = sim.world.surfaces.get(start).unwrap().clone();
    let mut entity = Entity::new(id, WalkerBrain::default()).standing_on(&grid, &surface);
    entity.requests.push(PushRequest::new(IVec2::new(i32::MAX, 0)));
    sim.spawn(entity).unwrap();

    let mv = sim.entity(id).unwrap().current_move().unwrap();
    assert_eq!(mv.target_cell(&sim.world), IVec2::new(9, 2));
}

#[test]
fn teleport_chain_beats_queued_requests() {
    let mut sim = sim();
    let portal = sim.world.effectors.add(TeleportEffector { destination: IVec2::new(7, 6) });
    let path = floors(&mut sim, 2, [2, 3]);
    let exit = floors(&mut sim, 6, [7])[0];
    sim.world.surfaces.add_effector(IVec2::new(3, 2), portal);
    let id = spawn_on(&mut sim, path[0], WalkerBrain::default());
    sim.entity_mut(id)
        .unwrap()
        .requests
        .push(PushRequest::new(IVec2::NEG_X).with_priority(-10));

    sim.handle_time_step().unwrap();
    let entity = sim.entity(id).unwrap();
    let mv = entity.current_move().unwrap();
    assert!(mv.is_ethereal());
    assert_eq!(mv.bound_surface(), Some(exit));
    // The push lost out and was dropped with the rest of the queue.
    assert!(entity.requests.is_empty());

    sim.handle_time_step().unwrap();
    let state = &sim.entity(id).unwrap().state;
    assert_eq!(state.cell, IVec2::new(7, 6));
    assert_eq!(state.standing_surface, Some(exit));
}

#[test]
fn walker_climbs_the_wall_it_meets() {
    let mut sim = sim();
    let path = floors(&mut sim, 1, [1, 2, 3]);
    let wall: Vec<SurfaceId> = (1..=4)
        .map(|y| sim.world.surfaces.register(Surface::new(IVec2::new(3, y), Vec2::NEG_X)))
        .collect();
    let id = spawn_on(&mut sim, path[0], WalkerBrain::default());

    sim.handle_time_step().unwrap();
    sim.handle_time_step().unwrap();
    assert_eq!(sim.entity(id).unwrap().state.cell, IVec2::new(3, 1));

    sim.handle_time_step().unwrap();
    let state = &sim.entity(id).unwrap().state;
    assert_eq!(state.standing_surface, Some(wall[0]));
    assert!((state.rotation - PI * 0.5).abs() < 1e-4);
    assert!((state.up() - Vec2::NEG_X).length() < 1e-4);

    sim.handle_time_step().unwrap();
    let state = &sim.entity(id).unwrap().state;
    assert_eq!(state.cell, IVec2::new(3, 2));
    assert_eq!(state.standing_surface, Some(wall[1]));
}

#[test]
fn walker_scales_a_placed_block() {
    let mut sim = sim();
    let path = floors(&mut sim, 1, [1, 2]);
    let block = Obstacle::single()
        .with_tag("block")
        .with_surface(SurfaceTemplate::top(IVec2::ZERO))
        .with_surface(SurfaceTemplate::new(IVec2::NEG_X, Vec2::NEG_X));
    let placed = sim.world.place_obstacle(block, IVec2::new(3, 1)).unwrap();
    let top = sim.world.obstacle(placed).unwrap().registered_surfaces()[0];
    let id = spawn_on(&mut sim, path[0], WalkerBrain::default());

    for _ in 0..3 {
        sim.handle_time_step().unwrap();
    }
    let state = &sim.entity(id).unwrap().state;
    assert_eq!(state.cell, IVec2::new(3, 2));
    assert_eq!(state.standing_surface, Some(top));
    assert!(state.rotation.abs() < 1e-4);
}

#[test]
fn frames_drive_steps_and_poses() {
    let mut sim = sim();
    let path = floors(&mut sim, 2, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let id = spawn_on(&mut sim, path[0], WalkerBrain::default());

    let mut steps = 0;
    for _ in 0..16 {
        steps += sim.frame(0.125).unwrap();
    }
    assert_eq!(steps, 4);
    assert_eq!(sim.entity(id).unwrap().state.cell, IVec2::new(4, 2));

    let mut poses = PoseBuffer::new();
    sim.write_poses(&mut poses);
    assert_eq!(poses.instance_count(), 1);
    let pose = poses.instances[0];
    assert_eq!((pose.cell_x, pose.cell_y), (4.0, 2.0));
    assert!(pose.x >= 4.5 && pose.x <= 5.5);
    assert_eq!(pose.state, wallwalk_engine::bridge::pose::POSE_STANDING);
}
