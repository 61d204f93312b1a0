use phys_step::{
    core::{BodyEventType, CollisionBehavior, CollisionEventType, IslandStats, PhysicsCommands},
    shapes::Circle,
    BodyHandle, Fixture, PhysicsBody, PhysicsWorld, StepConfig, Vec2,
};

use approx::assert_relative_eq;
use std::sync::{Arc, Mutex};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Adds a body with a single circle fixture and returns its handle.
fn circle_body(world: &mut PhysicsWorld, body: PhysicsBody, radius: f32) -> BodyHandle {
    let handle = world.add_body(body);
    world
        .create_fixture(handle, Fixture::new(Arc::new(Circle::new(radius))))
        .unwrap();
    handle
}

/// Installs an observer that records every solved island's stats.
fn record_islands(world: &mut PhysicsWorld) -> Arc<Mutex<Vec<IslandStats>>> {
    let stats = Arc::new(Mutex::new(Vec::new()));
    let sink = stats.clone();
    world.set_observer(Box::new(move |s| sink.lock().unwrap().push(*s)));
    stats
}

#[test]
fn test_config_validation_is_fatal_at_construction() {
    init();

    let mut config = StepConfig::default();
    config.velocity_iterations = 0;
    assert!(PhysicsWorld::with_config(config).is_err());

    let mut config = StepConfig::default();
    config.time_to_sleep = 0.0;
    assert!(PhysicsWorld::with_config(config).is_err());

    let mut config = StepConfig::default();
    config.velocity_threshold = -1.0;
    assert!(PhysicsWorld::with_config(config).is_err());

    assert!(PhysicsWorld::with_config(StepConfig::default()).is_ok());
}

#[test]
fn test_free_fall_under_gravity() {
    init();
    let mut world = PhysicsWorld::new();

    let handle = world.add_body(PhysicsBody::new_dynamic(Vec2::new(0.0, 10.0)));

    // Semi-implicit Euler: velocity first, then position with the new
    // velocity.
    let dt = 1.0 / 60.0;
    let mut expected_velocity = 0.0f32;
    let mut expected_position = 10.0f32;

    for _ in 0..60 {
        world.step(dt, false);

        expected_velocity -= 9.81 * dt;
        expected_position += expected_velocity * dt;

        let body = world.body(handle).unwrap();
        assert_relative_eq!(body.linear_velocity().y, expected_velocity, epsilon = 1e-3);
        assert_relative_eq!(body.position().y, expected_position, epsilon = 1e-3);
    }

    let moved = world.events().body_events_of_type(BodyEventType::Moved);
    assert!(moved.iter().any(|e| e.body == handle));
}

#[test]
fn test_static_bodies_never_move() {
    init();
    let mut world = PhysicsWorld::new();

    let handle = circle_body(&mut world, PhysicsBody::new_static(Vec2::new(3.0, 4.0)), 1.0);

    for _ in 0..60 {
        world.step(1.0 / 60.0, false);
    }

    let body = world.body(handle).unwrap();
    assert_eq!(body.position(), Vec2::new(3.0, 4.0));
    assert_eq!(body.linear_velocity(), Vec2::zeros());
    assert!(!body.is_awake());
}

#[test]
fn test_no_drift_without_forces() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let handle = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(1.0, 2.0)), 0.5);

    for _ in 0..100 {
        world.step(1.0 / 60.0, false);
    }

    let body = world.body(handle).unwrap();
    assert_eq!(body.position(), Vec2::new(1.0, 2.0));
    assert_eq!(body.linear_velocity(), Vec2::zeros());
    assert_eq!(body.angle(), 0.0);
}

#[test]
fn test_body_sleeps_after_time_threshold() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let handle = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);

    // Default time_to_sleep is 0.5s, so at dt = 0.1 the body crosses the
    // threshold on the fifth step and not before.
    let dt = 0.1;
    for _ in 0..4 {
        world.step(dt, false);
        assert!(world.body(handle).unwrap().is_awake());
    }

    world.step(dt, false);
    let body = world.body(handle).unwrap();
    assert!(!body.is_awake());
    assert_eq!(body.linear_velocity(), Vec2::zeros());

    let slept = world.events().body_events_of_type(BodyEventType::Sleep);
    assert!(slept.iter().any(|e| e.body == handle));
}

#[test]
fn test_moving_body_never_sleeps() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let handle = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);
    world
        .body_mut(handle)
        .unwrap()
        .set_linear_velocity(Vec2::new(1.0, 0.0));

    for _ in 0..20 {
        world.step(0.1, false);
        let body = world.body(handle).unwrap();
        assert!(body.is_awake());
        assert_eq!(body.sleep_time(), 0.0);
    }
}

#[test]
fn test_sleep_accounting_skipped_during_prediction() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let handle = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);

    // Ten prediction ticks cover the sleep threshold twice over, but a
    // speculative pass must leave sleep state untouched.
    for _ in 0..10 {
        world.step(0.1, true);
    }

    let body = world.body(handle).unwrap();
    assert!(body.is_awake());
    assert_eq!(body.sleep_time(), 0.0);
}

#[test]
fn test_zero_dt_prediction_step_is_identity() {
    init();
    let mut world = PhysicsWorld::new();

    let handle = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(2.0, 5.0)), 0.5);
    world
        .body_mut(handle)
        .unwrap()
        .set_linear_velocity(Vec2::new(3.0, -1.0));

    let before = {
        let body = world.body(handle).unwrap();
        (body.position(), body.angle(), body.linear_velocity(), body.sleep_time())
    };

    world.step(0.0, true);

    let body = world.body(handle).unwrap();
    assert_eq!(body.position(), before.0);
    assert_eq!(body.angle(), before.1);
    assert_eq!(body.linear_velocity(), before.2);
    assert_eq!(body.sleep_time(), before.3);
    assert!(body.is_awake());
}

#[test]
fn test_velocity_clamp_limits_translation() {
    init();
    let mut config = StepConfig::default();
    config.gravity = Vec2::zeros();
    config.max_lin_velocity = 5.0;
    let mut world = PhysicsWorld::with_config(config).unwrap();

    let handle = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);
    world
        .body_mut(handle)
        .unwrap()
        .set_linear_velocity(Vec2::new(1000.0, 0.0));

    let dt = 0.1;
    world.step(dt, false);

    let body = world.body(handle).unwrap();
    assert_relative_eq!(body.linear_velocity().x, 5.0, epsilon = 1e-5);
    assert!(body.position().x <= 5.0 * dt + 1e-5);
}

#[test]
fn test_head_on_collision_resolves() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    // Two equal circles already overlapping, closing at 2 m/s.
    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    let b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);
    world.body_mut(a).unwrap().set_linear_velocity(Vec2::new(1.0, 0.0));
    world.body_mut(b).unwrap().set_linear_velocity(Vec2::new(-1.0, 0.0));

    world.step(1.0 / 60.0, false);

    // Exactly one contact, solved inside a single two-body island.
    assert_eq!(world.contacts().contact_count(), 1);
    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].bodies, 2);
    assert_eq!(recorded[0].contacts, 1);

    // The impulse must have removed the approach velocity along the normal.
    let va = world.body(a).unwrap().linear_velocity();
    let vb = world.body(b).unwrap().linear_velocity();
    assert!((vb - va).x >= -1e-3);

    let begins: Vec<_> = world
        .events()
        .collision_events()
        .filter(|e| e.event_type == CollisionEventType::Begin)
        .collect();
    assert_eq!(begins.len(), 1);
    assert!(begins[0].hard);
    assert_relative_eq!(begins[0].normal.x, 1.0, epsilon = 1e-5);
}

#[test]
fn test_sensor_reports_touch_without_response() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.4, 0.0)), 0.5);
    world.body_mut(a).unwrap().set_linear_velocity(Vec2::new(1.0, 0.0));

    let b = world.add_body(PhysicsBody::new_dynamic(Vec2::new(0.4, 0.0)));
    world
        .create_fixture(b, Fixture::new_sensor(Arc::new(Circle::new(0.5))))
        .unwrap();

    world.step(1.0 / 60.0, false);

    // The touch is reported, flagged as non-hard.
    let begins: Vec<_> = world
        .events()
        .collision_events()
        .filter(|e| e.event_type == CollisionEventType::Begin)
        .collect();
    assert_eq!(begins.len(), 1);
    assert!(!begins[0].hard);

    // No impulse response, and the sensor contact never couples islands.
    let va = world.body(a).unwrap().linear_velocity();
    assert_relative_eq!(va.x, 1.0, epsilon = 1e-5);
    for island in stats.lock().unwrap().iter() {
        assert_eq!(island.bodies, 1);
        assert_eq!(island.contacts, 0);
    }
}

#[test]
fn test_disabled_contact_stops_coupling() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    let _a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    let _b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);

    world.step(1.0 / 60.0, false);
    assert_eq!(world.contacts().contact_count(), 1);

    let id = world.contacts().contacts().next().unwrap().0;
    assert!(world.set_contact_enabled(id, false));

    stats.lock().unwrap().clear();
    world.step(1.0 / 60.0, false);

    // The contact survives but no longer touches or couples islands.
    let contact = world.contacts().contact(id).unwrap();
    assert!(!contact.touching);
    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 2);
    for island in recorded.iter() {
        assert_eq!(island.bodies, 1);
        assert_eq!(island.contacts, 0);
    }
}

struct CountingBehavior {
    hits: Arc<Mutex<Vec<u32>>>,
}

impl CollisionBehavior for CountingBehavior {
    fn on_collide(
        &mut self,
        _ours: BodyHandle,
        _other: BodyHandle,
        _dt: f32,
        _commands: &mut PhysicsCommands,
    ) {
    }

    fn post_collide(&mut self, hit_count: u32, _dt: f32, _commands: &mut PhysicsCommands) {
        self.hits.lock().unwrap().push(hit_count);
    }
}

#[test]
fn test_collision_behavior_hit_counts() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    let _b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);

    let hits = Arc::new(Mutex::new(Vec::new()));
    world.add_behavior(a, Box::new(CountingBehavior { hits: hits.clone() }));

    world.step(1.0 / 60.0, false);

    // One touching contact on the body, so exactly one hit this tick.
    assert_eq!(*hits.lock().unwrap(), vec![1]);
}

#[test]
fn test_contact_never_attracts_without_warm_starting() {
    init();
    let mut config = StepConfig::default();
    config.gravity = Vec2::zeros();
    config.warm_starting = false;
    let mut world = PhysicsWorld::with_config(config).unwrap();

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    let b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);
    world.body_mut(a).unwrap().set_linear_velocity(Vec2::new(1.0, 0.0));
    world.body_mut(b).unwrap().set_linear_velocity(Vec2::new(-1.0, 0.0));

    // First tick resolves the approach and stores accumulated impulses on
    // the manifold.
    world.step(1.0 / 60.0, false);

    // Force the still-touching pair apart. A contact may only ever push, so
    // the separation velocity must survive the next solve untouched.
    world.body_mut(a).unwrap().set_linear_velocity(Vec2::new(-1.0, 0.0));
    world.body_mut(b).unwrap().set_linear_velocity(Vec2::new(1.0, 0.0));
    world.step(1.0 / 60.0, false);

    let va = world.body(a).unwrap().linear_velocity();
    let vb = world.body(b).unwrap().linear_velocity();
    assert!((vb - va).x >= 2.0 - 1e-3);
}

struct RemoveOtherBehavior;

impl CollisionBehavior for RemoveOtherBehavior {
    fn on_collide(
        &mut self,
        _ours: BodyHandle,
        other: BodyHandle,
        _dt: f32,
        commands: &mut PhysicsCommands,
    ) {
        commands.remove_body(other);
    }
}

#[test]
fn test_behavior_can_remove_other_body_mid_tick() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    let b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);
    world.add_behavior(a, Box::new(RemoveOtherBehavior));

    world.step(1.0 / 60.0, false);

    // The removal staged during pre-solve lands at the second checkpoint,
    // before islands are built.
    assert!(world.body(b).is_err());
    assert!(world.body(a).is_ok());
    assert_eq!(world.body_count(), 1);
    assert_eq!(world.contacts().contact_count(), 0);
}

#[test]
fn test_behaviors_dropped_with_removed_body() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);
    let b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(5.0, 0.0)), 0.5);
    let hits = Arc::new(Mutex::new(Vec::new()));
    world.add_behavior(a, Box::new(CountingBehavior { hits: hits.clone() }));
    world.add_behavior(b, Box::new(CountingBehavior { hits }));
    assert_eq!(world.behavior_count(), 2);

    // Immediate removal drops the body's behaviors with it.
    world.remove_body(a).unwrap();
    assert_eq!(world.behavior_count(), 1);

    // So does removal staged through the command queue.
    world.commands_mut().remove_body(b);
    world.step(1.0 / 60.0, false);
    assert_eq!(world.behavior_count(), 0);
}

#[test]
fn test_deferred_commands_apply_at_step_start() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);
    world.commands_mut().sleep(a);
    world.commands_mut().add_body(PhysicsBody::new_dynamic(Vec2::new(10.0, 0.0)));

    assert_eq!(world.body_count(), 1);
    assert!(world.body(a).unwrap().is_awake());

    world.step(1.0 / 60.0, false);

    assert_eq!(world.body_count(), 2);
    assert!(!world.body(a).unwrap().is_awake());

    world.commands_mut().wake(a);
    world.step(1.0 / 60.0, false);
    assert!(world.body(a).unwrap().is_awake());
}

#[test]
fn test_touch_wakes_sleeping_body() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());

    let sleeper = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);
    world.sleep_body(sleeper);

    let mover = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.9, 0.0)), 0.5);
    world
        .body_mut(mover)
        .unwrap()
        .set_linear_velocity(Vec2::new(-0.5, 0.0));

    world.step(1.0 / 60.0, false);

    assert!(world.body(sleeper).unwrap().is_awake());
    let woken = world.events().body_events_of_type(BodyEventType::Awake);
    assert!(woken.iter().any(|e| e.body == sleeper));
}

#[test]
fn test_body_lifecycle_events() {
    init();
    let mut world = PhysicsWorld::new();

    let handle = world.add_body(PhysicsBody::new_dynamic(Vec2::zeros()));
    let added = world.events().body_events_of_type(BodyEventType::Added);
    assert!(added.iter().any(|e| e.body == handle));

    world.remove_body(handle).unwrap();
    let removed = world.events().body_events_of_type(BodyEventType::Removed);
    assert!(removed.iter().any(|e| e.body == handle));
    assert_eq!(world.body_count(), 0);
}
