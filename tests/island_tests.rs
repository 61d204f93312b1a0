use phys_step::{
    core::{IslandStats, Joint, SolverContext},
    shapes::Circle,
    BodyHandle, Fixture, PhysicsBody, PhysicsWorld, Vec2,
};

use std::sync::{Arc, Mutex};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn circle_body(world: &mut PhysicsWorld, body: PhysicsBody, radius: f32) -> BodyHandle {
    let handle = world.add_body(body);
    world
        .create_fixture(handle, Fixture::new(Arc::new(Circle::new(radius))))
        .unwrap();
    handle
}

fn record_islands(world: &mut PhysicsWorld) -> Arc<Mutex<Vec<IslandStats>>> {
    let stats = Arc::new(Mutex::new(Vec::new()));
    let sink = stats.clone();
    world.set_observer(Box::new(move |s| sink.lock().unwrap().push(*s)));
    stats
}

/// A do-nothing joint used to verify island coupling through the joint graph.
struct LinkJoint {
    a: BodyHandle,
    b: BodyHandle,
}

impl Joint for LinkJoint {
    fn body_a(&self) -> BodyHandle {
        self.a
    }

    fn body_b(&self) -> BodyHandle {
        self.b
    }

    fn init_velocity_constraints(&mut self, _ctx: &mut SolverContext) {}

    fn solve_velocity(&mut self, _ctx: &mut SolverContext) {}

    fn solve_position(&mut self, _ctx: &mut SolverContext) -> bool {
        true
    }
}

#[test]
fn test_isolated_bodies_form_singleton_islands() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    for i in 0..3 {
        circle_body(
            &mut world,
            PhysicsBody::new_dynamic(Vec2::new(i as f32 * 10.0, 0.0)),
            0.5,
        );
    }

    world.step(1.0 / 60.0, false);

    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 3);
    for island in recorded.iter() {
        assert_eq!(island.bodies, 1);
        assert_eq!(island.contacts, 0);
        assert_eq!(island.joints, 0);
    }
}

#[test]
fn test_touching_bodies_share_island() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    // An overlapping pair plus a loner well out of range.
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(20.0, 0.0)), 0.5);

    world.step(1.0 / 60.0, false);

    let mut sizes: Vec<usize> = stats.lock().unwrap().iter().map(|s| s.bodies).collect();
    sizes.sort();
    assert_eq!(sizes, vec![1, 2]);

    let pair = stats
        .lock()
        .unwrap()
        .iter()
        .find(|s| s.bodies == 2)
        .copied()
        .unwrap();
    assert_eq!(pair.contacts, 1);
}

#[test]
fn test_contact_chain_forms_single_island() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    // A-B and B-C overlap; A-C do not. The fill must still reach C from A.
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.0, 0.0)), 0.5);
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.9, 0.0)), 0.5);
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(1.8, 0.0)), 0.5);

    world.step(1.0 / 60.0, false);

    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].bodies, 3);
    assert_eq!(recorded[0].contacts, 2);
}

#[test]
fn test_static_body_shared_across_islands() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    // Two dynamic bodies rest on the same static body but not on each other.
    // The static leaf must appear in both islands without merging them.
    circle_body(&mut world, PhysicsBody::new_static(Vec2::zeros()), 2.0);
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-2.2, 0.0)), 0.5);
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(2.2, 0.0)), 0.5);

    world.step(1.0 / 60.0, false);

    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 2);
    for island in recorded.iter() {
        assert_eq!(island.bodies, 2);
        assert_eq!(island.contacts, 1);
    }
}

#[test]
fn test_static_bodies_never_seed_islands() {
    init();
    let mut world = PhysicsWorld::new();
    let stats = record_islands(&mut world);

    circle_body(&mut world, PhysicsBody::new_static(Vec2::zeros()), 1.0);
    circle_body(&mut world, PhysicsBody::new_static(Vec2::new(1.0, 0.0)), 1.0);

    world.step(1.0 / 60.0, false);

    assert!(stats.lock().unwrap().is_empty());
}

#[test]
fn test_non_collidable_body_excluded_from_islands() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    let b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);
    world.body_mut(b).unwrap().set_can_collide(false);

    world.step(1.0 / 60.0, false);

    // No contact forms, and the opted-out body never seeds nor joins an
    // island.
    assert_eq!(world.contacts().contact_count(), 0);
    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].bodies, 1);
    drop(recorded);

    // The collidable body still simulates normally.
    assert!(world.body(a).unwrap().is_awake());
}

#[test]
fn test_joint_couples_separate_bodies() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);
    let b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(10.0, 0.0)), 0.5);
    world.add_joint(Box::new(LinkJoint { a, b }));

    world.step(1.0 / 60.0, false);

    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].bodies, 2);
    assert_eq!(recorded[0].joints, 1);
    assert_eq!(recorded[0].contacts, 0);
}

#[test]
fn test_joint_to_non_collidable_body_ignored() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    let a = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);
    let b = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(10.0, 0.0)), 0.5);
    world.body_mut(b).unwrap().set_can_collide(false);
    world.add_joint(Box::new(LinkJoint { a, b }));

    world.step(1.0 / 60.0, false);

    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].bodies, 1);
    assert_eq!(recorded[0].joints, 0);
}

#[test]
fn test_sleeping_body_not_rebuilt_into_islands() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    let handle = circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::zeros()), 0.5);

    // Let the body cross the sleep threshold.
    for _ in 0..5 {
        world.step(0.1, false);
    }
    assert!(!world.body(handle).unwrap().is_awake());

    stats.lock().unwrap().clear();
    for _ in 0..3 {
        world.step(0.1, false);
    }
    assert!(stats.lock().unwrap().is_empty());
}

#[test]
fn test_island_claim_flags_reset_between_steps() {
    init();
    let mut world = PhysicsWorld::new();
    world.set_gravity(Vec2::zeros());
    let stats = record_islands(&mut world);

    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(-0.45, 0.0)), 0.5);
    circle_body(&mut world, PhysicsBody::new_dynamic(Vec2::new(0.45, 0.0)), 0.5);

    // If claim flags leaked from one tick to the next, the second step would
    // observe no island at all.
    world.step(1.0 / 60.0, false);
    world.step(1.0 / 60.0, false);

    let recorded = stats.lock().unwrap();
    assert_eq!(recorded.len(), 2);
    for island in recorded.iter() {
        assert_eq!(island.bodies, 2);
        assert_eq!(island.contacts, 1);
    }
}
