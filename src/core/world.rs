use crate::bodies::{BodyType, PhysicsBody};
use crate::collision::{
    BroadPhase, BruteForceBroadPhase, CircleNarrowPhase, ContactManager, ContactSolver,
    NarrowPhase,
};
use crate::core::island::{solve_island, IslandBuilder, SolverScratch};
use crate::core::joint::JointEntry;
use crate::core::{
    BodyEvent, BodyEventType, BodyHandle, CollisionBehavior, Controller, EventQueue,
    FixtureHandle, Island, IslandStats, Joint, JointHandle, PhysicsCommand, PhysicsCommands,
    StepConfig, Storage,
};
use crate::fixtures::{Fixture, FixtureProxy};
use crate::math::Vec2;
use crate::Result;

use log::trace;
use std::collections::HashMap;

/// Callback invoked once per solved island with its summary
pub type StepObserver = Box<dyn FnMut(&IslandStats) + Send>;

/// The physics world: owns all bodies, fixtures, contacts and joints, and
/// advances them one deterministic step at a time.
///
/// Structural mutation during a step goes through the deferred command
/// queue and is applied at the two flush checkpoints; the immediate methods
/// on this type are for use between steps.
pub struct PhysicsWorld {
    bodies: Storage<PhysicsBody, BodyHandle>,
    fixtures: Storage<Fixture, FixtureHandle>,
    joints: Storage<JointEntry, JointHandle>,

    contact_manager: ContactManager,
    broad_phase: Box<dyn BroadPhase>,
    narrow_phase: Box<dyn NarrowPhase>,

    config: StepConfig,
    events: EventQueue,
    commands: PhysicsCommands,

    controllers: Vec<Box<dyn Controller>>,
    behaviors: HashMap<BodyHandle, Vec<Box<dyn CollisionBehavior>>>,

    // Reusable per-tick scratch; reset, not reallocated.
    island: Island,
    island_builder: IslandBuilder,
    contact_solver: ContactSolver,
    solver_scratch: SolverScratch,

    observer: Option<StepObserver>,

    /// Total elapsed simulation time
    time: f32,
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings
    pub fn new() -> Self {
        Self::build(StepConfig::default())
    }

    /// Creates a new physics world with the given configuration.
    ///
    /// Configuration problems are fatal here, never per tick.
    pub fn with_config(config: StepConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StepConfig) -> Self {
        Self {
            bodies: Storage::new(),
            fixtures: Storage::new(),
            joints: Storage::new(),
            contact_manager: ContactManager::new(),
            broad_phase: Box::new(BruteForceBroadPhase::new()),
            narrow_phase: Box::new(CircleNarrowPhase::new()),
            config,
            events: EventQueue::new(),
            commands: PhysicsCommands::new(),
            controllers: Vec::new(),
            behaviors: HashMap::new(),
            island: Island::new(),
            island_builder: IslandBuilder::new(),
            contact_solver: ContactSolver::new(),
            solver_scratch: SolverScratch::default(),
            observer: None,
            time: 0.0,
        }
    }

    /// Replaces the broadphase implementation
    pub fn set_broad_phase(&mut self, broad_phase: Box<dyn BroadPhase>) {
        self.broad_phase = broad_phase;
    }

    /// Replaces the narrow-phase implementation
    pub fn set_narrow_phase(&mut self, narrow_phase: Box<dyn NarrowPhase>) {
        self.narrow_phase = narrow_phase;
    }

    /// Installs an observer called once per solved island
    pub fn set_observer(&mut self, observer: StepObserver) {
        self.observer = Some(observer);
    }

    /// Returns the current simulation time
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns a reference to the step configuration
    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Sets the gravity for the simulation
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    /// Adds a body to the world and returns its handle
    pub fn add_body(&mut self, body: PhysicsBody) -> BodyHandle {
        let handle = self.bodies.add(body);
        self.events.add_body_event(BodyEvent {
            event_type: BodyEventType::Added,
            body: handle,
        });
        handle
    }

    /// Removes a body from the world along with its fixtures, contacts and
    /// joints
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<PhysicsBody> {
        // Joints cascade first, waking the far endpoints.
        let joint_handles: Vec<JointHandle> = self
            .joints
            .iter()
            .filter(|(_, entry)| {
                entry.joint.body_a() == handle || entry.joint.body_b() == handle
            })
            .map(|(h, _)| h)
            .collect();
        for joint_handle in joint_handles {
            let _ = self.remove_joint(joint_handle);
        }

        let fixture_handles: Vec<FixtureHandle> = self
            .bodies
            .get_or_err(handle)?
            .fixtures
            .to_vec();
        for fixture_handle in fixture_handles {
            let _ = self.remove_fixture(fixture_handle);
        }

        self.behaviors.remove(&handle);

        self.events.add_body_event(BodyEvent {
            event_type: BodyEventType::Removed,
            body: handle,
        });

        self.bodies
            .remove(handle)
            .ok_or_else(|| crate::error::PhysicsError::ResourceNotFound(format!("{:?}", handle)))
    }

    /// Gets a reference to a body by its handle
    pub fn body(&self, handle: BodyHandle) -> Result<&PhysicsBody> {
        self.bodies.get_or_err(handle)
    }

    /// Gets a mutable reference to a body by its handle
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut PhysicsBody> {
        self.bodies.get_mut_or_err(handle)
    }

    /// Attaches a fixture to a body and registers its broadphase proxy
    pub fn create_fixture(&mut self, body: BodyHandle, mut fixture: Fixture) -> Result<FixtureHandle> {
        let transform = self.bodies.get_or_err(body)?.transform();
        fixture.body = body;

        let aabb = fixture.shape.world_bounds(&transform);
        let handle = self.fixtures.add(fixture);
        let proxy_id = self.broad_phase.create_proxy(handle, aabb);
        if let Some(fixture) = self.fixtures.get_mut(handle) {
            fixture.proxy = Some(FixtureProxy { proxy_id, aabb });
        }

        if let Some(body) = self.bodies.get_mut(body) {
            body.fixtures.push(handle);
        }
        Ok(handle)
    }

    /// Removes a fixture, its proxy, and every contact tracking it
    pub fn remove_fixture(&mut self, handle: FixtureHandle) -> Result<()> {
        self.contact_manager
            .destroy_contacts_for_fixture(handle, &mut self.bodies, &mut self.events);

        let fixture = self
            .fixtures
            .remove(handle)
            .ok_or_else(|| crate::error::PhysicsError::ResourceNotFound(format!("{:?}", handle)))?;

        if let Some(proxy) = fixture.proxy {
            self.broad_phase.destroy_proxy(proxy.proxy_id);
        }
        if let Some(body) = self.bodies.get_mut(fixture.body) {
            body.fixtures.retain(|&f| f != handle);
        }
        Ok(())
    }

    /// Gets a reference to a fixture by its handle
    pub fn fixture(&self, handle: FixtureHandle) -> Result<&Fixture> {
        self.fixtures.get_or_err(handle)
    }

    /// Gets a mutable reference to a fixture by its handle
    pub fn fixture_mut(&mut self, handle: FixtureHandle) -> Result<&mut Fixture> {
        self.fixtures.get_mut_or_err(handle)
    }

    /// Adds a joint, waking both endpoints
    pub fn add_joint(&mut self, joint: Box<dyn Joint>) -> JointHandle {
        let body_a = joint.body_a();
        let body_b = joint.body_b();
        let handle = self.joints.add(JointEntry::new(joint));

        for endpoint in [body_a, body_b] {
            if let Some(body) = self.bodies.get_mut(endpoint) {
                body.joints.push(handle);
            }
            self.wake_body(endpoint);
        }
        handle
    }

    /// Removes a joint, waking both endpoints
    pub fn remove_joint(&mut self, handle: JointHandle) -> Result<Box<dyn Joint>> {
        let entry = self
            .joints
            .remove(handle)
            .ok_or_else(|| crate::error::PhysicsError::ResourceNotFound(format!("{:?}", handle)))?;

        for endpoint in [entry.joint.body_a(), entry.joint.body_b()] {
            if let Some(body) = self.bodies.get_mut(endpoint) {
                body.joints.retain(|&j| j != handle);
            }
            self.wake_body(endpoint);
        }
        Ok(entry.joint)
    }

    /// Wakes a body, emitting an event if it was asleep. Static bodies are
    /// never woken.
    pub fn wake_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if !body.is_awake() && body.body_type().is_mobile() {
                body.wake_up();
                self.events.add_body_event(BodyEvent {
                    event_type: BodyEventType::Awake,
                    body: handle,
                });
            }
        }
    }

    /// Puts a body to sleep, emitting an event if it was awake
    pub fn sleep_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if body.is_awake() && body.body_type().is_mobile() {
                body.put_to_sleep();
                self.events.add_body_event(BodyEvent {
                    event_type: BodyEventType::Sleep,
                    body: handle,
                });
            }
        }
    }

    /// Moves a body directly, waking it
    pub fn set_body_position(&mut self, handle: BodyHandle, position: Vec2) -> Result<()> {
        let body = self.bodies.get_mut_or_err(handle)?;
        body.set_position(position);
        self.wake_body(handle);
        Ok(())
    }

    /// Registers a controller, run before and after island solving each step
    pub fn add_controller(&mut self, controller: Box<dyn Controller>) {
        self.controllers.push(controller);
    }

    /// Attaches a collision behavior to a body
    pub fn add_behavior(&mut self, body: BodyHandle, behavior: Box<dyn CollisionBehavior>) {
        self.behaviors.entry(body).or_default().push(behavior);
    }

    /// Returns a reference to the event queue
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns a mutable reference to the event queue
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Returns the deferred command queue for staging structural changes
    pub fn commands_mut(&mut self) -> &mut PhysicsCommands {
        &mut self.commands
    }

    /// Returns the contact manager
    pub fn contacts(&self) -> &ContactManager {
        &self.contact_manager
    }

    /// Enables or disables a contact. Disabled contacts stop coupling
    /// islands and generating impulses until re-enabled.
    pub fn set_contact_enabled(&mut self, id: crate::collision::ContactId, enabled: bool) -> bool {
        self.contact_manager.set_contact_enabled(id, enabled)
    }

    /// Returns the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns the number of joints in the world
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Returns the number of bodies with collision behaviors attached
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    /// Advances the simulation by one tick.
    ///
    /// `prediction` marks a speculative pass (client-side prediction or
    /// rollback): sleep accounting is suspended so replaying the same tick
    /// later produces identical results.
    pub fn step(&mut self, dt: f32, prediction: bool) {
        self.events.clear();

        // Checkpoint 1: structural changes staged since the last tick.
        self.flush_commands();

        self.update_proxies();
        let pairs = self.broad_phase.pairs();
        self.contact_manager
            .find_new_contacts(&pairs, &mut self.bodies, &self.fixtures);

        self.run_controllers(dt, Phase::Pre);

        self.contact_manager.collide(
            &mut self.bodies,
            &self.fixtures,
            self.narrow_phase.as_ref(),
            &mut self.events,
        );

        self.contact_manager
            .pre_solve(dt, &mut self.behaviors, &mut self.commands);

        // Checkpoint 2: behaviors may have staged structural changes.
        self.flush_commands();

        self.solve_islands(dt, prediction);

        self.contact_manager.post_solve();
        for (_, body) in self.bodies.iter_mut() {
            body.set_in_island(false);
        }
        for (_, entry) in self.joints.iter_mut() {
            entry.island_flag = false;
        }

        self.run_controllers(dt, Phase::Post);

        if self.config.auto_clear_forces {
            for (_, body) in self.bodies.iter_mut() {
                body.clear_forces();
            }
        }

        self.time += dt;
    }

    /// Builds and solves one island per connected component of awake bodies
    fn solve_islands(&mut self, dt: f32, prediction: bool) {
        let mut island = std::mem::take(&mut self.island);
        let mut builder = std::mem::take(&mut self.island_builder);
        let mut solver = std::mem::take(&mut self.contact_solver);
        let mut scratch = std::mem::take(&mut self.solver_scratch);

        for seed in self.bodies.handles() {
            let Some(body) = self.bodies.get(seed) else {
                continue;
            };
            if !body.is_awake()
                || body.in_island()
                || body.is_paused()
                || !body.can_collide()
                || body.body_type() == BodyType::Static
            {
                continue;
            }

            builder.build(
                seed,
                &mut self.bodies,
                &mut self.contact_manager,
                &mut self.joints,
                &mut island,
            );
            if island.is_empty() {
                continue;
            }

            let stats = solve_island(
                &island,
                &mut self.bodies,
                &mut self.contact_manager,
                &mut self.joints,
                &mut solver,
                &mut scratch,
                &self.config,
                &mut self.events,
                dt,
                prediction,
            );
            trace!(
                "island solved: {} bodies, {} contacts, {} joints, solved={}",
                stats.bodies,
                stats.contacts,
                stats.joints,
                stats.position_solved
            );
            if let Some(observer) = self.observer.as_mut() {
                observer(&stats);
            }

            // Static leaves free up immediately so sibling islands in this
            // tick can claim them again.
            for &handle in island.bodies() {
                if let Some(body) = self.bodies.get_mut(handle) {
                    if body.body_type() == BodyType::Static {
                        body.set_in_island(false);
                    }
                }
            }
        }

        self.island = island;
        self.island_builder = builder;
        self.contact_solver = solver;
        self.solver_scratch = scratch;
    }

    /// Applies staged commands in FIFO order
    fn flush_commands(&mut self) {
        for command in self.commands.drain() {
            match command {
                PhysicsCommand::AddBody(body) => {
                    self.add_body(*body);
                }
                PhysicsCommand::RemoveBody(handle) => {
                    let _ = self.remove_body(handle);
                }
                PhysicsCommand::Wake(handle) => self.wake_body(handle),
                PhysicsCommand::Sleep(handle) => self.sleep_body(handle),
            }
        }
    }

    /// Recomputes every fixture's world AABB and updates its proxy
    fn update_proxies(&mut self) {
        for handle in self.fixtures.handles() {
            let transform = match self.fixtures.get(handle) {
                Some(fixture) => match self.bodies.get(fixture.body) {
                    Some(body) => body.transform(),
                    None => continue,
                },
                None => continue,
            };

            let Some(fixture) = self.fixtures.get_mut(handle) else {
                continue;
            };
            let aabb = fixture.shape.world_bounds(&transform);
            if let Some(proxy) = fixture.proxy.as_mut() {
                proxy.aabb = aabb;
                self.broad_phase.move_proxy(proxy.proxy_id, aabb);
            }
        }
    }

    fn run_controllers(&mut self, dt: f32, phase: Phase) {
        if self.controllers.is_empty() {
            return;
        }
        let mut controllers = std::mem::take(&mut self.controllers);
        for controller in &mut controllers {
            match phase {
                Phase::Pre => controller.pre_update(self, dt),
                Phase::Post => controller.post_update(self, dt),
            }
        }
        // Controllers registered during the callbacks go after the existing
        // ones.
        controllers.append(&mut self.controllers);
        self.controllers = controllers;
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Pre,
    Post,
}
