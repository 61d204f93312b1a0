use crate::bodies::{BodyType, PhysicsBody};
use crate::collision::{ContactId, ContactManager, ContactSolver, SolverBody};
use crate::core::joint::JointEntry;
use crate::core::{
    BodyEvent, BodyEventType, BodyHandle, EventQueue, JointHandle, SolverContext, StepConfig,
    Storage,
};

use log::{debug, warn};
use std::collections::HashMap;

/// One connected component of hard-touching and jointed awake bodies.
///
/// This is reusable scratch: `clear` resets the counts but keeps the
/// capacity, so steady-state ticks do not allocate.
#[derive(Debug, Default)]
pub struct Island {
    pub(crate) bodies: Vec<BodyHandle>,
    pub(crate) contacts: Vec<ContactId>,
    pub(crate) joints: Vec<JointHandle>,
}

impl Island {
    /// Creates a new empty island
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the island for reuse without releasing capacity
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }

    /// The bodies in the island
    pub fn bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    /// The contacts in the island
    pub fn contacts(&self) -> &[ContactId] {
        &self.contacts
    }

    /// The joints in the island
    pub fn joints(&self) -> &[JointHandle] {
        &self.joints
    }

    /// Returns whether the island is empty
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Summary of one solved island, handed to the step observer
#[derive(Debug, Clone, Copy)]
pub struct IslandStats {
    /// Number of bodies in the island
    pub bodies: usize,

    /// Number of contacts in the island
    pub contacts: usize,

    /// Number of joints in the island
    pub joints: usize,

    /// Whether the position iterations converged
    pub position_solved: bool,
}

/// Depth-first flood fill over the contact and joint graph.
///
/// The explicit stack is reused across builds and sized to the body count;
/// growth past the reservation is logged and debug-asserted as a sizing bug,
/// never a silent overflow.
#[derive(Default)]
pub(crate) struct IslandBuilder {
    stack: Vec<BodyHandle>,
}

impl IslandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the island rooted at `seed` into `island`, claiming bodies,
    /// contacts and joints as it goes.
    pub fn build(
        &mut self,
        seed: BodyHandle,
        bodies: &mut Storage<PhysicsBody, BodyHandle>,
        contacts: &mut ContactManager,
        joints: &mut Storage<JointEntry, JointHandle>,
        island: &mut Island,
    ) {
        island.clear();
        self.stack.clear();
        if self.stack.capacity() < bodies.len() {
            self.stack.reserve(bodies.len());
        }

        let Some(seed_body) = bodies.get_mut(seed) else {
            return;
        };
        seed_body.set_in_island(true);
        self.push(seed);

        while let Some(handle) = self.stack.pop() {
            let Some(body) = bodies.get(handle) else {
                // Removed mid-tick; skip defensively.
                continue;
            };

            island.bodies.push(handle);

            // Static bodies are graph leaves: they join the island but the
            // fill never propagates through them, so one static body can be
            // shared by many islands in the same tick.
            if body.body_type() == BodyType::Static {
                continue;
            }

            let edges: Vec<ContactId> = body.contacts.to_vec();
            let body_joints: Vec<JointHandle> = body.joints.to_vec();

            for contact_id in edges {
                let Some(contact) = contacts.contact_mut(contact_id) else {
                    continue;
                };
                if contact.island_flag || !contact.couples_island() {
                    continue;
                }
                contact.island_flag = true;
                island.contacts.push(contact_id);

                let other = contact.other_body(handle);
                if let Some(other_body) = bodies.get_mut(other) {
                    if !other_body.in_island() {
                        other_body.set_in_island(true);
                        self.push(other);
                    }
                }
            }

            for joint_handle in body_joints {
                let Some(entry) = joints.get_mut(joint_handle) else {
                    continue;
                };
                if entry.island_flag || !entry.enabled {
                    continue;
                }
                let other = if entry.joint.body_a() == handle {
                    entry.joint.body_b()
                } else {
                    entry.joint.body_a()
                };

                // Joints to non-collidable bodies never couple islands.
                let other_collidable = bodies.get(other).is_some_and(|b| b.can_collide());
                if !other_collidable {
                    continue;
                }

                entry.island_flag = true;
                island.joints.push(joint_handle);

                if let Some(other_body) = bodies.get_mut(other) {
                    if !other_body.in_island() {
                        other_body.set_in_island(true);
                        self.push(other);
                    }
                }
            }
        }
    }

    fn push(&mut self, handle: BodyHandle) {
        if self.stack.len() == self.stack.capacity() {
            debug!("island stack grew past its reservation ({})", self.stack.len());
            debug_assert!(false, "island stack undersized");
        }
        self.stack.push(handle);
    }
}

/// Reusable per-tick scratch for the island solve: island-local body copies,
/// their types, and the handle-to-index map. Reset between islands, not
/// reallocated.
#[derive(Default)]
pub(crate) struct SolverScratch {
    bodies: Vec<SolverBody>,
    body_types: Vec<BodyType>,
    index: HashMap<BodyHandle, usize>,
}

impl SolverScratch {
    fn reset(&mut self, capacity: usize) {
        self.bodies.clear();
        self.body_types.clear();
        self.index.clear();
        if self.bodies.capacity() < capacity {
            self.bodies.reserve(capacity);
            self.body_types.reserve(capacity);
            self.index.reserve(capacity);
        }
    }
}

/// Advances one island by one timestep: integrate forces, solve velocity and
/// position constraints, account for sleep, and commit state back to the
/// bodies.
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_island(
    island: &Island,
    bodies: &mut Storage<PhysicsBody, BodyHandle>,
    contacts: &mut ContactManager,
    joints: &mut Storage<JointEntry, JointHandle>,
    solver: &mut ContactSolver,
    scratch: &mut SolverScratch,
    config: &StepConfig,
    events: &mut EventQueue,
    dt: f32,
    prediction: bool,
) -> IslandStats {
    scratch.reset(island.bodies.len());

    // 1. Copy body state into island-local solver bodies and integrate
    // forces. Every mobile island member is awake from here on: being pulled
    // into a moving island is what wakes a sleeping body.
    for (i, &handle) in island.bodies.iter().enumerate() {
        let Some(body) = bodies.get_mut(handle) else {
            scratch.bodies.push(inert_solver_body());
            scratch.body_types.push(BodyType::Static);
            continue;
        };

        if !body.is_awake() && body.body_type().is_mobile() {
            body.wake_up();
            events.add_body_event(BodyEvent {
                event_type: BodyEventType::Awake,
                body: handle,
            });
        }

        let mut linear_velocity = body.linear_velocity();
        let mut angular_velocity = body.angular_velocity();

        if body.body_type() == BodyType::Dynamic {
            linear_velocity += (config.gravity + body.force() * body.inv_mass()) * dt;
            angular_velocity += body.inv_inertia() * body.torque() * dt;

            linear_velocity *= (1.0 - body.linear_damping * dt).clamp(0.0, 1.0);
            angular_velocity *= (1.0 - body.angular_damping * dt).clamp(0.0, 1.0);
        }

        scratch.bodies.push(SolverBody {
            position: body.position(),
            angle: body.angle(),
            linear_velocity,
            angular_velocity,
            inv_mass: body.inv_mass(),
            inv_inertia: body.inv_inertia(),
        });
        scratch.body_types.push(body.body_type());
        scratch.index.insert(handle, i);
    }

    // 2. Initialize constraints, seeding last tick's impulses if enabled.
    solver.init(
        &island.contacts,
        contacts,
        &scratch.index,
        &scratch.bodies,
        config,
    );
    if config.warm_starting {
        solver.warm_start(&mut scratch.bodies);
    }
    {
        let mut ctx = SolverContext::new(dt, &mut scratch.bodies, &scratch.index);
        for &handle in &island.joints {
            if let Some(entry) = joints.get_mut(handle) {
                entry.joint.init_velocity_constraints(&mut ctx);
            }
        }
    }

    // 3. Velocity iterations: joints first, then contacts.
    for _ in 0..config.velocity_iterations {
        {
            let mut ctx = SolverContext::new(dt, &mut scratch.bodies, &scratch.index);
            for &handle in &island.joints {
                if let Some(entry) = joints.get_mut(handle) {
                    entry.joint.solve_velocity(&mut ctx);
                }
            }
        }
        solver.solve_velocity(&mut scratch.bodies);
    }

    // A joint that turned inconsistent is disabled, not fatal.
    for &handle in &island.joints {
        if let Some(entry) = joints.get_mut(handle) {
            if entry.enabled && !entry.joint.validate() {
                warn!("joint {:?} failed validation, disabling", handle);
                entry.enabled = false;
            }
        }
    }

    // 4. Integrate positions, clamping runaway velocities first.
    for (body, body_type) in scratch.bodies.iter_mut().zip(scratch.body_types.iter()) {
        if !body_type.is_mobile() {
            continue;
        }

        let speed = body.linear_velocity.norm();
        if speed > config.max_lin_velocity {
            body.linear_velocity *= config.max_lin_velocity / speed;
        }
        body.angular_velocity = body
            .angular_velocity
            .clamp(-config.max_ang_velocity, config.max_ang_velocity);

        body.position += body.linear_velocity * dt;
        body.angle += body.angular_velocity * dt;
    }

    // 5. Position iterations until solved or the budget runs out.
    let mut position_solved = false;
    for _ in 0..config.position_iterations {
        let contacts_ok = solver.solve_position(&mut scratch.bodies, config);

        let mut joints_ok = true;
        {
            let mut ctx = SolverContext::new(dt, &mut scratch.bodies, &scratch.index);
            for &handle in &island.joints {
                if let Some(entry) = joints.get_mut(handle) {
                    if entry.enabled {
                        joints_ok &= entry.joint.solve_position(&mut ctx);
                    }
                }
            }
        }

        if contacts_ok && joints_ok {
            position_solved = true;
            break;
        }
    }

    solver.store_impulses(contacts);

    // 6. Commit: serialized write-back of the island-local state.
    for (&handle, solver_body) in island.bodies.iter().zip(scratch.bodies.iter()) {
        let Some(body) = bodies.get_mut(handle) else {
            continue;
        };
        if body.body_type() == BodyType::Static {
            continue;
        }

        let moved = (body.position() - solver_body.position).norm_squared() > f32::EPSILON
            || (body.angle() - solver_body.angle).abs() > f32::EPSILON;

        body.set_position(solver_body.position);
        body.set_angle(solver_body.angle);
        body.set_linear_velocity(solver_body.linear_velocity);
        body.set_angular_velocity(solver_body.angular_velocity);

        if moved {
            events.add_body_event(BodyEvent {
                event_type: BodyEventType::Moved,
                body: handle,
            });
        }
    }

    // 7. Sleep accounting, skipped during prediction passes.
    if config.allow_sleeping && !prediction {
        let lin_tol_sq = config.linear_sleep_tolerance * config.linear_sleep_tolerance;
        let ang_tol_sq = config.angular_sleep_tolerance * config.angular_sleep_tolerance;
        let mut min_sleep_time = f32::MAX;

        for &handle in &island.bodies {
            let Some(body) = bodies.get_mut(handle) else {
                continue;
            };
            if body.body_type() == BodyType::Static {
                continue;
            }

            let restless = !body.can_sleep()
                || body.angular_velocity() * body.angular_velocity() > ang_tol_sq
                || body.linear_velocity().norm_squared() > lin_tol_sq;

            if restless {
                body.set_sleep_time(0.0);
                min_sleep_time = 0.0;
            } else {
                let time = body.sleep_time() + dt;
                body.set_sleep_time(time);
                min_sleep_time = min_sleep_time.min(time);
            }
        }

        if min_sleep_time >= config.time_to_sleep && position_solved {
            for &handle in &island.bodies {
                let Some(body) = bodies.get_mut(handle) else {
                    continue;
                };
                if body.body_type() == BodyType::Static || !body.is_awake() {
                    continue;
                }
                body.put_to_sleep();
                events.add_body_event(BodyEvent {
                    event_type: BodyEventType::Sleep,
                    body: handle,
                });
            }
        }
    }

    IslandStats {
        bodies: island.bodies.len(),
        contacts: island.contacts.len(),
        joints: island.joints.len(),
        position_solved,
    }
}

fn inert_solver_body() -> SolverBody {
    SolverBody {
        position: crate::math::Vec2::zeros(),
        angle: 0.0,
        linear_velocity: crate::math::Vec2::zeros(),
        angular_velocity: 0.0,
        inv_mass: 0.0,
        inv_inertia: 0.0,
    }
}
