use crate::bodies::BodyType;
use crate::collision::ContactId;
use crate::core::{FixtureHandle, JointHandle};
use crate::math::{Transform2, Vec2};

use bitflags::bitflags;

bitflags! {
    /// Per-body state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BodyFlags: u32 {
        /// The body is awake and participates in island solving
        const AWAKE = 1 << 0;

        /// The body has been claimed by an island during the current tick
        const ISLAND = 1 << 1;

        /// The body's fixtures generate contacts
        const CAN_COLLIDE = 1 << 2;

        /// The body is allowed to fall asleep
        const CAN_SLEEP = 1 << 3;

        /// The body is paused and excluded from island seeding
        const PAUSED = 1 << 4;
    }
}

/// A rigid body participating in the physics step.
///
/// Adjacency to fixtures, contacts and joints is kept as index lists on the
/// body so the island builder can walk the contact graph in O(degree) without
/// linked pointers.
pub struct PhysicsBody {
    /// The body's type (dynamic, kinematic, or static)
    body_type: BodyType,

    /// World position
    position: Vec2,

    /// Rotation angle in radians
    angle: f32,

    /// Linear velocity
    linear_velocity: Vec2,

    /// Angular velocity (scalar, radians per second)
    angular_velocity: f32,

    /// Accumulated force, cleared after integration
    force: Vec2,

    /// Accumulated torque, cleared after integration
    torque: f32,

    /// The body's mass
    mass: f32,

    /// Inverse of the body's mass
    inv_mass: f32,

    /// Inverse of the body's rotational inertia
    inv_inertia: f32,

    /// Linear damping coefficient
    pub linear_damping: f32,

    /// Angular damping coefficient
    pub angular_damping: f32,

    /// Seconds the body has spent continuously below the motion thresholds
    sleep_time: f32,

    /// State flags
    flags: BodyFlags,

    /// Fixtures attached to this body
    pub(crate) fixtures: Vec<FixtureHandle>,

    /// Contacts this body participates in (contact edges)
    pub(crate) contacts: Vec<ContactId>,

    /// Joints attached to this body
    pub(crate) joints: Vec<JointHandle>,
}

impl PhysicsBody {
    /// Creates a new body of the given type at the given position
    pub fn new(body_type: BodyType, position: Vec2) -> Self {
        let flags = match body_type {
            // Static bodies are never awake; they are graph leaves only.
            BodyType::Static => BodyFlags::CAN_COLLIDE | BodyFlags::CAN_SLEEP,
            _ => BodyFlags::AWAKE | BodyFlags::CAN_COLLIDE | BodyFlags::CAN_SLEEP,
        };

        let (mass, inv_mass, inv_inertia) = match body_type {
            BodyType::Dynamic => (1.0, 1.0, 1.0),
            _ => (0.0, 0.0, 0.0),
        };

        Self {
            body_type,
            position,
            angle: 0.0,
            linear_velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            force: Vec2::zeros(),
            torque: 0.0,
            mass,
            inv_mass,
            inv_inertia,
            linear_damping: 0.0,
            angular_damping: 0.0,
            sleep_time: 0.0,
            flags,
            fixtures: Vec::new(),
            contacts: Vec::new(),
            joints: Vec::new(),
        }
    }

    /// Creates a new dynamic body at the given position
    pub fn new_dynamic(position: Vec2) -> Self {
        Self::new(BodyType::Dynamic, position)
    }

    /// Creates a new kinematic body at the given position
    pub fn new_kinematic(position: Vec2) -> Self {
        Self::new(BodyType::Kinematic, position)
    }

    /// Creates a new static body at the given position
    pub fn new_static(position: Vec2) -> Self {
        Self::new(BodyType::Static, position)
    }

    /// Returns the body type
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Returns the body's world transform
    pub fn transform(&self) -> Transform2 {
        Transform2::new(self.position, self.angle)
    }

    /// Returns the body's world position
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Sets the body's world position
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Returns the body's rotation angle in radians
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Sets the body's rotation angle in radians
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    /// Returns the body's linear velocity
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Sets the body's linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        if self.body_type != BodyType::Static {
            self.linear_velocity = velocity;
        }
    }

    /// Returns the body's angular velocity
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Sets the body's angular velocity
    pub fn set_angular_velocity(&mut self, velocity: f32) {
        if self.body_type != BodyType::Static {
            self.angular_velocity = velocity;
        }
    }

    /// Returns the accumulated force
    pub fn force(&self) -> Vec2 {
        self.force
    }

    /// Returns the accumulated torque
    pub fn torque(&self) -> f32 {
        self.torque
    }

    /// Returns the body's mass
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Sets the body's mass (and inverse mass). Non-dynamic bodies keep
    /// infinite effective mass regardless of the value given.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inv_mass = if self.body_type == BodyType::Dynamic && mass > 0.0 {
            1.0 / mass
        } else {
            0.0
        };
    }

    /// Returns the body's inverse mass
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Returns the body's inverse rotational inertia
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Sets the body's rotational inertia
    pub fn set_inertia(&mut self, inertia: f32) {
        self.inv_inertia = if self.body_type == BodyType::Dynamic && inertia > 0.0 {
            1.0 / inertia
        } else {
            0.0
        };
    }

    /// Applies a force at the center of mass, accumulated until integration
    pub fn apply_force(&mut self, force: Vec2) {
        if self.body_type == BodyType::Dynamic {
            self.wake_up();
            self.force += force;
        }
    }

    /// Applies a torque, accumulated until integration
    pub fn apply_torque(&mut self, torque: f32) {
        if self.body_type == BodyType::Dynamic {
            self.wake_up();
            self.torque += torque;
        }
    }

    /// Applies an instantaneous impulse at the center of mass
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.body_type == BodyType::Dynamic {
            self.wake_up();
            self.linear_velocity += impulse * self.inv_mass;
        }
    }

    /// Clears accumulated force and torque
    pub fn clear_forces(&mut self) {
        self.force = Vec2::zeros();
        self.torque = 0.0;
    }

    /// Returns whether the body is awake
    pub fn is_awake(&self) -> bool {
        self.flags.contains(BodyFlags::AWAKE)
    }

    /// Wakes the body up. Static bodies are never woken.
    pub fn wake_up(&mut self) {
        if self.body_type == BodyType::Static {
            return;
        }
        self.flags.insert(BodyFlags::AWAKE);
        self.sleep_time = 0.0;
    }

    /// Puts the body to sleep, zeroing its motion
    pub fn put_to_sleep(&mut self) {
        if self.body_type == BodyType::Static {
            return;
        }
        self.flags.remove(BodyFlags::AWAKE);
        self.sleep_time = 0.0;
        self.linear_velocity = Vec2::zeros();
        self.angular_velocity = 0.0;
        self.clear_forces();
    }

    /// Returns whether the body may fall asleep
    pub fn can_sleep(&self) -> bool {
        self.flags.contains(BodyFlags::CAN_SLEEP)
    }

    /// Sets whether the body may fall asleep
    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        if can_sleep {
            self.flags.insert(BodyFlags::CAN_SLEEP);
        } else {
            self.flags.remove(BodyFlags::CAN_SLEEP);
            self.wake_up();
        }
    }

    /// Returns whether the body's fixtures generate contacts
    pub fn can_collide(&self) -> bool {
        self.flags.contains(BodyFlags::CAN_COLLIDE)
    }

    /// Sets whether the body's fixtures generate contacts
    pub fn set_can_collide(&mut self, can_collide: bool) {
        if can_collide {
            self.flags.insert(BodyFlags::CAN_COLLIDE);
        } else {
            self.flags.remove(BodyFlags::CAN_COLLIDE);
        }
    }

    /// Returns whether the body is paused
    pub fn is_paused(&self) -> bool {
        self.flags.contains(BodyFlags::PAUSED)
    }

    /// Sets whether the body is paused
    pub fn set_paused(&mut self, paused: bool) {
        if paused {
            self.flags.insert(BodyFlags::PAUSED);
        } else {
            self.flags.remove(BodyFlags::PAUSED);
        }
    }

    /// Returns whether the body is claimed by an island this tick
    pub(crate) fn in_island(&self) -> bool {
        self.flags.contains(BodyFlags::ISLAND)
    }

    /// Marks or clears the island claim flag
    pub(crate) fn set_in_island(&mut self, in_island: bool) {
        if in_island {
            self.flags.insert(BodyFlags::ISLAND);
        } else {
            self.flags.remove(BodyFlags::ISLAND);
        }
    }

    /// Returns the seconds spent continuously below the motion thresholds
    pub fn sleep_time(&self) -> f32 {
        self.sleep_time
    }

    /// Sets the accumulated sleep time
    pub(crate) fn set_sleep_time(&mut self, time: f32) {
        self.sleep_time = time;
    }

    /// Returns the fixtures attached to this body
    pub fn fixtures(&self) -> &[FixtureHandle] {
        &self.fixtures
    }

    /// Returns the contacts this body participates in
    pub fn contacts(&self) -> &[ContactId] {
        &self.contacts
    }

    /// Returns the joints attached to this body
    pub fn joints(&self) -> &[JointHandle] {
        &self.joints
    }

    pub(crate) fn add_contact_edge(&mut self, contact: ContactId) {
        if !self.contacts.contains(&contact) {
            self.contacts.push(contact);
        }
    }

    pub(crate) fn remove_contact_edge(&mut self, contact: ContactId) {
        self.contacts.retain(|&c| c != contact);
    }
}
