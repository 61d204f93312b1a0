use crate::core::BodyHandle;
use crate::math::Aabb;
use crate::shapes::Shape;

use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// A bit mask selecting which collision layers a fixture occupies or scans
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct CollisionLayer: u32 {
        /// Default layer (collides with everything)
        const DEFAULT = 0x0001;

        /// Static world geometry
        const STATIC = 0x0002;

        /// Mobile objects
        const MOBILE = 0x0004;

        /// Sensors and trigger volumes
        const SENSOR = 0x0008;

        /// Projectiles
        const PROJECTILE = 0x0010;
    }
}

/// Surface properties used when two fixtures collide
#[derive(Debug, Clone, Copy)]
pub struct Material {
    /// Coefficient of friction, 0-1
    pub friction: f32,

    /// Coefficient of restitution (bounciness), 0-1
    pub restitution: f32,
}

impl Material {
    /// Creates a new material with the specified properties
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.4,
            restitution: 0.0,
        }
    }
}

/// Identifier of a fixture's entry in the broadphase
pub type ProxyId = u32;

/// A fixture's registration with the broadphase: the proxy id plus the
/// cached world AABB computed when proxies were last refreshed.
#[derive(Debug, Clone, Copy)]
pub struct FixtureProxy {
    /// The broadphase proxy id
    pub proxy_id: ProxyId,

    /// The fixture's world AABB at last refresh
    pub aabb: Aabb,
}

/// A collision shape attached to a body, with filtering and material data
pub struct Fixture {
    /// The body this fixture is attached to
    pub(crate) body: BodyHandle,

    /// The collision shape
    pub shape: Arc<dyn Shape>,

    /// If false, the fixture is a sensor: it reports touches but produces
    /// no impulse response and never couples islands
    pub hard: bool,

    /// The layers this fixture occupies
    pub layer: CollisionLayer,

    /// The layers this fixture collides with
    pub mask: CollisionLayer,

    /// Surface properties
    pub material: Material,

    /// Broadphase registration, populated once the fixture is added to a world
    pub(crate) proxy: Option<FixtureProxy>,
}

impl Fixture {
    /// Creates a new hard fixture with default filtering
    pub fn new(shape: Arc<dyn Shape>) -> Self {
        Self {
            body: BodyHandle::invalid(),
            shape,
            hard: true,
            layer: CollisionLayer::DEFAULT,
            mask: CollisionLayer::all(),
            material: Material::default(),
            proxy: None,
        }
    }

    /// Creates a new sensor fixture: touch events, no impulse response
    pub fn new_sensor(shape: Arc<dyn Shape>) -> Self {
        let mut fixture = Self::new(shape);
        fixture.hard = false;
        fixture.layer = CollisionLayer::SENSOR;
        fixture
    }

    /// Returns the body this fixture is attached to
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Returns whether this fixture's filter intersects another's
    pub fn should_collide(&self, other: &Fixture) -> bool {
        self.mask.intersects(other.layer) && other.mask.intersects(self.layer)
    }

    /// Returns the broadphase proxy, if registered
    pub fn proxy(&self) -> Option<&FixtureProxy> {
        self.proxy.as_ref()
    }
}
