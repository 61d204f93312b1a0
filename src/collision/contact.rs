use crate::collision::Manifold;
use crate::core::{BodyHandle, FixtureHandle};

/// A unique identifier for a persistent contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(pub(crate) u32);

/// A persistent pairing between two fixtures believed to be near each other.
///
/// Created when the broadphase first reports their proxies overlapping,
/// destroyed when the overlap ends or either side is removed. The manifold
/// and `touching` flag are refreshed by the narrow phase every tick the
/// contact survives.
pub struct Contact {
    /// The first fixture
    pub fixture_a: FixtureHandle,

    /// The second fixture
    pub fixture_b: FixtureHandle,

    /// The body owning fixture A
    pub body_a: BodyHandle,

    /// The body owning fixture B
    pub body_b: BodyHandle,

    /// The current manifold; empty when not touching
    pub manifold: Manifold,

    /// A disabled contact is skipped by island building and solving
    pub enabled: bool,

    /// Whether the fixtures are actually touching per the narrow phase
    pub touching: bool,

    /// Whether both fixtures are hard; sensor contacts report touches but
    /// produce no impulse response and never couple islands
    pub hard: bool,

    /// Whether this contact has been claimed by an island this tick
    pub(crate) island_flag: bool,

    /// Mixed coefficient of friction for the pair
    pub friction: f32,

    /// Mixed coefficient of restitution for the pair
    pub restitution: f32,
}

impl Contact {
    /// Creates a new contact for a fixture pair, not yet touching
    pub fn new(
        fixture_a: FixtureHandle,
        fixture_b: FixtureHandle,
        body_a: BodyHandle,
        body_b: BodyHandle,
        hard: bool,
    ) -> Self {
        Self {
            fixture_a,
            fixture_b,
            body_a,
            body_b,
            manifold: Manifold::default(),
            enabled: true,
            touching: false,
            hard,
            island_flag: false,
            friction: 0.0,
            restitution: 0.0,
        }
    }

    /// Given one body of the pair, returns the other
    pub fn other_body(&self, body: BodyHandle) -> BodyHandle {
        if body == self.body_a {
            self.body_b
        } else {
            self.body_a
        }
    }

    /// Whether the island builder should pull this contact into an island
    pub(crate) fn couples_island(&self) -> bool {
        self.enabled && self.touching && self.hard
    }
}
