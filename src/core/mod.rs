pub mod commands;
pub mod config;
pub mod controller;
pub mod events;
mod island;
pub mod joint;
pub mod storage;
pub mod world;

pub use self::commands::{PhysicsCommand, PhysicsCommands};
pub use self::config::StepConfig;
pub use self::controller::{CollisionBehavior, Controller};
pub use self::events::{BodyEvent, BodyEventType, CollisionEvent, CollisionEventType, EventQueue};
pub use self::island::{Island, IslandStats};
pub use self::joint::{Joint, SolverContext};
pub use self::storage::{Handle, Storage};
pub use self::world::PhysicsWorld;

/// A unique identifier for a body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

/// A unique identifier for a fixture in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureHandle(pub(crate) u32);

/// A unique identifier for a joint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub(crate) u32);

impl BodyHandle {
    /// The reserved invalid handle, never produced by storage
    pub(crate) fn invalid() -> Self {
        Self(0)
    }
}

macro_rules! impl_handle {
    ($ty:ty) => {
        impl storage::Handle for $ty {
            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn raw(&self) -> u32 {
                self.0
            }
        }
    };
}

impl_handle!(BodyHandle);
impl_handle!(FixtureHandle);
impl_handle!(JointHandle);
