pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod fixtures;
pub mod collision;

/// Re-export common types for easier usage
pub use crate::core::{BodyHandle, FixtureHandle, JointHandle, PhysicsWorld, StepConfig};
pub use crate::bodies::{BodyType, PhysicsBody};
pub use crate::fixtures::{CollisionLayer, Fixture, Material};
pub use crate::math::Vec2;

/// Error types for the physics step
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum PhysicsError {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Internal error: {0}")]
        InternalError(String),
    }
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
