mod body;
mod body_type;

pub use self::body::{BodyFlags, PhysicsBody};
pub use self::body_type::BodyType;
