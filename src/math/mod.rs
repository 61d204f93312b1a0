mod aabb;
mod transform;

pub use self::aabb::Aabb;
pub use self::transform::Transform2;

/// The vector type used throughout the engine
pub type Vec2 = nalgebra::Vector2<f32>;

/// The 2D cross product of two vectors, producing a scalar
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// The cross product of a scalar (angular velocity) and a vector
#[inline]
pub fn cross_scalar(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// A vector perpendicular to `v`, rotated 90 degrees counter-clockwise
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}
