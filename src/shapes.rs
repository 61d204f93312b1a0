use crate::math::{Aabb, Transform2, Vec2};

use std::any::Any;
use std::fmt::Debug;

/// Base trait for collision shapes.
///
/// This core only needs bounds for broadphase proxies; the exact geometry is
/// the narrow phase's business, reached through `as_any` downcasting.
pub trait Shape: Send + Sync + Debug + 'static {
    /// Returns the type name of the shape
    fn shape_type(&self) -> &'static str;

    /// Returns the axis-aligned bounding box of the shape in local space
    fn local_bounds(&self) -> Aabb;

    /// Returns the axis-aligned bounding box of the shape in world space.
    ///
    /// The default implementation only translates `local_bounds` and ignores
    /// the transform's rotation, which is exact for rotation-invariant shapes
    /// like circles. Shapes whose bounds depend on orientation must override
    /// this.
    fn world_bounds(&self, transform: &Transform2) -> Aabb {
        self.local_bounds().translated(transform.position)
    }

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// A circle shape centered on its body's origin
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    /// The circle's radius
    pub radius: f32,
}

impl Circle {
    /// Creates a new circle with the given radius
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Shape for Circle {
    fn shape_type(&self) -> &'static str {
        "Circle"
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(Vec2::zeros(), Vec2::new(self.radius, self.radius))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
