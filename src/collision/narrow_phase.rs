use crate::collision::{Manifold, ManifoldPoint};
use crate::math::{Transform2, Vec2};
use crate::shapes::{Circle, Shape};

/// Trait for narrow-phase shape tests.
///
/// Given two shapes and their world transforms, produce the manifold if the
/// shapes actually touch. Shape geometry beyond what an implementation can
/// downcast to is simply "not touching".
pub trait NarrowPhase: Send {
    /// Tests two shapes for contact, returning the manifold when they touch
    fn collide(
        &self,
        shape_a: &dyn Shape,
        transform_a: &Transform2,
        shape_b: &dyn Shape,
        transform_b: &Transform2,
    ) -> Option<Manifold>;
}

/// Narrow phase handling circle-circle contacts only.
///
/// Enough to run the engine and its tests; richer shape support plugs in
/// through the [`NarrowPhase`] trait.
pub struct CircleNarrowPhase;

impl CircleNarrowPhase {
    /// Creates a new circle narrow phase
    pub fn new() -> Self {
        Self
    }
}

impl Default for CircleNarrowPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrowPhase for CircleNarrowPhase {
    fn collide(
        &self,
        shape_a: &dyn Shape,
        transform_a: &Transform2,
        shape_b: &dyn Shape,
        transform_b: &Transform2,
    ) -> Option<Manifold> {
        let circle_a = shape_a.as_any().downcast_ref::<Circle>()?;
        let circle_b = shape_b.as_any().downcast_ref::<Circle>()?;

        let delta = transform_b.position - transform_a.position;
        let distance_sq = delta.norm_squared();
        let radius_sum = circle_a.radius + circle_b.radius;

        if distance_sq >= radius_sum * radius_sum {
            return None;
        }

        let distance = distance_sq.sqrt();
        // Concentric circles have no meaningful direction; pick one.
        let normal = if distance > f32::EPSILON {
            delta / distance
        } else {
            Vec2::new(1.0, 0.0)
        };

        let mut manifold = Manifold::new(normal);
        let point = transform_a.position + normal * circle_a.radius;
        manifold.add_point(ManifoldPoint::new(point, radius_sum - distance));

        Some(manifold)
    }
}
