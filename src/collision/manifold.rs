use crate::math::Vec2;

/// Maximum number of contact points in a manifold
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// A single point of contact between two fixtures
#[derive(Debug, Clone, Copy)]
pub struct ManifoldPoint {
    /// The contact point in world space
    pub point: Vec2,

    /// Penetration depth at this point
    pub penetration: f32,

    /// Accumulated normal impulse, carried across ticks for warm starting
    pub normal_impulse: f32,

    /// Accumulated tangent impulse, carried across ticks for warm starting
    pub tangent_impulse: f32,
}

impl ManifoldPoint {
    /// Creates a new contact point with zero accumulated impulses
    pub fn new(point: Vec2, penetration: f32) -> Self {
        Self {
            point,
            penetration,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }
}

/// Geometric description of how two fixtures touch: the shared normal
/// (pointing from fixture A toward fixture B) and up to
/// [`MAX_MANIFOLD_POINTS`] contact points.
#[derive(Debug, Clone, Default)]
pub struct Manifold {
    /// Contact normal from fixture A to fixture B
    pub normal: Vec2,

    /// The contact points
    pub points: Vec<ManifoldPoint>,
}

impl Manifold {
    /// Creates a new manifold with the given normal
    pub fn new(normal: Vec2) -> Self {
        Self {
            normal,
            points: Vec::with_capacity(MAX_MANIFOLD_POINTS),
        }
    }

    /// Adds a contact point, dropping the shallowest one when full
    pub fn add_point(&mut self, point: ManifoldPoint) {
        if self.points.len() < MAX_MANIFOLD_POINTS {
            self.points.push(point);
            return;
        }

        let mut min_idx = 0;
        for (i, p) in self.points.iter().enumerate() {
            if p.penetration < self.points[min_idx].penetration {
                min_idx = i;
            }
        }
        if point.penetration > self.points[min_idx].penetration {
            self.points[min_idx] = point;
        }
    }

    /// Returns whether the manifold holds any contact points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Seeds this manifold's accumulated impulses from the previous tick's
    /// manifold of the same contact, matched point-for-point by index.
    pub fn inherit_impulses(&mut self, old: &Manifold) {
        for (point, old_point) in self.points.iter_mut().zip(old.points.iter()) {
            point.normal_impulse = old_point.normal_impulse;
            point.tangent_impulse = old_point.tangent_impulse;
        }
    }
}
