use crate::math::Vec2;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A 2D rigid transform: world position plus rotation angle in radians
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transform2 {
    /// World position
    pub position: Vec2,

    /// Rotation angle in radians
    pub angle: f32,
}

impl Transform2 {
    /// Creates a new transform from a position and an angle
    #[inline]
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }

    /// Creates a transform at the given position with no rotation
    #[inline]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            angle: 0.0,
        }
    }

    /// The identity transform
    #[inline]
    pub fn identity() -> Self {
        Self {
            position: Vec2::zeros(),
            angle: 0.0,
        }
    }

    /// Rotates a local-space vector into world space
    #[inline]
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        let (s, c) = self.angle.sin_cos();
        Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
    }

    /// Transforms a local-space point into world space
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.position + self.rotate(p)
    }
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::identity()
    }
}
