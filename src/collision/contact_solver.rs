use crate::collision::{ContactId, ContactManager};
use crate::core::{BodyHandle, StepConfig};
use crate::math::{cross, cross_scalar, perp, Vec2};

use std::collections::HashMap;

/// Island-local copy of a body's state during one solve.
///
/// The solver works on these copies; the world writes them back to the real
/// bodies in a single serialized commit once the island is done.
#[derive(Debug, Clone, Copy)]
pub struct SolverBody {
    /// World position
    pub position: Vec2,

    /// Rotation angle in radians
    pub angle: f32,

    /// Linear velocity
    pub linear_velocity: Vec2,

    /// Angular velocity
    pub angular_velocity: f32,

    /// Inverse mass (zero for static and kinematic bodies)
    pub inv_mass: f32,

    /// Inverse rotational inertia (zero for static and kinematic bodies)
    pub inv_inertia: f32,
}

struct ConstraintPoint {
    /// Contact point relative to body A's center
    r_a: Vec2,

    /// Contact point relative to body B's center
    r_b: Vec2,

    /// Effective mass along the normal
    normal_mass: f32,

    /// Effective mass along the tangent
    tangent_mass: f32,

    /// Restitution bias added to the normal velocity target
    velocity_bias: f32,

    normal_impulse: f32,
    tangent_impulse: f32,

    /// Remaining penetration, reduced as position corrections apply
    penetration: f32,
}

struct ContactConstraint {
    contact: ContactId,
    index_a: usize,
    index_b: usize,
    normal: Vec2,
    friction: f32,
    points: Vec<ConstraintPoint>,
}

/// Sequential-impulse solver for one island's contact constraints.
///
/// `init` builds velocity constraints from the manifolds, `warm_start` seeds
/// the previous tick's impulses, `solve_velocity` runs one iteration,
/// `solve_position` applies one round of Baumgarte correction, and
/// `store_impulses` writes accumulated impulses back for the next tick.
pub struct ContactSolver {
    constraints: Vec<ContactConstraint>,
}

impl ContactSolver {
    /// Creates a new empty solver
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    /// Builds velocity constraints for the island's contacts.
    ///
    /// Contacts that vanished or whose bodies are not in the island are
    /// skipped; that is a structural inconsistency recovered locally, not an
    /// error.
    pub fn init(
        &mut self,
        contacts: &[ContactId],
        manager: &ContactManager,
        index: &HashMap<BodyHandle, usize>,
        bodies: &[SolverBody],
        config: &StepConfig,
    ) {
        self.constraints.clear();

        for &id in contacts {
            let Some(contact) = manager.contact(id) else {
                continue;
            };
            let (Some(&index_a), Some(&index_b)) =
                (index.get(&contact.body_a), index.get(&contact.body_b))
            else {
                continue;
            };

            let body_a = &bodies[index_a];
            let body_b = &bodies[index_b];
            let normal = contact.manifold.normal;
            let tangent = perp(normal);

            let mut constraint = ContactConstraint {
                contact: id,
                index_a,
                index_b,
                normal,
                friction: contact.friction,
                points: Vec::with_capacity(contact.manifold.points.len()),
            };

            for mp in &contact.manifold.points {
                let r_a = mp.point - body_a.position;
                let r_b = mp.point - body_b.position;

                let rn_a = cross(r_a, normal);
                let rn_b = cross(r_b, normal);
                let k_normal = body_a.inv_mass
                    + body_b.inv_mass
                    + body_a.inv_inertia * rn_a * rn_a
                    + body_b.inv_inertia * rn_b * rn_b;

                let rt_a = cross(r_a, tangent);
                let rt_b = cross(r_b, tangent);
                let k_tangent = body_a.inv_mass
                    + body_b.inv_mass
                    + body_a.inv_inertia * rt_a * rt_a
                    + body_b.inv_inertia * rt_b * rt_b;

                // Restitution only kicks in above the threshold so resting
                // stacks do not jitter.
                let dv = relative_velocity(body_a, body_b, r_a, r_b);
                let vn = dv.dot(&normal);
                let velocity_bias = if vn < -config.velocity_threshold {
                    -contact.restitution * vn
                } else {
                    0.0
                };

                // Stored impulses are only valid as a starting guess when
                // warm_start will actually apply them; a cold start must
                // accumulate from zero or the delta clamp can pull bodies
                // together.
                let (normal_impulse, tangent_impulse) = if config.warm_starting {
                    (mp.normal_impulse, mp.tangent_impulse)
                } else {
                    (0.0, 0.0)
                };

                constraint.points.push(ConstraintPoint {
                    r_a,
                    r_b,
                    normal_mass: inverted_or_zero(k_normal),
                    tangent_mass: inverted_or_zero(k_tangent),
                    velocity_bias,
                    normal_impulse,
                    tangent_impulse,
                    penetration: mp.penetration,
                });
            }

            self.constraints.push(constraint);
        }
    }

    /// Applies the previous tick's accumulated impulses as a starting guess
    pub fn warm_start(&mut self, bodies: &mut [SolverBody]) {
        for constraint in &self.constraints {
            let tangent = perp(constraint.normal);
            for point in &constraint.points {
                let impulse =
                    constraint.normal * point.normal_impulse + tangent * point.tangent_impulse;
                apply_impulse(
                    bodies,
                    constraint.index_a,
                    constraint.index_b,
                    point.r_a,
                    point.r_b,
                    impulse,
                );
            }
        }
    }

    /// Runs one velocity iteration over all constraints
    pub fn solve_velocity(&mut self, bodies: &mut [SolverBody]) {
        for constraint in &mut self.constraints {
            let tangent = perp(constraint.normal);

            for point in &mut constraint.points {
                // Normal impulse, accumulated and clamped to be repulsive.
                let dv = relative_velocity(
                    &bodies[constraint.index_a],
                    &bodies[constraint.index_b],
                    point.r_a,
                    point.r_b,
                );
                let vn = dv.dot(&constraint.normal);
                let lambda = -point.normal_mass * (vn - point.velocity_bias);
                let new_impulse = (point.normal_impulse + lambda).max(0.0);
                let delta = new_impulse - point.normal_impulse;
                point.normal_impulse = new_impulse;
                apply_impulse(
                    bodies,
                    constraint.index_a,
                    constraint.index_b,
                    point.r_a,
                    point.r_b,
                    constraint.normal * delta,
                );

                // Friction impulse, clamped by the friction cone.
                let dv = relative_velocity(
                    &bodies[constraint.index_a],
                    &bodies[constraint.index_b],
                    point.r_a,
                    point.r_b,
                );
                let vt = dv.dot(&tangent);
                let lambda = -point.tangent_mass * vt;
                let max_friction = constraint.friction * point.normal_impulse;
                let new_impulse =
                    (point.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                let delta = new_impulse - point.tangent_impulse;
                point.tangent_impulse = new_impulse;
                apply_impulse(
                    bodies,
                    constraint.index_a,
                    constraint.index_b,
                    point.r_a,
                    point.r_b,
                    tangent * delta,
                );
            }
        }
    }

    /// Applies one round of Baumgarte positional correction.
    ///
    /// Returns true when every point's remaining penetration is within
    /// tolerance, meaning positions are solved.
    pub fn solve_position(&mut self, bodies: &mut [SolverBody], config: &StepConfig) -> bool {
        let mut min_separation = 0.0f32;

        for constraint in &mut self.constraints {
            for point in &mut constraint.points {
                min_separation = min_separation.min(-point.penetration);

                let correction = (config.baumgarte * (point.penetration - config.linear_slop))
                    .clamp(0.0, config.max_correction);
                if correction <= 0.0 {
                    continue;
                }

                let body_a = &bodies[constraint.index_a];
                let body_b = &bodies[constraint.index_b];
                let rn_a = cross(point.r_a, constraint.normal);
                let rn_b = cross(point.r_b, constraint.normal);
                let k = body_a.inv_mass
                    + body_b.inv_mass
                    + body_a.inv_inertia * rn_a * rn_a
                    + body_b.inv_inertia * rn_b * rn_b;
                if k <= 0.0 {
                    continue;
                }

                let impulse = constraint.normal * (correction / k);

                let (inv_mass_a, inv_inertia_a) = (body_a.inv_mass, body_a.inv_inertia);
                let body_a = &mut bodies[constraint.index_a];
                body_a.position -= impulse * inv_mass_a;
                body_a.angle -= inv_inertia_a * cross(point.r_a, impulse);

                let body_b = &mut bodies[constraint.index_b];
                body_b.position += impulse * body_b.inv_mass;
                body_b.angle += body_b.inv_inertia * cross(point.r_b, impulse);

                point.penetration -= correction;
            }
        }

        min_separation >= -3.0 * config.linear_slop
    }

    /// Writes accumulated impulses back into the contacts' manifolds so the
    /// next tick can warm start from them.
    pub fn store_impulses(&self, manager: &mut ContactManager) {
        for constraint in &self.constraints {
            let Some(contact) = manager.contact_mut(constraint.contact) else {
                continue;
            };
            for (mp, point) in contact
                .manifold
                .points
                .iter_mut()
                .zip(constraint.points.iter())
            {
                mp.normal_impulse = point.normal_impulse;
                mp.tangent_impulse = point.tangent_impulse;
            }
        }
    }
}

impl Default for ContactSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn inverted_or_zero(k: f32) -> f32 {
    if k > 0.0 {
        1.0 / k
    } else {
        0.0
    }
}

#[inline]
fn relative_velocity(body_a: &SolverBody, body_b: &SolverBody, r_a: Vec2, r_b: Vec2) -> Vec2 {
    body_b.linear_velocity + cross_scalar(body_b.angular_velocity, r_b)
        - body_a.linear_velocity
        - cross_scalar(body_a.angular_velocity, r_a)
}

#[inline]
fn apply_impulse(
    bodies: &mut [SolverBody],
    index_a: usize,
    index_b: usize,
    r_a: Vec2,
    r_b: Vec2,
    impulse: Vec2,
) {
    let body_a = &mut bodies[index_a];
    body_a.linear_velocity -= impulse * body_a.inv_mass;
    body_a.angular_velocity -= body_a.inv_inertia * cross(r_a, impulse);

    let body_b = &mut bodies[index_b];
    body_b.linear_velocity += impulse * body_b.inv_mass;
    body_b.angular_velocity += body_b.inv_inertia * cross(r_b, impulse);
}
