use crate::collision::contact_solver::SolverBody;
use crate::core::BodyHandle;

use std::collections::HashMap;

/// Island-local solver state handed to joints during the solve.
///
/// Bodies are addressed by handle; a handle outside the island yields `None`
/// and the joint is expected to skip the element for the tick.
pub struct SolverContext<'a> {
    /// The timestep being solved
    pub dt: f32,

    bodies: &'a mut [SolverBody],
    index: &'a HashMap<BodyHandle, usize>,
}

impl<'a> SolverContext<'a> {
    pub(crate) fn new(
        dt: f32,
        bodies: &'a mut [SolverBody],
        index: &'a HashMap<BodyHandle, usize>,
    ) -> Self {
        Self { dt, bodies, index }
    }

    /// Returns the solver state for a body, if it is part of the island
    pub fn body(&self, handle: BodyHandle) -> Option<&SolverBody> {
        self.index.get(&handle).map(|&i| &self.bodies[i])
    }

    /// Returns mutable solver state for a body, if it is part of the island
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut SolverBody> {
        self.index.get(&handle).map(|&i| &mut self.bodies[i])
    }

    /// Returns mutable solver state for both endpoints of a joint
    pub fn body_pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Option<(&mut SolverBody, &mut SolverBody)> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (left, right) = self.bodies.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.bodies.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }
}

/// A pluggable two-body constraint.
///
/// Joint equations live with the implementor; this core only drives the
/// solve order: `init_velocity_constraints` once per tick, `solve_velocity`
/// per velocity iteration (before contacts), `validate` after the velocity
/// phase, `solve_position` per position iteration until it reports solved.
pub trait Joint: Send + Sync {
    /// The first body the joint connects
    fn body_a(&self) -> BodyHandle;

    /// The second body the joint connects
    fn body_b(&self) -> BodyHandle;

    /// Prepares the joint for this tick's velocity iterations
    fn init_velocity_constraints(&mut self, ctx: &mut SolverContext);

    /// Applies one velocity iteration
    fn solve_velocity(&mut self, ctx: &mut SolverContext);

    /// Reports whether the joint is still in a consistent state. A failing
    /// joint is disabled for subsequent ticks instead of aborting the solve.
    fn validate(&self) -> bool {
        true
    }

    /// Applies one position iteration; returns true when within tolerance
    fn solve_position(&mut self, ctx: &mut SolverContext) -> bool;
}

/// A joint plus the per-tick bookkeeping this core keeps for it
pub(crate) struct JointEntry {
    pub joint: Box<dyn Joint>,
    pub enabled: bool,
    pub island_flag: bool,
}

impl JointEntry {
    pub fn new(joint: Box<dyn Joint>) -> Self {
        Self {
            joint,
            enabled: true,
            island_flag: false,
        }
    }
}
