use crate::error::PhysicsError;
use crate::math::Vec2;
use crate::Result;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Configuration parameters for the physics step.
///
/// Invalid values are rejected once, at world construction; the per-tick hot
/// path never re-validates.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct StepConfig {
    /// Global gravity vector applied to dynamic bodies
    pub gravity: Vec2,

    /// The number of iterations for solving velocity constraints
    pub velocity_iterations: u32,

    /// The number of iterations for solving position constraints
    pub position_iterations: u32,

    /// Whether contacts seed their previous tick's impulses into the solver
    pub warm_starting: bool,

    /// Whether bodies are allowed to fall asleep at all
    pub allow_sleeping: bool,

    /// Linear velocity below which a body accumulates sleep time
    pub linear_sleep_tolerance: f32,

    /// Angular velocity below which a body accumulates sleep time
    pub angular_sleep_tolerance: f32,

    /// Seconds of continuous sub-threshold motion before an island sleeps
    pub time_to_sleep: f32,

    /// Cap on linear velocity going into position integration
    pub max_lin_velocity: f32,

    /// Cap on angular velocity going into position integration
    pub max_ang_velocity: f32,

    /// Baumgarte factor for positional correction
    pub baumgarte: f32,

    /// Penetration depth tolerated without correction
    pub linear_slop: f32,

    /// Largest positional correction applied in a single iteration
    pub max_correction: f32,

    /// Relative normal velocity below which restitution is ignored
    pub velocity_threshold: f32,

    /// Whether accumulated forces are cleared at the end of each step
    pub auto_clear_forces: bool,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            velocity_iterations: 8,
            position_iterations: 3,
            warm_starting: true,
            allow_sleeping: true,
            linear_sleep_tolerance: 0.01,
            angular_sleep_tolerance: 2.0f32.to_radians(),
            time_to_sleep: 0.5,
            max_lin_velocity: 400.0,
            max_ang_velocity: 15.0,
            baumgarte: 0.2,
            linear_slop: 0.005,
            max_correction: 0.2,
            velocity_threshold: 1.0,
            auto_clear_forces: true,
        }
    }
}

impl StepConfig {
    /// Validates the configuration, returning an error describing the first
    /// rejected tunable.
    pub fn validate(&self) -> Result<()> {
        if self.velocity_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "velocity_iterations must be at least 1".into(),
            ));
        }
        if self.position_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "position_iterations must be at least 1".into(),
            ));
        }
        if self.linear_sleep_tolerance < 0.0 || self.angular_sleep_tolerance < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "sleep tolerances must be non-negative".into(),
            ));
        }
        if self.time_to_sleep <= 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "time_to_sleep must be positive".into(),
            ));
        }
        if self.max_lin_velocity <= 0.0 || self.max_ang_velocity <= 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "velocity caps must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.baumgarte) {
            return Err(PhysicsError::InvalidConfig(
                "baumgarte must lie in [0, 1]".into(),
            ));
        }
        if self.velocity_threshold < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "velocity_threshold must be non-negative".into(),
            ));
        }
        if self.linear_slop < 0.0 || self.max_correction <= 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "linear_slop must be non-negative and max_correction positive".into(),
            ));
        }
        Ok(())
    }
}
