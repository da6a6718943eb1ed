//! Velocity Verlet integration method

use super::{AccelerationField, Integrator};
use crate::physics::math::{Scalar, Vector};

/// Velocity Verlet integrator
///
/// Second-order and symplectic, so orbital energy oscillates instead of
/// drifting over long baselines.
///
/// 1. x(t+dt) = x(t) + v(t)*dt + 0.5*a(t)*dt²
/// 2. v(t+dt) = v(t) + 0.5*(a(t) + a(t+dt))*dt
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityVerlet;

impl Integrator for VelocityVerlet {
    fn clone_box(&self) -> Box<dyn Integrator> {
        Box::new(*self)
    }

    fn step(
        &self,
        position: &mut Vector,
        velocity: &mut Vector,
        field: &dyn AccelerationField,
        dt: Scalar,
    ) {
        let acceleration = field.at(*position);
        *position += *velocity * dt + acceleration * (0.5 * dt * dt);
        let next_acceleration = field.at(*position);
        *velocity += (acceleration + next_acceleration) * (0.5 * dt);
    }

    fn convergence_order(&self) -> usize {
        2
    }

    fn name(&self) -> &'static str {
        "velocity_verlet"
    }

    fn aliases(&self) -> Vec<&'static str> {
        vec!["verlet"]
    }
}
