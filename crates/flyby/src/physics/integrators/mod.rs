//! Fixed-step integrators for the numerical propagator

use crate::physics::math::{Scalar, Vector};

pub mod registry;
pub mod runge_kutta;
pub mod velocity_verlet;

pub use runge_kutta::RungeKuttaFourthOrder;
pub use velocity_verlet::VelocityVerlet;

/// Acceleration as a function of position
pub trait AccelerationField {
    fn at(&self, position: Vector) -> Vector;
}

/// Point-mass gravity of a central body at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralGravity {
    pub mu: Scalar,
}

impl CentralGravity {
    pub fn new(mu: Scalar) -> Self {
        Self { mu }
    }
}

impl AccelerationField for CentralGravity {
    fn at(&self, position: Vector) -> Vector {
        let r = position.length();
        if r > 0.0 {
            -position * (self.mu / (r * r * r))
        } else {
            Vector::ZERO
        }
    }
}

/// Single-body integrator advancing position and velocity by one step
pub trait Integrator: Send + Sync {
    fn clone_box(&self) -> Box<dyn Integrator>;

    fn step(
        &self,
        position: &mut Vector,
        velocity: &mut Vector,
        field: &dyn AccelerationField,
        dt: Scalar,
    );

    fn convergence_order(&self) -> usize;

    /// Canonical name used in configuration files
    fn name(&self) -> &'static str;

    fn aliases(&self) -> Vec<&'static str> {
        Vec::new()
    }
}
