//! Step-wise integration of the central-body field

use super::{PropagationError, Propagator};
use crate::physics::integrators::{CentralGravity, Integrator};
use crate::physics::math::{Instant, Scalar};
use crate::physics::orbit::OrbitState;

/// Integrates a single body about a central mass with a fixed maximum step
///
/// The body's state is carried between queries, so moving forward through a
/// schedule only integrates each stretch once. Steps are shortened to land
/// exactly on the requested instant.
pub struct NumericalPropagator {
    integrator: Box<dyn Integrator>,
    field: CentralGravity,
    max_step: Scalar,
    reference: OrbitState,
    current: OrbitState,
}

impl NumericalPropagator {
    pub fn new(
        reference: OrbitState,
        mu: Scalar,
        integrator: Box<dyn Integrator>,
        max_step: Scalar,
    ) -> Result<Self, PropagationError> {
        if !reference.is_finite() {
            return Err(PropagationError::InvalidElements(format!(
                "reference state must be finite: {reference:?}"
            )));
        }
        if !max_step.is_finite() || max_step <= 0.0 {
            return Err(PropagationError::InvalidElements(format!(
                "maximum step must be positive, got {max_step}"
            )));
        }

        Ok(Self {
            integrator,
            field: CentralGravity::new(mu),
            max_step,
            reference,
            current: reference,
        })
    }

    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    pub fn max_step(&self) -> Scalar {
        self.max_step
    }

    /// Returns the body to its reference state.
    pub fn reset(&mut self) {
        self.current = self.reference;
    }
}

impl Propagator for NumericalPropagator {
    fn name(&self) -> &str {
        "numerical"
    }

    fn state_at(&mut self, instant: Instant) -> Result<OrbitState, PropagationError> {
        if !instant.is_finite() {
            return Err(PropagationError::NonFinite { instant });
        }

        let mut position = self.current.position;
        let mut velocity = self.current.velocity;
        let mut t = self.current.instant;

        while t != instant {
            let remaining = instant - t;
            let dt = remaining.signum() * remaining.abs().min(self.max_step);

            self.integrator
                .step(&mut position, &mut velocity, &self.field, dt);

            t = if remaining.abs() <= self.max_step {
                instant
            } else {
                t + dt
            };

            if !position.is_finite() || !velocity.is_finite() {
                return Err(PropagationError::NonFinite { instant: t });
            }
        }

        self.current = OrbitState::new(instant, position, velocity);
        Ok(self.current)
    }
}
