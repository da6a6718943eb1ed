//! Analytic two-body propagation in universal variables

use super::{PropagationError, Propagator};
use crate::physics::math::{Instant, Scalar, Vector, stumpff_c2_c3};
use crate::physics::orbit::{KeplerianElements, OrbitState};

const MAX_ITERATIONS: usize = 50;

/// Keplerian orbit about a central body
///
/// Every query is solved directly from the reference state, so results do not
/// depend on the order or number of earlier queries.
#[derive(Debug, Clone)]
pub struct KeplerianPropagator {
    reference: OrbitState,
    mu: Scalar,
}

impl KeplerianPropagator {
    pub fn new(reference: OrbitState, mu: Scalar) -> Result<Self, PropagationError> {
        if !reference.is_finite() || reference.position.length() <= 0.0 {
            return Err(PropagationError::InvalidElements(format!(
                "reference state must be finite and off the central body: {reference:?}"
            )));
        }
        if !mu.is_finite() || mu <= 0.0 {
            return Err(PropagationError::InvalidElements(format!(
                "gravitational parameter must be positive, got {mu}"
            )));
        }

        Ok(Self { reference, mu })
    }

    pub fn from_elements(
        elements: &KeplerianElements,
        mu: Scalar,
        epoch: Instant,
    ) -> Result<Self, PropagationError> {
        let reference = elements.to_state(mu, epoch).ok_or_else(|| {
            PropagationError::InvalidElements(format!(
                "elements do not describe an elliptic orbit: {elements:?}"
            ))
        })?;
        Self::new(reference, mu)
    }

    pub fn reference(&self) -> &OrbitState {
        &self.reference
    }

    pub fn mu(&self) -> Scalar {
        self.mu
    }
}

impl Propagator for KeplerianPropagator {
    fn name(&self) -> &str {
        "keplerian"
    }

    fn state_at(&mut self, instant: Instant) -> Result<OrbitState, PropagationError> {
        let dt = instant - self.reference.instant;
        if dt == 0.0 {
            return Ok(OrbitState { instant, ..self.reference });
        }

        let (position, velocity) =
            universal_kepler(self.reference.position, self.reference.velocity, dt, self.mu)?;
        let state = OrbitState::new(instant, position, velocity);

        if !state.is_finite() {
            return Err(PropagationError::NonFinite { instant });
        }

        Ok(state)
    }
}

/// Propagates `(r0, v0)` by `dt` with the universal-variable Kepler equation
/// and Lagrange coefficients.
fn universal_kepler(
    r0: Vector,
    v0: Vector,
    dt: Scalar,
    mu: Scalar,
) -> Result<(Vector, Vector), PropagationError> {
    let r0_mag = r0.length();
    let rdotv = r0.dot(v0);
    let sqrt_mu = libm::sqrt(mu);

    // alpha = 1/a, negative for hyperbolic orbits
    let alpha = 2.0 / r0_mag - v0.length_squared() / mu;

    let mut chi = if alpha > 1e-12 / r0_mag {
        sqrt_mu * dt * alpha
    } else if alpha < -1e-12 / r0_mag {
        let a = 1.0 / alpha;
        let sign_dt = dt.signum();
        sign_dt
            * libm::sqrt(-a)
            * libm::log(
                (-2.0 * mu * alpha * dt)
                    / (rdotv + sign_dt * libm::sqrt(-mu * a) * (1.0 - r0_mag * alpha)),
            )
    } else {
        sqrt_mu * dt / r0_mag
    };

    let tolerance = 1e-12 * chi.abs().max(1.0);
    let mut converged = false;

    for _ in 0..MAX_ITERATIONS {
        let chi2 = chi * chi;
        let psi = alpha * chi2;
        let (c2, c3) = stumpff_c2_c3(psi);

        let r = chi2 * c2 + rdotv / sqrt_mu * chi * (1.0 - psi * c3) + r0_mag * (1.0 - psi * c2);
        let f_val = r0_mag * chi * (1.0 - psi * c3) + rdotv / sqrt_mu * chi2 * c2
            + chi2 * chi * c3
            - sqrt_mu * dt;

        let delta = f_val / r;
        chi -= delta;

        if !chi.is_finite() {
            break;
        }
        if delta.abs() < tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(PropagationError::Diverged(format!(
            "universal Kepler equation did not converge for dt = {dt} s"
        )));
    }

    let chi2 = chi * chi;
    let psi = alpha * chi2;
    let (c2, c3) = stumpff_c2_c3(psi);

    let r_mag = chi2 * c2 + rdotv / sqrt_mu * chi * (1.0 - psi * c3) + r0_mag * (1.0 - psi * c2);

    let f = 1.0 - chi2 / r0_mag * c2;
    let g = dt - chi2 * chi / sqrt_mu * c3;
    let f_dot = sqrt_mu / (r_mag * r0_mag) * chi * (psi * c3 - 1.0);
    let g_dot = 1.0 - chi2 / r_mag * c2;

    Ok((r0 * f + v0 * g, r0 * f_dot + v0 * g_dot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::math::{ASTRONOMICAL_UNIT, MU_SUN};

    fn earth_like() -> KeplerianPropagator {
        let speed = (MU_SUN / ASTRONOMICAL_UNIT).sqrt();
        let reference = OrbitState::new(
            0.0,
            Vector::new(ASTRONOMICAL_UNIT, 0.0, 0.0),
            Vector::new(0.0, speed, 0.0),
        );
        KeplerianPropagator::new(reference, MU_SUN).unwrap()
    }

    #[test]
    fn test_circular_orbit_quarter_period() {
        let mut propagator = earth_like();
        let period = 2.0 * std::f64::consts::PI * (ASTRONOMICAL_UNIT.powi(3) / MU_SUN).sqrt();

        let state = propagator.state_at(period / 4.0).unwrap();
        assert!((state.position - Vector::new(0.0, ASTRONOMICAL_UNIT, 0.0)).length() < 1.0e3);

        let state = propagator.state_at(period).unwrap();
        assert!((state.position - Vector::new(ASTRONOMICAL_UNIT, 0.0, 0.0)).length() < 1.0e3);
    }

    #[test]
    fn test_backward_propagation_inverts_forward() {
        let mut propagator = earth_like();
        let forward = propagator.state_at(86_400.0 * 30.0).unwrap();

        let mut from_forward = KeplerianPropagator::new(forward, MU_SUN).unwrap();
        let back = from_forward.state_at(0.0).unwrap();

        assert!((back.position - propagator.reference().position).length() < 1.0);
        assert!((back.velocity - propagator.reference().velocity).length() < 1e-6);
    }

    #[test]
    fn test_hyperbolic_flyby_conserves_energy() {
        let mu = 3.986_004_418e14;
        let reference = OrbitState::new(
            0.0,
            Vector::new(7.0e6, 0.0, 0.0),
            Vector::new(0.0, 12_000.0, 0.0),
        );
        let mut propagator = KeplerianPropagator::new(reference, mu).unwrap();
        let energy = reference.specific_energy(mu);
        assert!(energy > 0.0);

        for dt in [-3600.0, 600.0, 7200.0] {
            let state = propagator.state_at(dt).unwrap();
            let relative = (state.specific_energy(mu) - energy).abs() / energy;
            assert!(relative < 1e-8, "energy error {relative} at dt = {dt}");
        }
    }

    #[test]
    fn test_queries_are_order_independent() {
        let mut a = earth_like();
        let mut b = earth_like();

        let late_first = (a.state_at(1.0e6).unwrap(), a.state_at(10.0).unwrap());
        let early_first = (b.state_at(10.0).unwrap(), b.state_at(1.0e6).unwrap());

        assert_eq!(late_first.0, early_first.1);
        assert_eq!(late_first.1, early_first.0);
    }

    #[test]
    fn test_invalid_reference_rejected() {
        let at_origin = OrbitState::new(0.0, Vector::ZERO, Vector::Y);
        assert!(KeplerianPropagator::new(at_origin, MU_SUN).is_err());

        let valid = *earth_like().reference();
        assert!(KeplerianPropagator::new(valid, 0.0).is_err());
    }
}
