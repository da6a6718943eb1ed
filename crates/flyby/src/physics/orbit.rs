//! Orbit state and classical element conversions

use crate::physics::math::{Instant, Scalar, Vector};
use serde::{Deserialize, Serialize};

/// Cartesian state of one body at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub instant: Instant,
    pub position: Vector,
    pub velocity: Vector,
}

impl OrbitState {
    pub fn new(instant: Instant, position: Vector, velocity: Vector) -> Self {
        Self {
            instant,
            position,
            velocity,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.instant.is_finite() && self.position.is_finite() && self.velocity.is_finite()
    }

    /// Specific orbital energy about a central body with parameter `mu`
    pub fn specific_energy(&self, mu: Scalar) -> Scalar {
        0.5 * self.velocity.length_squared() - mu / self.position.length()
    }
}

/// Classical Keplerian elements of an elliptic orbit
///
/// Distances in metres, angles in degrees. The mean anomaly is given at the
/// instant the elements are converted for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct KeplerianElements {
    pub semi_major_axis: Scalar,
    pub eccentricity: Scalar,
    pub inclination: Scalar,
    pub right_ascension_of_ascending_node: Scalar,
    pub argument_of_periapsis: Scalar,
    pub mean_anomaly: Scalar,
}

impl KeplerianElements {
    pub fn is_elliptic(&self) -> bool {
        self.semi_major_axis > 0.0 && (0.0..1.0).contains(&self.eccentricity)
    }

    /// Converts the elements to a Cartesian state at `instant`.
    ///
    /// Returns `None` for non-elliptic element sets.
    pub fn to_state(&self, mu: Scalar, instant: Instant) -> Option<OrbitState> {
        if !self.is_elliptic() || mu <= 0.0 {
            return None;
        }

        let a = self.semi_major_axis;
        let e = self.eccentricity;
        let eccentric_anomaly = solve_kepler_equation(self.mean_anomaly.to_radians(), e);
        let (sin_e, cos_e) = (libm::sin(eccentric_anomaly), libm::cos(eccentric_anomaly));

        let true_anomaly = libm::atan2(libm::sqrt(1.0 - e * e) * sin_e, cos_e - e);
        let radius = a * (1.0 - e * cos_e);
        let semi_latus_rectum = a * (1.0 - e * e);

        // Perifocal frame
        let r_pqw = Vector::new(
            radius * libm::cos(true_anomaly),
            radius * libm::sin(true_anomaly),
            0.0,
        );
        let v_factor = libm::sqrt(mu / semi_latus_rectum);
        let v_pqw = Vector::new(
            -v_factor * libm::sin(true_anomaly),
            v_factor * (e + libm::cos(true_anomaly)),
            0.0,
        );

        let rotation = perifocal_rotation(
            self.right_ascension_of_ascending_node.to_radians(),
            self.argument_of_periapsis.to_radians(),
            self.inclination.to_radians(),
        );

        Some(OrbitState::new(
            instant,
            rotation * r_pqw,
            rotation * v_pqw,
        ))
    }
}

/// Rotation from the perifocal frame to the reference frame
fn perifocal_rotation(raan: Scalar, aop: Scalar, inclination: Scalar) -> bevy::math::DMat3 {
    let (sin_raan, cos_raan) = (libm::sin(raan), libm::cos(raan));
    let (sin_aop, cos_aop) = (libm::sin(aop), libm::cos(aop));
    let (sin_i, cos_i) = (libm::sin(inclination), libm::cos(inclination));

    bevy::math::DMat3::from_cols(
        Vector::new(
            cos_raan * cos_aop - sin_raan * sin_aop * cos_i,
            sin_raan * cos_aop + cos_raan * sin_aop * cos_i,
            sin_aop * sin_i,
        ),
        Vector::new(
            -cos_raan * sin_aop - sin_raan * cos_aop * cos_i,
            -sin_raan * sin_aop + cos_raan * cos_aop * cos_i,
            cos_aop * sin_i,
        ),
        Vector::new(sin_raan * sin_i, -cos_raan * sin_i, cos_i),
    )
}

/// Newton iteration on M = E - e sin E
fn solve_kepler_equation(mean_anomaly: Scalar, eccentricity: Scalar) -> Scalar {
    let mut eccentric_anomaly = if eccentricity < 0.8 {
        mean_anomaly
    } else {
        std::f64::consts::PI
    };

    for _ in 0..50 {
        let f = eccentric_anomaly - eccentricity * libm::sin(eccentric_anomaly) - mean_anomaly;
        let df = 1.0 - eccentricity * libm::cos(eccentric_anomaly);
        let delta = f / df;
        eccentric_anomaly -= delta;
        if delta.abs() < 1e-14 {
            break;
        }
    }

    eccentric_anomaly
}
