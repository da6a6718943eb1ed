//! Numeric types and constants shared by propagation and geometry

/// Scalar type for physics calculations (f64 for precision)
pub type Scalar = f64;

/// 3D vector type for positions and velocities, in metres and metres/second
pub type Vector = bevy::math::DVec3;

/// Attitude quaternion type
pub type Quaternion = bevy::math::DQuat;

/// Seconds of TDB measured from the campaign reference epoch
pub type Instant = Scalar;

/// Heliocentric gravitational parameter (m³/s²)
pub const MU_SUN: Scalar = 1.327_124_400_18e20;

/// IAU 2012 astronomical unit (m)
pub const ASTRONOMICAL_UNIT: Scalar = 149_597_870_700.0;

pub const SECONDS_PER_DAY: Scalar = 86_400.0;

/// Stumpff functions c2(psi) and c3(psi) for universal-variable propagation.
///
/// Near zero the closed forms lose precision, so the series expansions are
/// used instead.
pub fn stumpff_c2_c3(psi: Scalar) -> (Scalar, Scalar) {
    if psi > 1e-6 {
        let sqrt_psi = libm::sqrt(psi);
        (
            (1.0 - libm::cos(sqrt_psi)) / psi,
            (sqrt_psi - libm::sin(sqrt_psi)) / (psi * sqrt_psi),
        )
    } else if psi < -1e-6 {
        let sqrt_neg_psi = libm::sqrt(-psi);
        (
            (1.0 - libm::cosh(sqrt_neg_psi)) / psi,
            (libm::sinh(sqrt_neg_psi) - sqrt_neg_psi) / (-psi * sqrt_neg_psi),
        )
    } else {
        (
            1.0 / 2.0 - psi / 24.0 + psi * psi / 720.0,
            1.0 / 6.0 - psi / 120.0 + psi * psi / 5040.0,
        )
    }
}

/// Formats a vector as space separated decimals with a fixed number of
/// fractional digits.
pub fn format_vector(vector: Vector, precision: usize) -> String {
    format!(
        "{:.p$} {:.p$} {:.p$}",
        vector.x,
        vector.y,
        vector.z,
        p = precision
    )
}
