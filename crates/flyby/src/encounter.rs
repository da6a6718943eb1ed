//! Spacecraft placement relative to the asteroid at closest approach

use crate::physics::math::{Scalar, Vector};
use crate::physics::orbit::OrbitState;
use crate::propagation::PropagationError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tilt of the terminator pass away from the sunward direction
const TERMINATOR_SUNWARD_TILT: Scalar = -0.15;

/// Where the spacecraft passes the asteroid at closest approach
#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncounterSide {
    /// Above the orbital plane, slightly behind the asteroid, looking across
    /// the day/night boundary
    #[default]
    Terminator,
    /// Between the asteroid and the Sun
    #[value(name = "sunny")]
    SunnySide,
    /// On the far side of the asteroid from the Sun
    #[value(name = "dark")]
    DarkSide,
}

impl EncounterSide {
    /// Suffix used in output series names
    pub fn series_suffix(&self) -> &'static str {
        match self {
            EncounterSide::Terminator => "terminator",
            EncounterSide::SunnySide => "sunnyside",
            EncounterSide::DarkSide => "darkside",
        }
    }

    /// Offset from the asteroid to the spacecraft for an asteroid at
    /// `asteroid_position` and a pass at `distance`
    pub fn offset(&self, asteroid_position: Vector, distance: Scalar) -> Option<Vector> {
        let outward = asteroid_position.try_normalize()?;

        let direction = match self {
            EncounterSide::SunnySide => -outward,
            EncounterSide::DarkSide => outward,
            EncounterSide::Terminator => {
                (outward * TERMINATOR_SUNWARD_TILT + Vector::Z).try_normalize()?
            }
        };

        Some(direction * distance)
    }
}

impl fmt::Display for EncounterSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.series_suffix())
    }
}

/// Spacecraft state at closest approach
///
/// The spacecraft sits `distance` metres from the asteroid on the chosen side
/// and moves along the asteroid's velocity, `relative_speed` slower.
pub fn spacecraft_state(
    asteroid: &OrbitState,
    side: EncounterSide,
    distance: Scalar,
    relative_speed: Scalar,
) -> Result<OrbitState, PropagationError> {
    if !distance.is_finite() || distance <= 0.0 {
        return Err(PropagationError::InvalidElements(format!(
            "encounter distance must be positive, got {distance}"
        )));
    }
    if !relative_speed.is_finite() {
        return Err(PropagationError::InvalidElements(format!(
            "relative speed must be finite, got {relative_speed}"
        )));
    }

    let offset = side.offset(asteroid.position, distance).ok_or_else(|| {
        PropagationError::InvalidElements(format!(
            "cannot place a {side} pass around an asteroid at {}",
            asteroid.position
        ))
    })?;

    let speed = asteroid.velocity.length();
    if speed <= 0.0 {
        return Err(PropagationError::InvalidElements(
            "asteroid must be moving at closest approach".to_string(),
        ));
    }

    Ok(OrbitState::new(
        asteroid.instant,
        asteroid.position + offset,
        asteroid.velocity * ((speed - relative_speed) / speed),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asteroid() -> OrbitState {
        OrbitState::new(
            0.0,
            Vector::new(2.0e11, 0.0, 0.0),
            Vector::new(0.0, 25_000.0, 0.0),
        )
    }

    #[test]
    fn test_sunny_side_is_sunward() {
        let sc = spacecraft_state(&asteroid(), EncounterSide::SunnySide, 3.0e5, 10_000.0).unwrap();
        assert_eq!(sc.position, Vector::new(2.0e11 - 3.0e5, 0.0, 0.0));
        assert!(sc.position.length() < asteroid().position.length());
    }

    #[test]
    fn test_dark_side_is_behind() {
        let sc = spacecraft_state(&asteroid(), EncounterSide::DarkSide, 3.0e5, 10_000.0).unwrap();
        assert_eq!(sc.position, Vector::new(2.0e11 + 3.0e5, 0.0, 0.0));
    }

    #[test]
    fn test_terminator_offset() {
        let offset = EncounterSide::Terminator
            .offset(asteroid().position, 3.0e5)
            .unwrap();

        assert!((offset.length() - 3.0e5).abs() < 1e-6);
        let expected = Vector::new(-0.15, 0.0, 1.0).normalize() * 3.0e5;
        assert!((offset - expected).length() < 1e-6);

        // Heliocentric positions near 2e11 m resolve to about 3e-5 m.
        let sc = spacecraft_state(&asteroid(), EncounterSide::Terminator, 3.0e5, 10_000.0).unwrap();
        assert!((sc.position - asteroid().position - expected).length() < 1e-3);
    }

    #[test]
    fn test_velocity_reduced_by_relative_speed() {
        let sc = spacecraft_state(&asteroid(), EncounterSide::Terminator, 3.0e5, 10_000.0).unwrap();
        assert_eq!(sc.velocity, Vector::new(0.0, 15_000.0, 0.0));
        assert!(((asteroid().velocity - sc.velocity).length() - 10_000.0).abs() < 1e-9);
        assert_eq!(sc.instant, asteroid().instant);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(spacecraft_state(&asteroid(), EncounterSide::DarkSide, 0.0, 1.0).is_err());

        let resting = OrbitState::new(0.0, Vector::X, Vector::ZERO);
        assert!(spacecraft_state(&resting, EncounterSide::DarkSide, 1.0, 1.0).is_err());

        let at_sun = OrbitState::new(0.0, Vector::ZERO, Vector::Y);
        assert!(spacecraft_state(&at_sun, EncounterSide::SunnySide, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_side_names() {
        assert_eq!(EncounterSide::SunnySide.series_suffix(), "sunnyside");
        assert_eq!(EncounterSide::DarkSide.to_string(), "darkside");

        let side = EncounterSide::from_str("sunny", true).unwrap();
        assert_eq!(side, EncounterSide::SunnySide);

        let parsed: EncounterSide = serde_json::from_str("\"dark_side\"").unwrap();
        assert_eq!(parsed, EncounterSide::DarkSide);
    }
}
