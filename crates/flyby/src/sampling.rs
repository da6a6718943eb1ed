//! Encounter time sampling
//!
//! A [`SampleSchedule`] is the ordered set of instants at which both bodies'
//! states are harvested. The sinh warp reparameterises a uniform grid so the
//! instants bunch up around the window midpoint, which the campaign places on
//! closest approach.

use crate::physics::math::{Instant, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound on the event matching tolerance, in seconds
pub const MIN_MATCH_TOLERANCE: Scalar = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    InvalidSchedule(String),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidSchedule(msg) => write!(f, "Invalid sample schedule: {msg}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: Instant,
    pub end: Instant,
}

impl TimeWindow {
    pub fn new(start: Instant, end: Instant) -> Result<Self, ScheduleError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(ScheduleError::InvalidSchedule(format!(
                "window bounds must be finite, got [{start}, {end}]"
            )));
        }
        if end <= start {
            return Err(ScheduleError::InvalidSchedule(format!(
                "window end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of `duration` seconds centred on `center`
    pub fn centered(center: Instant, duration: Scalar) -> Result<Self, ScheduleError> {
        Self::new(center - duration / 2.0, center + duration / 2.0)
    }

    pub fn duration(&self) -> Scalar {
        self.end - self.start
    }

    pub fn midpoint(&self) -> Instant {
        self.start + self.duration() / 2.0
    }
}

/// How sample instants are spaced across the window
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplePolicy {
    Linear,
    /// Denser near the midpoint; larger factors concentrate harder
    SinhWarp { factor: Scalar },
}

impl fmt::Display for SamplePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplePolicy::Linear => write!(f, "linear"),
            SamplePolicy::SinhWarp { factor } => write!(f, "sinh warp (factor {factor})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleSchedule {
    window: TimeWindow,
    policy: SamplePolicy,
    instants: Vec<Instant>,
    tolerance: Scalar,
}

impl SampleSchedule {
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn policy(&self) -> SamplePolicy {
        self.policy
    }

    pub fn instants(&self) -> &[Instant] {
        &self.instants
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Instant> {
        self.instants.get(index).copied()
    }

    /// Half the effective minimum spacing, floored at [`MIN_MATCH_TOLERANCE`].
    ///
    /// A propagator firing counts as the pending instant when it lands within
    /// this distance of it.
    pub fn tolerance(&self) -> Scalar {
        self.tolerance
    }

    /// Offset of each instant from the window midpoint
    pub fn offsets_from_midpoint(&self) -> impl Iterator<Item = Scalar> + '_ {
        let midpoint = self.window.midpoint();
        self.instants.iter().map(move |instant| instant - midpoint)
    }
}

pub fn build_schedule(
    start: Instant,
    end: Instant,
    steps: usize,
    policy: SamplePolicy,
) -> Result<SampleSchedule, ScheduleError> {
    let window = TimeWindow::new(start, end)?;
    build_schedule_for(window, steps, policy)
}

pub fn build_schedule_for(
    window: TimeWindow,
    steps: usize,
    policy: SamplePolicy,
) -> Result<SampleSchedule, ScheduleError> {
    if steps < 2 {
        return Err(ScheduleError::InvalidSchedule(format!(
            "at least 2 steps are needed to span a window, got {steps}"
        )));
    }

    let duration = window.duration();
    let dt = duration / (steps - 1) as Scalar;

    let (offsets, dtout): (Vec<Scalar>, Scalar) = match policy {
        SamplePolicy::Linear => ((0..steps).map(|i| i as Scalar * dt).collect(), dt),
        SamplePolicy::SinhWarp { factor } => {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ScheduleError::InvalidSchedule(format!(
                    "sinh warp factor must be positive and finite, got {factor}"
                )));
            }

            let halfdur = duration / 2.0;
            let sinh_factor = libm::sinh(factor);
            let offsets = (0..steps)
                .map(|i| {
                    let t = i as Scalar * dt;
                    halfdur + libm::sinh((t - halfdur) * factor / halfdur) * halfdur / sinh_factor
                })
                .collect();
            let dtout = duration * libm::sinh(factor / steps as Scalar) / sinh_factor;

            (offsets, dtout)
        }
    };

    let mut instants: Vec<Instant> = offsets
        .into_iter()
        .map(|offset| window.start + offset)
        .collect();

    // Rounding must not push the ends outside the window.
    instants[0] = window.start;
    instants[steps - 1] = window.end;

    if let Some(pair) = instants.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(ScheduleError::InvalidSchedule(format!(
            "{policy} sampling collapsed adjacent instants {} and {}; \
             lower the factor or the step count",
            pair[0], pair[1]
        )));
    }

    Ok(SampleSchedule {
        window,
        policy,
        instants,
        tolerance: (dtout / 2.0).max(MIN_MATCH_TOLERANCE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Scalar, expected: Scalar, tolerance: Scalar) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_linear_five_steps() {
        let schedule = build_schedule(0.0, 100.0, 5, SamplePolicy::Linear).unwrap();
        assert_eq!(schedule.instants(), &[0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_close(schedule.tolerance(), 12.5, 1e-12);
    }

    #[test]
    fn test_sinh_warp_five_steps() {
        let schedule =
            build_schedule(0.0, 100.0, 5, SamplePolicy::SinhWarp { factor: 10.0 }).unwrap();
        let instants = schedule.instants();

        assert!(instants.windows(2).all(|pair| pair[1] > pair[0]));
        assert_close(instants[2], 50.0, 1e-9);
        assert!(instants[2] - instants[1] < instants[1] - instants[0]);
    }

    #[test]
    fn test_sinh_warp_is_symmetric_about_midpoint() {
        let schedule =
            build_schedule(-60.0, 60.0, 11, SamplePolicy::SinhWarp { factor: 3.0 }).unwrap();
        let offsets: Vec<Scalar> = schedule.offsets_from_midpoint().collect();

        for i in 0..offsets.len() {
            assert_close(offsets[i], -offsets[offsets.len() - 1 - i], 1e-9);
        }
    }

    #[test]
    fn test_sinh_tolerance_is_floored() {
        // dtout = 120 * sinh(1) / sinh(10) is about 0.013 s
        let schedule =
            build_schedule(-60.0, 60.0, 10, SamplePolicy::SinhWarp { factor: 10.0 }).unwrap();
        assert_eq!(schedule.tolerance(), MIN_MATCH_TOLERANCE);
    }

    #[test]
    fn test_sinh_tolerance_from_effective_spacing() {
        let duration = 1.0e6;
        let steps = 100;
        let factor = 2.0;
        let schedule =
            build_schedule(0.0, duration, steps, SamplePolicy::SinhWarp { factor }).unwrap();

        let dtout = duration * (factor / steps as Scalar).sinh() / factor.sinh();
        assert_close(schedule.tolerance(), dtout / 2.0, 1e-6);
    }

    #[test]
    fn test_degenerate_inputs_rejected_for_both_policies() {
        for policy in [SamplePolicy::Linear, SamplePolicy::SinhWarp { factor: 5.0 }] {
            assert!(matches!(
                build_schedule(0.0, 10.0, 1, policy),
                Err(ScheduleError::InvalidSchedule(_))
            ));
            assert!(matches!(
                build_schedule(0.0, 10.0, 0, policy),
                Err(ScheduleError::InvalidSchedule(_))
            ));
            assert!(matches!(
                build_schedule(10.0, 10.0, 5, policy),
                Err(ScheduleError::InvalidSchedule(_))
            ));
            assert!(matches!(
                build_schedule(10.0, 0.0, 5, policy),
                Err(ScheduleError::InvalidSchedule(_))
            ));
            assert!(matches!(
                build_schedule(Scalar::NAN, 0.0, 5, policy),
                Err(ScheduleError::InvalidSchedule(_))
            ));
        }
    }

    #[test]
    fn test_non_positive_factor_rejected() {
        for factor in [0.0, -1.0, Scalar::INFINITY] {
            assert!(build_schedule(0.0, 1.0, 5, SamplePolicy::SinhWarp { factor }).is_err());
        }
    }

    #[test]
    fn test_window_helpers() {
        let window = TimeWindow::centered(0.0, 120.0).unwrap();
        assert_eq!(window.start, -60.0);
        assert_eq!(window.end, 60.0);
        assert_eq!(window.midpoint(), 0.0);
        assert!(TimeWindow::centered(0.0, 0.0).is_err());
    }

    #[test]
    fn test_policy_serde_tags() {
        let linear: SamplePolicy = toml::from_str("kind = \"linear\"").unwrap();
        assert_eq!(linear, SamplePolicy::Linear);

        let warp: SamplePolicy = toml::from_str("kind = \"sinh_warp\"\nfactor = 7.5").unwrap();
        assert_eq!(warp, SamplePolicy::SinhWarp { factor: 7.5 });
    }
}
