//! Trajectory propagation behind a narrow interface
//!
//! The sampling and geometry code only needs two capabilities from an orbit
//! propagator: advancing a state to an instant, and firing a detector at
//! scheduled instants while doing so. [`Propagator`] captures exactly that, so
//! an analytic two-body model and a numerical integrator are interchangeable.

use crate::physics::math::{Instant, Scalar};
use crate::physics::orbit::OrbitState;
use crate::sampling::SampleSchedule;
use std::fmt;

pub mod kepler;
pub mod numerical;

pub use kepler::KeplerianPropagator;
pub use numerical::NumericalPropagator;

#[derive(Debug, Clone, PartialEq)]
pub enum PropagationError {
    /// The propagated state stopped being finite
    NonFinite { instant: Instant },
    /// A detector was fired at an instant it was not waiting for
    EventMismatch {
        expected: Instant,
        actual: Instant,
        tolerance: Scalar,
    },
    /// An iterative solver failed to converge
    Diverged(String),
    /// The initial orbit could not be constructed
    InvalidElements(String),
}

impl fmt::Display for PropagationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationError::NonFinite { instant } => {
                write!(f, "Propagated state became non-finite at t = {instant} s")
            }
            PropagationError::EventMismatch {
                expected,
                actual,
                tolerance,
            } => write!(
                f,
                "Detector fired at t = {actual} s but was waiting for t = {expected} s \
                 (tolerance {tolerance} s)"
            ),
            PropagationError::Diverged(msg) => write!(f, "Propagation diverged: {msg}"),
            PropagationError::InvalidElements(msg) => write!(f, "Invalid orbit: {msg}"),
        }
    }
}

impl std::error::Error for PropagationError {}

/// What the propagator should do after an event has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventAction {
    #[default]
    Continue,
    Stop,
}

/// Receives the propagated state each time its detector fires
pub trait EventHandler {
    fn on_event(&mut self, state: &OrbitState) -> EventAction;
}

/// Scheduled-instant event source consulted by [`Propagator::propagate`]
pub trait EventDetector {
    /// The next instant this detector wants to be fired at, if any
    fn pending(&self) -> Option<Instant>;

    /// Distance within which a firing matches the pending instant
    fn tolerance(&self) -> Scalar;

    fn event_occurred(&mut self, state: &OrbitState) -> Result<EventAction, PropagationError>;
}

/// Fires its handler once at each instant of a [`SampleSchedule`]
///
/// The detector keeps a cursor into the schedule. A firing always matches the
/// instant under the cursor and advances it, so no instant is handled twice and
/// none is skipped while the run continues.
#[derive(Debug, Clone)]
pub struct DateDetector<H> {
    schedule: SampleSchedule,
    cursor: usize,
    handler: H,
}

impl<H: EventHandler> DateDetector<H> {
    pub fn new(schedule: SampleSchedule, handler: H) -> Self {
        Self {
            schedule,
            cursor: 0,
            handler,
        }
    }

    pub fn schedule(&self) -> &SampleSchedule {
        &self.schedule
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Number of instants already fired
    pub fn fired(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.schedule.len()
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}

impl<H: EventHandler> EventDetector for DateDetector<H> {
    fn pending(&self) -> Option<Instant> {
        self.schedule.get(self.cursor)
    }

    fn tolerance(&self) -> Scalar {
        self.schedule.tolerance()
    }

    fn event_occurred(&mut self, state: &OrbitState) -> Result<EventAction, PropagationError> {
        let Some(expected) = self.pending() else {
            return Ok(EventAction::Continue);
        };

        let tolerance = self.tolerance();
        if (state.instant - expected).abs() > tolerance {
            return Err(PropagationError::EventMismatch {
                expected,
                actual: state.instant,
                tolerance,
            });
        }

        self.cursor += 1;
        Ok(self.handler.on_event(state))
    }
}

pub trait Propagator {
    fn name(&self) -> &str;

    /// State of the propagated body at `instant`
    fn state_at(&mut self, instant: Instant) -> Result<OrbitState, PropagationError>;

    /// Propagates from `from` to `to`, firing `detector` at each of its pending
    /// instants that fall inside the run.
    ///
    /// Instants within the detector tolerance of either end still count as
    /// inside. Instants before `from` are left pending. The detector is always
    /// fired with the state at the exact scheduled instant. Returns the state
    /// at `to`, or at the stopping event if the detector asked to stop.
    fn propagate(
        &mut self,
        from: Instant,
        to: Instant,
        detector: &mut dyn EventDetector,
    ) -> Result<OrbitState, PropagationError> {
        let tolerance = detector.tolerance();
        let mut state = self.state_at(from)?;

        while let Some(instant) = detector.pending() {
            if instant < from - tolerance || instant > to + tolerance {
                break;
            }

            state = self.state_at(instant)?;
            if !state.is_finite() {
                return Err(PropagationError::NonFinite { instant });
            }

            if detector.event_occurred(&state)? == EventAction::Stop {
                return Ok(state);
            }
        }

        if state.instant != to {
            state = self.state_at(to)?;
        }

        if !state.is_finite() {
            return Err(PropagationError::NonFinite { instant: to });
        }

        Ok(state)
    }
}
