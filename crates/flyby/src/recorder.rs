//! Recording of propagated states at scheduled instants

use crate::physics::math::{Instant, Vector};
use crate::physics::orbit::OrbitState;
use crate::propagation::{EventAction, EventHandler};
use bevy::log::debug;

/// Position and velocity of one body at one scheduled instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateRecord {
    pub instant: Instant,
    pub position: Vector,
    pub velocity: Vector,
}

impl From<&OrbitState> for StateRecord {
    fn from(state: &OrbitState) -> Self {
        Self {
            instant: state.instant,
            position: state.position,
            velocity: state.velocity,
        }
    }
}

/// Append-only sink for the states a propagation run produces
///
/// One record per detector firing, in firing order. If the run fails midway,
/// whatever was recorded so far is left as is for the caller to keep or drop.
#[derive(Debug, Clone, Default)]
pub struct EncounterRecorder {
    label: String,
    records: Vec<StateRecord>,
}

impl EncounterRecorder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            records: Vec::new(),
        }
    }

    pub fn with_capacity(label: impl Into<String>, capacity: usize) -> Self {
        Self {
            label: label.into(),
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn records(&self) -> &[StateRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StateRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventHandler for EncounterRecorder {
    fn on_event(&mut self, state: &OrbitState) -> EventAction {
        self.records.push(StateRecord::from(state));

        let events = self.records.len();
        if events % 100 == 0 {
            debug!("{}: t = {:.3} s, event {}", self.label, state.instant, events);
        }

        EventAction::Continue
    }
}
