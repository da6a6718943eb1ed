//! Calendar rendering of campaign instants

use crate::physics::math::{Instant, Scalar};
use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

const EPOCH_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Calendar date (TDB) that campaign instants are measured from
///
/// Chrono has no notion of TDB, so the date is kept naive and every instant is
/// an exact offset from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceEpoch(NaiveDateTime);

impl ReferenceEpoch {
    pub fn new(date: NaiveDateTime) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDateTime {
        self.0
    }

    /// Calendar date of `instant` seconds after the epoch, to the nearest
    /// nanosecond. `None` when the date falls outside chrono's range.
    pub fn at(&self, instant: Instant) -> Option<NaiveDateTime> {
        if !instant.is_finite() {
            return None;
        }

        let nanos = libm::round(instant * 1e9);
        let offset = if nanos.abs() < i64::MAX as Scalar {
            Duration::nanoseconds(nanos as i64)
        } else {
            Duration::try_seconds(libm::round(instant) as i64)?
        };
        self.0.checked_add_signed(offset)
    }

    pub fn format(&self, instant: Instant) -> String {
        match self.at(instant) {
            Some(date) => date.format(EPOCH_FORMAT).to_string(),
            None => format!("{self} {instant:+} s"),
        }
    }
}

impl FromStr for ReferenceEpoch {
    type Err = chrono::ParseError;

    /// Accepts `YYYY-MM-DDTHH:MM:SS` with optional fractional seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S%.f").map(Self)
    }
}

impl fmt::Display for ReferenceEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(EPOCH_FORMAT))
    }
}
