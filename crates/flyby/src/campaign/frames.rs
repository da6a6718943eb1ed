//! Frame selection and pairing of the two bodies' records

use super::CampaignError;
use crate::geometry::{CameraGeometry, CameraIntrinsics, FieldOfView, GeometryError};
use crate::geometry::{camera_vectors, track_to};
use crate::physics::math::{Instant, Quaternion, Scalar, Vector};
use crate::recorder::StateRecord;
use crate::sampling::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::StepBy;
use std::ops::Range;
use std::str::FromStr;

/// Half-open, strided selection of frame indices
///
/// `end` is clamped to the number of frames, and `None` means all of them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct FrameSlice {
    pub start: usize,
    pub end: Option<usize>,
    pub step: usize,
}

impl Default for FrameSlice {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            step: 1,
        }
    }
}

impl FrameSlice {
    pub fn new(start: usize, end: Option<usize>, step: usize) -> Result<Self, String> {
        if step == 0 {
            return Err("frame step must be at least 1".to_string());
        }
        Ok(Self { start, end, step })
    }

    /// Selected indices out of `len` frames, in increasing order
    pub fn indices(&self, len: usize) -> StepBy<Range<usize>> {
        let end = self.end.map_or(len, |end| end.min(len));
        let start = self.start.min(end);
        (start..end).step_by(self.step.max(1))
    }

    pub fn contains(&self, index: usize, len: usize) -> bool {
        let end = self.end.map_or(len, |end| end.min(len));
        index >= self.start && index < end && (index - self.start) % self.step.max(1) == 0
    }
}

impl FromStr for FrameSlice {
    type Err = String;

    /// Parses `START:END:STEP`; any part may be left empty, and `START:END`
    /// or a bare `START` are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        if parts.len() > 3 {
            return Err(format!("expected START:END:STEP, got '{s}'"));
        }

        let parse = |part: Option<&&str>, what: &str| -> Result<Option<usize>, String> {
            match part {
                None => Ok(None),
                Some(text) if text.is_empty() => Ok(None),
                Some(text) => text
                    .parse::<usize>()
                    .map(Some)
                    .map_err(|e| format!("invalid frame {what} '{text}': {e}")),
            }
        };

        let start = parse(parts.first(), "start")?.unwrap_or(0);
        let end = parse(parts.get(1), "end")?;
        let step = parse(parts.get(2), "step")?.unwrap_or(1);

        Self::new(start, end, step)
    }
}

impl fmt::Display for FrameSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}:{}:{}", self.start, end, self.step),
            None => write!(f, "{}::{}", self.start, self.step),
        }
    }
}

/// Records of both bodies at the same scheduled instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordPair {
    pub index: usize,
    pub asteroid: StateRecord,
    pub spacecraft: StateRecord,
}

impl RecordPair {
    pub fn instant(&self) -> Instant {
        self.asteroid.instant
    }

    /// Spacecraft position relative to the asteroid
    pub fn relative_position(&self) -> Vector {
        self.spacecraft.position - self.asteroid.position
    }

    pub fn separation(&self) -> Scalar {
        self.asteroid.position.distance(self.spacecraft.position)
    }
}

/// Zips two record sequences taken over the same schedule.
///
/// Fails when the sequences differ in length or when the instants at any
/// index are further apart than `tolerance`.
pub fn pair_records(
    asteroid: &[StateRecord],
    spacecraft: &[StateRecord],
    tolerance: Scalar,
) -> Result<Vec<RecordPair>, CampaignError> {
    if asteroid.len() != spacecraft.len() {
        return Err(CampaignError::RecordMismatch(format!(
            "asteroid has {} records but spacecraft has {}",
            asteroid.len(),
            spacecraft.len()
        )));
    }

    asteroid
        .iter()
        .zip(spacecraft)
        .enumerate()
        .map(|(index, (a, b))| {
            if (a.instant - b.instant).abs() > tolerance {
                return Err(CampaignError::RecordMismatch(format!(
                    "record {index} taken at t = {} s for the asteroid but t = {} s for the spacecraft",
                    a.instant, b.instant
                )));
            }

            Ok(RecordPair {
                index,
                asteroid: *a,
                spacecraft: *b,
            })
        })
        .collect()
}

/// Everything known about one rendered frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameResult {
    pub index: usize,
    pub instant: Instant,
    /// Seconds from the start of the encounter window
    pub time_from_start: Scalar,
    /// Seconds from the middle of the encounter window, i.e. closest approach
    pub time_from_midpoint: Scalar,
    pub body_a_position: Vector,
    pub body_b_position: Vector,
    pub relative_position: Vector,
    pub separation_distance: Scalar,
    /// Spacecraft position in scene units, asteroid at the origin
    pub camera_position: Vector,
    pub camera_orientation: Quaternion,
    pub camera_geometry: CameraGeometry,
    pub field_of_view: FieldOfView,
}

impl FrameResult {
    /// Frame for `pair` with the camera on the spacecraft tracking the asteroid.
    pub fn from_pair(
        pair: &RecordPair,
        window: TimeWindow,
        scene_scale: Scalar,
        intrinsics: &CameraIntrinsics,
    ) -> Result<Self, GeometryError> {
        let relative_position = pair.relative_position();
        let camera_position = relative_position / scene_scale;
        let camera_orientation = track_to(camera_position, Vector::ZERO)?;
        let camera_geometry = camera_vectors(camera_orientation, intrinsics)?;

        Ok(Self {
            index: pair.index,
            instant: pair.instant(),
            time_from_start: pair.instant() - window.start,
            time_from_midpoint: pair.instant() - window.midpoint(),
            body_a_position: pair.asteroid.position,
            body_b_position: pair.spacecraft.position,
            relative_position,
            separation_distance: pair.separation(),
            camera_position,
            camera_orientation,
            camera_geometry,
            field_of_view: FieldOfView::from_geometry(&camera_geometry),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(instant: Instant, position: Vector) -> StateRecord {
        StateRecord {
            instant,
            position,
            velocity: Vector::ZERO,
        }
    }

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            lens: 230.0,
            sensor_width: 8.5008,
            res_x: 2464,
            res_y: 2056,
        }
    }

    #[test]
    fn test_slice_parsing() {
        assert_eq!("2:8:3".parse::<FrameSlice>(), Ok(FrameSlice::new(2, Some(8), 3).unwrap()));
        assert_eq!("::2".parse::<FrameSlice>(), Ok(FrameSlice::new(0, None, 2).unwrap()));
        assert_eq!("4".parse::<FrameSlice>(), Ok(FrameSlice::new(4, None, 1).unwrap()));
        assert_eq!("1:5".parse::<FrameSlice>(), Ok(FrameSlice::new(1, Some(5), 1).unwrap()));
        assert!("0:10:0".parse::<FrameSlice>().is_err());
        assert!("a:b".parse::<FrameSlice>().is_err());
        assert!("1:2:3:4".parse::<FrameSlice>().is_err());
    }

    #[test]
    fn test_slice_indices() {
        let all = FrameSlice::default();
        assert_eq!(all.indices(4).collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        let strided = FrameSlice::new(1, Some(100), 3).unwrap();
        assert_eq!(strided.indices(10).collect::<Vec<_>>(), vec![1, 4, 7]);
        assert!(strided.contains(7, 10));
        assert!(!strided.contains(8, 10));

        let past_end = FrameSlice::new(12, None, 1).unwrap();
        assert_eq!(past_end.indices(10).count(), 0);

        let reversed = FrameSlice::new(6, Some(2), 1).unwrap();
        assert_eq!(reversed.indices(10).count(), 0);
    }

    #[test]
    fn test_slice_display_round_trips() {
        for text in ["0:10:1", "3::2"] {
            let slice: FrameSlice = text.parse().unwrap();
            assert_eq!(slice.to_string(), text);
        }
    }

    #[test]
    fn test_pairing_ten_records() {
        let asteroid: Vec<StateRecord> = (0..10)
            .map(|i| record(i as f64, Vector::new(1.0e11, 0.0, 0.0)))
            .collect();
        let spacecraft: Vec<StateRecord> = (0..10)
            .map(|i| record(i as f64, Vector::new(1.0e11, 3.0e5 - i as f64 * 1.0e4, 0.0)))
            .collect();

        let pairs = pair_records(&asteroid, &spacecraft, 0.5).unwrap();
        assert_eq!(pairs.len(), 10);
        assert_eq!(
            pairs.iter().map(|p| p.index).collect::<Vec<_>>(),
            (0..10).collect::<Vec<_>>()
        );
        assert!(pairs.iter().all(|p| p.separation() >= 0.0));
        assert_eq!(pairs[0].separation(), 3.0e5);
    }

    #[test]
    fn test_pairing_rejects_mismatched_lengths() {
        let a = vec![record(0.0, Vector::ZERO); 3];
        let b = vec![record(0.0, Vector::ZERO); 2];
        assert!(matches!(
            pair_records(&a, &b, 1.0),
            Err(CampaignError::RecordMismatch(_))
        ));
    }

    #[test]
    fn test_pairing_rejects_misaligned_instants() {
        let a = vec![record(0.0, Vector::ZERO), record(10.0, Vector::ZERO)];
        let b = vec![record(0.0, Vector::ZERO), record(12.0, Vector::ZERO)];
        assert!(matches!(
            pair_records(&a, &b, 1.0),
            Err(CampaignError::RecordMismatch(_))
        ));
    }

    #[test]
    fn test_frame_camera_tracks_asteroid() {
        let pair = RecordPair {
            index: 3,
            asteroid: record(30.0, Vector::new(1.0e11, 0.0, 0.0)),
            spacecraft: record(30.0, Vector::new(1.0e11, 2.0e5, 1.0e5)),
        };

        let window = TimeWindow::centered(0.0, 120.0).unwrap();
        let frame = FrameResult::from_pair(&pair, window, 1000.0, &intrinsics()).unwrap();

        assert_eq!(frame.index, 3);
        assert_eq!(frame.time_from_start, 90.0);
        assert_eq!(frame.time_from_midpoint, 30.0);
        assert_eq!(frame.camera_position, Vector::new(0.0, 200.0, 100.0));
        assert!((frame.separation_distance - frame.relative_position.length()).abs() < 1e-6);

        let boresight = -frame.camera_position.normalize();
        assert!((frame.camera_geometry.direction - boresight).length() < 1e-12);
    }

    #[test]
    fn test_frame_on_top_of_asteroid_is_rejected() {
        let pair = RecordPair {
            index: 0,
            asteroid: record(0.0, Vector::X),
            spacecraft: record(0.0, Vector::X),
        };
        let window = TimeWindow::centered(0.0, 120.0).unwrap();
        assert!(FrameResult::from_pair(&pair, window, 1000.0, &intrinsics()).is_err());
    }
}
