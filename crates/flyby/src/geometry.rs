//! Camera basis vectors, field-of-view edge rays and pointing
//!
//! Cameras follow the renderer's convention: the boresight is local -Z and
//! local +Y is up. Everything here is a pure function of its inputs.

use crate::physics::math::{Quaternion, Scalar, Vector};
use bevy::math::DMat3;
use serde::{Deserialize, Serialize};
use std::fmt;

const ORIENTATION_NORM_TOLERANCE: Scalar = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Lens, sensor or resolution cannot describe a real camera
    InvalidIntrinsics(String),
    /// The orientation does not define a unique camera basis
    DegenerateOrientation(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidIntrinsics(msg) => write!(f, "Invalid camera intrinsics: {msg}"),
            GeometryError::DegenerateOrientation(msg) => {
                write!(f, "Degenerate camera orientation: {msg}")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Lens and sensor of a pinhole camera
///
/// `lens` and `sensor_width` are in millimetres, the resolution in pixels.
/// `sensor_width` always spans the longer image axis.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    pub lens: Scalar,
    pub sensor_width: Scalar,
    pub res_x: u32,
    pub res_y: u32,
}

impl CameraIntrinsics {
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.lens.is_finite() || self.lens <= 0.0 {
            return Err(GeometryError::InvalidIntrinsics(format!(
                "lens must be positive, got {}",
                self.lens
            )));
        }
        if !self.sensor_width.is_finite() || self.sensor_width <= 0.0 {
            return Err(GeometryError::InvalidIntrinsics(format!(
                "sensor width must be positive, got {}",
                self.sensor_width
            )));
        }
        if self.res_x == 0 || self.res_y == 0 {
            return Err(GeometryError::InvalidIntrinsics(format!(
                "resolution must be non-zero, got {}x{}",
                self.res_x, self.res_y
            )));
        }
        Ok(())
    }

    /// Sensor extent `(width, height)` matched to the image aspect ratio
    pub fn sensor_dimensions(&self) -> (Scalar, Scalar) {
        let res_x = self.res_x as Scalar;
        let res_y = self.res_y as Scalar;

        if self.res_x > self.res_y {
            (self.sensor_width, self.sensor_width * res_y / res_x)
        } else {
            (self.sensor_width * res_x / res_y, self.sensor_width)
        }
    }
}

/// Rays through the middle of each image edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovEdges {
    pub left: Vector,
    pub right: Vector,
    pub down: Vector,
    pub up: Vector,
}

impl FovEdges {
    pub fn iter(&self) -> impl Iterator<Item = Vector> {
        [self.left, self.right, self.down, self.up].into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraGeometry {
    pub direction: Vector,
    pub up: Vector,
    pub right: Vector,
    pub edges: FovEdges,
}

pub fn camera_vectors(
    orientation: Quaternion,
    intrinsics: &CameraIntrinsics,
) -> Result<CameraGeometry, GeometryError> {
    intrinsics.validate()?;

    if !orientation.is_finite() || (orientation.length() - 1.0).abs() > ORIENTATION_NORM_TOLERANCE
    {
        return Err(GeometryError::DegenerateOrientation(format!(
            "orientation must be a unit quaternion, got {orientation:?}"
        )));
    }

    let up = orientation * Vector::Y;
    let direction = orientation * Vector::NEG_Z;
    let right = direction.cross(up);

    let (sensor_w, sensor_h) = intrinsics.sensor_dimensions();
    let half_w = right * sensor_w * 0.5 / intrinsics.lens;
    let half_h = up * sensor_h * 0.5 / intrinsics.lens;

    Ok(CameraGeometry {
        direction,
        up,
        right,
        edges: FovEdges {
            left: direction - half_w,
            right: direction + half_w,
            down: direction - half_h,
            up: direction + half_h,
        },
    })
}

/// Orientation pointing the boresight from `camera_position` at `target`
///
/// Local +Y is kept as close to world +Z as the pointing allows. When the
/// line of sight is parallel to world Z, world +Y is used as the up hint.
pub fn track_to(camera_position: Vector, target: Vector) -> Result<Quaternion, GeometryError> {
    let line_of_sight = target - camera_position;
    let forward = line_of_sight.try_normalize().ok_or_else(|| {
        GeometryError::DegenerateOrientation(format!(
            "camera at {camera_position} cannot track a target at the same place"
        ))
    })?;

    let up = [Vector::Z, Vector::Y]
        .into_iter()
        .find_map(|hint| (hint - forward * hint.dot(forward)).try_normalize())
        .ok_or_else(|| {
            GeometryError::DegenerateOrientation(format!("no up vector for line of sight {forward}"))
        })?;

    let back = -forward;
    let right = up.cross(back);

    Ok(Quaternion::from_mat3(&DMat3::from_cols(right, up, back)).normalize())
}

/// Right ascension and declination of a direction, in degrees
///
/// Right ascension is in `[0, 360)`.
pub fn ra_dec(direction: Vector) -> (Scalar, Scalar) {
    let length = direction.length();
    let mut ra = libm::atan2(direction.y, direction.x).to_degrees().rem_euclid(360.0);
    if ra >= 360.0 {
        ra = 0.0;
    }
    let dec = libm::asin((direction.z / length).clamp(-1.0, 1.0)).to_degrees();
    (ra, dec)
}

/// Sky rectangle covered by the camera, in degrees
///
/// The centre is the boresight. The widths bound the right ascension and
/// declination of the four edge rays.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FieldOfView {
    pub ra_center: Scalar,
    pub ra_width: Scalar,
    pub dec_center: Scalar,
    pub dec_width: Scalar,
}

impl FieldOfView {
    pub fn from_geometry(geometry: &CameraGeometry) -> Self {
        let (ra_center, dec_center) = ra_dec(geometry.direction);

        let (mut ra_min, mut ra_max) = (0.0, 0.0);
        let (mut dec_min, mut dec_max) = (Scalar::INFINITY, Scalar::NEG_INFINITY);

        for edge in geometry.edges.iter() {
            let (ra, dec) = ra_dec(edge);
            // offset from the centre, wrapped to (-180, 180]
            let mut offset = (ra - ra_center).rem_euclid(360.0);
            if offset > 180.0 {
                offset -= 360.0;
            }
            ra_min = Scalar::min(ra_min, offset);
            ra_max = Scalar::max(ra_max, offset);
            dec_min = dec_min.min(dec);
            dec_max = dec_max.max(dec);
        }

        Self {
            ra_center,
            ra_width: ra_max - ra_min,
            dec_center,
            dec_width: dec_max - dec_min,
        }
    }
}
