// precland_core/src/types.rs

use crate::error::FrameError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Altitude Reference ---

/// Which altitude datum a [`GeoPoint`] is expressed in.
///
/// Points with different references must never be mixed in one computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AltitudeReference {
    /// Absolute altitude (above mean sea level).
    Global,
    /// Altitude relative to the home position.
    RelativeHome,
}

impl FromStr for AltitudeReference {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" | "absolute" => Ok(Self::Global),
            "relative" | "relative_home" | "global_relative" => Ok(Self::RelativeHome),
            other => Err(FrameError::InvalidFrame(format!(
                "unknown altitude reference '{other}'"
            ))),
        }
    }
}

// --- Geodetic Point ---

/// A latitude/longitude/altitude location. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat_deg: f64,
    lon_deg: f64,
    alt_m: f64,
    reference: AltitudeReference,
}

impl GeoPoint {
    pub const fn new(lat_deg: f64, lon_deg: f64, alt_m: f64, reference: AltitudeReference) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
            reference,
        }
    }

    /// A point whose altitude is absolute.
    pub const fn global(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self::new(lat_deg, lon_deg, alt_m, AltitudeReference::Global)
    }

    /// A point whose altitude is relative to home.
    pub const fn relative(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self::new(lat_deg, lon_deg, alt_m, AltitudeReference::RelativeHome)
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_deg
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_deg
    }

    pub fn alt_m(&self) -> f64 {
        self.alt_m
    }

    pub fn reference(&self) -> AltitudeReference {
        self.reference
    }

    /// Returns a copy with a different altitude, keeping the reference.
    pub fn with_altitude(&self, alt_m: f64) -> Self {
        Self { alt_m, ..*self }
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite() && self.alt_m.is_finite()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.7}, {:.7}, {:.2} m {:?})",
            self.lat_deg, self.lon_deg, self.alt_m, self.reference
        )
    }
}

// --- Local Tangent Plane ---

/// A planar north/east displacement in metres from some reference point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalOffset {
    pub north_m: f64,
    pub east_m: f64,
}

impl LocalOffset {
    pub const fn new(north_m: f64, east_m: f64) -> Self {
        Self { north_m, east_m }
    }

    pub fn norm(&self) -> f64 {
        self.north_m.hypot(self.east_m)
    }
}

/// Vehicle or camera attitude in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Attitude {
    pub const fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub const fn level() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// A position in the local tangent-plane frame, with an optional attitude.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose3 {
    pub position: Vector3<f64>,
    pub attitude: Option<Attitude>,
}

impl Pose3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            attitude: None,
        }
    }

    pub fn from_position(position: Vector3<f64>) -> Self {
        Self {
            position,
            attitude: None,
        }
    }

    pub fn with_attitude(mut self, attitude: Attitude) -> Self {
        self.attitude = Some(attitude);
        self
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn z(&self) -> f64 {
        self.position.z
    }
}

/// One poll of the vehicle-telemetry collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub location: GeoPoint,
    pub attitude: Attitude,
    /// Mission clock in seconds.
    pub timestamp_s: f64,
}
