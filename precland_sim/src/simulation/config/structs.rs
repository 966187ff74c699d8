// precland_sim/src/simulation/config/structs.rs

use precland_core::controllers::landing::GuidanceConfig;
use precland_core::estimation::predictor::{EstimatorConfig, RotationSense};
use precland_core::models::camera::CameraModel;
use precland_core::types::GeoPoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =========================================================================
// == Top-Level Scenario ==
// =========================================================================

/// # ScenarioConfig
/// Root of a `scenario.toml` file. Every section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: Simulation,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub vehicle: VehicleConfig,

    #[serde(default)]
    pub guidance: GuidanceConfig,

    #[serde(default)]
    pub estimator: EstimatorConfig,
}

// =========================================================================
// == Sections ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Simulation {
    /// Seed for the pseudo-random number generator.
    pub seed: u64,
    /// Simulated time after which the run stops, landed or not.
    pub duration_seconds: f64,
    /// Hold frame delivery to the camera's frame rate. `--fast` overrides it.
    pub realtime: bool,
    /// Simulation time at which the target's speed schedule starts.
    /// Negative values mean the target was already moving when the run began.
    pub mission_start_seconds: f64,
    pub home: HomeConfig,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: 42,
            duration_seconds: 180.0,
            realtime: true,
            mission_start_seconds: 0.0,
            home: HomeConfig::default(),
        }
    }
}

/// Home position. Altitudes everywhere in the simulator are relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HomeConfig {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            lat_deg: 47.397742,
            lon_deg: 8.545594,
        }
    }
}

impl HomeConfig {
    pub fn to_geo_point(&self) -> GeoPoint {
        GeoPoint::relative(self.lat_deg, self.lon_deg, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CameraConfig {
    pub model: CameraModel,
    /// Canvas colour around the warped target.
    pub background: [u8; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            model: CameraModel::default(),
            background: [74, 88, 109],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TargetConfig {
    /// Marker image; a procedural marker is drawn when absent.
    pub image: Option<PathBuf>,
    /// Edge length of the square target, metres.
    pub size_m: f64,
    pub motion: TargetMotion,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            image: None,
            size_m: 1.5,
            motion: TargetMotion::default(),
        }
    }
}

/// How the ground target moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase", deny_unknown_fields)]
pub enum TargetMotion {
    /// Fixed at an offset from home.
    Static { north_m: f64, east_m: f64 },
    /// Follows the estimator's ground track at the estimator's speed schedule.
    Track {
        #[serde(default)]
        phase: f64,
        #[serde(default)]
        start_parameter: f64,
        #[serde(default)]
        rotation: RotationSense,
    },
}

impl Default for TargetMotion {
    fn default() -> Self {
        TargetMotion::Static {
            north_m: 5.0,
            east_m: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct VehicleConfig {
    /// Start position relative to home, metres north and east.
    pub start_north_m: f64,
    pub start_east_m: f64,
    pub takeoff_altitude_m: f64,
    pub start_yaw_deg: f64,
    /// Speed limit when flying to a position target, m/s.
    pub max_speed_mps: f64,
    pub land_speed_mps: f64,
    /// Standard deviation of the horizontal GPS error, metres. 0 disables it.
    pub gps_noise_stddev_m: f64,
    /// Standard deviation of the detector's pixel error. 0 disables it.
    pub pixel_noise_stddev: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            start_north_m: 0.0,
            start_east_m: 0.0,
            takeoff_altitude_m: 20.0,
            start_yaw_deg: 0.0,
            max_speed_mps: 5.0,
            land_speed_mps: 0.5,
            gps_noise_stddev_m: 0.0,
            pixel_noise_stddev: 0.0,
        }
    }
}
