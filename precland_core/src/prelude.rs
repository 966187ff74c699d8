// precland_core/src/prelude.rs

// --- Core Data Structures ---
pub use crate::error::{CommandError, FrameError, GuidanceError, ProjectionError, TrajectoryError};
pub use crate::frames::local::LocalFrame;
pub use crate::frames::{bearing_degrees, distance_meters, geo_point_to_offset, offset_to_geo_point};
pub use crate::types::{AltitudeReference, Attitude, GeoPoint, LocalOffset, Pose3, Telemetry};

// --- Models ---
pub use crate::models::camera::CameraModel;
pub use crate::models::trajectory::{LemniscateTrack, TrackShape};

// --- Estimation ---
pub use crate::estimation::phase::{PhasePolicy, PhaseSolution};
pub use crate::estimation::predictor::{
    EstimatorConfig, Prediction, RotationSense, SpeedProfile, SpeedSegment, TailPolicy,
    TargetPredictor, TrajectoryState,
};
pub use crate::estimation::root::RootSettings;

// --- Guidance and Commands ---
pub use crate::controllers::landing::{GuidanceCommand, GuidanceConfig, LandingGuidance, Observation};
pub use crate::controllers::search::SquareSearch;
pub use crate::messages::{CommandFrame, CommandSink};
