// precland_core/src/controllers/landing.rs

use crate::controllers::search::SquareSearch;
use crate::error::{CommandError, GuidanceError, TrajectoryError};
use crate::estimation::predictor::{RotationSense, TargetPredictor, TrajectoryState};
use crate::frames::offset_to_geo_point;
use crate::messages::{self, CommandFrame, CommandSink};
use crate::models::camera::CameraModel;
use crate::types::{GeoPoint, Telemetry};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning of the descend-onto-marker loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GuidanceConfig {
    /// Altitude lost per repositioning step, metres.
    pub descent_step_m: f64,
    /// Ground distance under which the vehicle counts as centred over the marker.
    pub center_tolerance_m: f64,
    /// Below this relative altitude a visible marker triggers the landing.
    pub land_altitude_m: f64,
    /// Vertical speed used for centred descents, m/s (positive is down).
    pub descent_speed_mps: f64,
    /// Half-side of the square flown around the track origin until the first
    /// sighting. 0 holds position instead.
    pub search_half_size_m: f64,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            descent_step_m: 2.0,
            center_tolerance_m: 0.5,
            land_altitude_m: 2.0,
            descent_speed_mps: 0.5,
            search_half_size_m: 0.0,
        }
    }
}

impl GuidanceConfig {
    /// Checks that every distance and speed is finite and in range.
    pub fn validate(&self) -> Result<(), GuidanceError> {
        let positive = [
            ("descent_step_m", self.descent_step_m),
            ("descent_speed_mps", self.descent_speed_mps),
        ];
        let non_negative = [
            ("center_tolerance_m", self.center_tolerance_m),
            ("land_altitude_m", self.land_altitude_m),
            ("search_half_size_m", self.search_half_size_m),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GuidanceError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GuidanceError::InvalidConfig(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }
        self.descent_duration().map(|_| ())
    }

    /// How long one centred descent step is streamed.
    pub fn descent_duration(&self) -> Result<Duration, GuidanceError> {
        let seconds = self.descent_step_m / self.descent_speed_mps;
        Duration::try_from_secs_f64(seconds).map_err(|e| {
            GuidanceError::InvalidConfig(format!("descent step of {seconds} s: {e}"))
        })
    }
}

/// What the detector reported for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Marker centre in raster pixels (origin top-left).
    Marker { center_px: (f64, f64) },
    Lost,
}

/// One guidance decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuidanceCommand {
    /// Fly to a home-relative point.
    Reposition { target: GeoPoint },
    /// Stream a local NED velocity for `duration`.
    Descend {
        velocity: Vector3<f64>,
        duration: Duration,
    },
    Hold,
    Land,
}

impl GuidanceCommand {
    /// Hands the command to `sink`. Velocity commands are streamed at 10 Hz,
    /// with `pause` called between sends. Returns the number of messages sent.
    pub fn issue<S, P>(&self, sink: &mut S, pause: P) -> Result<usize, CommandError>
    where
        S: CommandSink + ?Sized,
        P: FnMut(Duration),
    {
        match self {
            GuidanceCommand::Reposition { target } => {
                sink.send(&messages::position_target_global(target)?)?;
                Ok(1)
            }
            GuidanceCommand::Descend { velocity, duration } => {
                let msg = messages::velocity_target(velocity, CommandFrame::LocalNed);
                messages::issue_for(sink, &msg, *duration, pause)
            }
            GuidanceCommand::Hold => {
                let msg = messages::velocity_target(&Vector3::zeros(), CommandFrame::LocalNed);
                sink.send(&msg)?;
                Ok(1)
            }
            GuidanceCommand::Land => {
                sink.send(&messages::land())?;
                Ok(1)
            }
        }
    }
}

/// Turns detector output and telemetry into vehicle commands.
///
/// While the marker is visible the vehicle is walked down onto it. The first
/// sighting fixes a [`TrajectoryState`]; if the marker is later lost, the
/// predictor is asked where the target has gone. Before that sighting the
/// vehicle flies a [`SquareSearch`] when one is configured. Once `Land` has been
/// issued the decision is latched and every later step lands again.
#[derive(Debug, Clone)]
pub struct LandingGuidance {
    pub config: GuidanceConfig,
    camera: CameraModel,
    predictor: TargetPredictor,
    track_origin: GeoPoint,
    mission_start_time_s: f64,
    rotation: RotationSense,
    state: Option<TrajectoryState>,
    search: Option<SquareSearch>,
    landing: bool,
}

impl LandingGuidance {
    pub fn new(
        config: GuidanceConfig,
        camera: CameraModel,
        predictor: TargetPredictor,
        track_origin: GeoPoint,
        mission_start_time_s: f64,
    ) -> Self {
        Self {
            config,
            camera,
            predictor,
            track_origin,
            mission_start_time_s,
            rotation: RotationSense::default(),
            state: None,
            search: None,
            landing: false,
        }
    }

    pub fn with_rotation(mut self, rotation: RotationSense) -> Self {
        self.rotation = rotation;
        self
    }

    /// Travel direction assumed for the target.
    pub fn rotation(&self) -> RotationSense {
        self.rotation
    }

    /// The snapshot taken at the first sighting, if any.
    pub fn trajectory_state(&self) -> Option<&TrajectoryState> {
        self.state.as_ref()
    }

    /// True once `Land` has been issued.
    pub fn is_landing(&self) -> bool {
        self.landing
    }

    /// One guidance decision for the current frame.
    pub fn step(
        &mut self,
        telemetry: &Telemetry,
        observation: Observation,
    ) -> Result<GuidanceCommand, GuidanceError> {
        if self.landing {
            return Ok(GuidanceCommand::Land);
        }
        match observation {
            Observation::Marker { center_px } => self.on_marker(telemetry, center_px),
            Observation::Lost => self.on_lost(telemetry),
        }
    }

    fn on_marker(
        &mut self,
        telemetry: &Telemetry,
        center_px: (f64, f64),
    ) -> Result<GuidanceCommand, GuidanceError> {
        let location = telemetry.location;
        let altitude = location.alt_m();
        if altitude <= self.config.land_altitude_m {
            info!("Marker in view at {:.2} m, landing", altitude);
            self.landing = true;
            return Ok(GuidanceCommand::Land);
        }

        let (north, east) =
            self.camera
                .unproject_level(center_px, altitude, telemetry.attitude.yaw)?;
        let marker = offset_to_geo_point(&location, north, east)?.with_altitude(0.0);

        if self.state.is_none() {
            info!("First marker sighting at {}", marker);
            self.state = Some(TrajectoryState {
                origin: self.track_origin,
                last_observed: marker,
                last_observed_time_s: telemetry.timestamp_s,
                mission_start_time_s: self.mission_start_time_s,
                rotation: self.rotation,
            });
        }

        let offset = north.hypot(east);
        if offset <= self.config.center_tolerance_m {
            let duration = self.config.descent_duration()?;
            debug!(
                "Centred within {:.2} m, descending for {:.1} s",
                offset,
                duration.as_secs_f64()
            );
            return Ok(GuidanceCommand::Descend {
                velocity: Vector3::new(0.0, 0.0, self.config.descent_speed_mps),
                duration,
            });
        }

        let next_altitude = (altitude - self.config.descent_step_m).max(0.0);
        debug!(
            "Marker offset ({:.2} N, {:.2} E), repositioning to {:.1} m",
            north, east, next_altitude
        );
        Ok(GuidanceCommand::Reposition {
            target: marker.with_altitude(next_altitude),
        })
    }

    fn on_lost(&mut self, telemetry: &Telemetry) -> Result<GuidanceCommand, GuidanceError> {
        let Some(state) = self.state.as_ref() else {
            return self.fly_search(telemetry);
        };

        match self.predictor.predict(state, telemetry.timestamp_s) {
            Ok(prediction) => {
                debug!(
                    "Marker lost for {:.1} s, heading for prediction {} (confident: {})",
                    prediction.seconds_since_observed,
                    prediction.position,
                    prediction.is_confident()
                );
                Ok(GuidanceCommand::Reposition {
                    target: prediction.position.with_altitude(telemetry.location.alt_m()),
                })
            }
            Err(
                err @ (TrajectoryError::PhaseSolveUndefined { .. }
                | TrajectoryError::PhaseSolveAmbiguous { .. }),
            ) => {
                warn!("No usable prediction ({}), holding position", err);
                Ok(GuidanceCommand::Hold)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn fly_search(&mut self, telemetry: &Telemetry) -> Result<GuidanceCommand, GuidanceError> {
        let half_size = self.config.search_half_size_m;
        if !(half_size > 0.0) {
            return Ok(GuidanceCommand::Hold);
        }
        let search = match self.search.take() {
            Some(search) => search,
            None => {
                info!("No marker yet, searching a {:.0} m square", 2.0 * half_size);
                SquareSearch::new(&self.track_origin, half_size)?
            }
        };
        let search = self.search.insert(search);
        Ok(GuidanceCommand::Reposition {
            target: search.target(&telemetry.location)?,
        })
    }
}
