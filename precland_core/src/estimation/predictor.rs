// precland_core/src/estimation/predictor.rs

use crate::error::TrajectoryError;
use crate::estimation::phase::{solve_phase, PhasePolicy, PhaseSolution};
use crate::estimation::root::{solve_bracketed_newton, RootSettings, RootSolution};
use crate::frames::{geo_point_to_offset, offset_to_geo_point};
use crate::models::trajectory::{LemniscateTrack, TrackShape, DEFAULT_ARC_STEP};
use crate::types::GeoPoint;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, warn};

// =========================================================================
// == Configuration ==
// =========================================================================

/// One piece of the target's speed schedule: `speed_kmh` until mission time `until_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeedSegment {
    pub until_s: f64,
    pub speed_kmh: f64,
}

/// Speed once the mission clock runs past the last segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// The target is treated as stopped.
    #[default]
    Stationary,
    /// The last segment's speed continues indefinitely.
    HoldLast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SpeedProfile {
    /// Segments in increasing `until_s` order.
    pub segments: Vec<SpeedSegment>,
    #[serde(default)]
    pub tail: TailPolicy,
}

impl Default for SpeedProfile {
    fn default() -> Self {
        Self {
            segments: vec![
                SpeedSegment {
                    until_s: 6.0 * 60.0,
                    speed_kmh: 15.0,
                },
                SpeedSegment {
                    until_s: 12.0 * 60.0,
                    speed_kmh: 10.0,
                },
                SpeedSegment {
                    until_s: 20.0 * 60.0,
                    speed_kmh: 5.0,
                },
            ],
            tail: TailPolicy::Stationary,
        }
    }
}

impl SpeedProfile {
    /// Target speed in m/s at `elapsed_s` seconds of mission time.
    pub fn speed_mps(&self, elapsed_s: f64) -> f64 {
        let kmh = match self.segments.iter().find(|seg| elapsed_s < seg.until_s) {
            Some(segment) => segment.speed_kmh,
            None => match self.tail {
                TailPolicy::Stationary => 0.0,
                TailPolicy::HoldLast => self.segments.last().map_or(0.0, |seg| seg.speed_kmh),
            },
        };
        kmh / 3.6
    }
}

/// All knobs of the trajectory estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatorConfig {
    #[serde(default)]
    pub track: TrackShape,
    #[serde(default)]
    pub speed_profile: SpeedProfile,
    /// Assumed time for the vehicle to descend onto the target, seconds.
    #[serde(default = "default_descent_time")]
    pub descent_time_s: f64,
    #[serde(default)]
    pub phase_policy: PhasePolicy,
    /// Integration step for the arclength, radians of curve parameter.
    #[serde(default = "default_arc_step")]
    pub arc_step: f64,
    #[serde(default)]
    pub root: RootSettings,
}

fn default_descent_time() -> f64 {
    50.0
}

fn default_arc_step() -> f64 {
    DEFAULT_ARC_STEP
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            track: TrackShape::default(),
            speed_profile: SpeedProfile::default(),
            descent_time_s: default_descent_time(),
            phase_policy: PhasePolicy::default(),
            arc_step: default_arc_step(),
            root: RootSettings::default(),
        }
    }
}

// =========================================================================
// == Inputs and Outputs ==
// =========================================================================

/// Direction the target travels around the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSense {
    /// Increasing curve parameter (+1).
    #[default]
    Ccw,
    /// Decreasing curve parameter (-1).
    Cw,
}

impl RotationSense {
    pub fn sign(&self) -> f64 {
        match self {
            RotationSense::Ccw => 1.0,
            RotationSense::Cw => -1.0,
        }
    }
}

/// Snapshot taken when the target is first observed. Never mutated; every
/// prediction is a pure function of this plus the current time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryState {
    pub origin: GeoPoint,
    pub last_observed: GeoPoint,
    pub last_observed_time_s: f64,
    pub mission_start_time_s: f64,
    pub rotation: RotationSense,
}

/// The phase shift used for a prediction and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseEstimate {
    pub solution: PhaseSolution,
    pub used: f64,
}

/// A best-effort prediction of the target's current position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub position: GeoPoint,
    pub curve_parameter: f64,
    pub phase: PhaseEstimate,
    pub speed_mps: f64,
    /// Arclength travelled along the track, reduced to one loop.
    pub distance_m: f64,
    pub converged: bool,
    pub iterations: usize,
    pub seconds_since_observed: f64,
}

impl Prediction {
    /// True when nothing about the estimate was degraded.
    pub fn is_confident(&self) -> bool {
        self.converged && self.phase.solution.is_solved()
    }
}

// =========================================================================
// == Predictor ==
// =========================================================================

/// Predicts where a target following the ground track is now.
#[derive(Debug, Clone)]
pub struct TargetPredictor {
    config: EstimatorConfig,
    track: LemniscateTrack,
}

impl TargetPredictor {
    pub fn new(config: EstimatorConfig) -> Self {
        let track = LemniscateTrack::new(config.track, config.arc_step);
        Self { config, track }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// The zero-phase track; its perimeter is computed once here.
    pub fn track(&self) -> &LemniscateTrack {
        &self.track
    }

    /// Curve parameter at which `track` has covered `distance_m` from parameter 0,
    /// after reducing the distance to a single loop.
    pub fn parameter_at_distance(&self, track: &LemniscateTrack, distance_m: f64) -> RootSolution<f64> {
        let perimeter = track.perimeter();
        let s = reduce_to_loop(distance_m, perimeter);
        let initial = if perimeter > 0.0 { s * TAU / perimeter } else { 0.0 };
        solve_bracketed_newton(
            |t| track.arc_length(t) - s,
            |t| track.speed(t),
            0.0,
            TAU,
            initial,
            &self.config.root,
        )
    }

    /// Predicts the target's position at mission clock `now_s`.
    pub fn predict(&self, state: &TrajectoryState, now_s: f64) -> Result<Prediction, TrajectoryError> {
        // --- 1. Sighting in the local frame of the track origin ---
        let sighting = geo_point_to_offset(&state.origin, &state.last_observed)?;
        let (x0, y0) = (sighting.north_m, sighting.east_m);

        // --- 2. Phase shift that puts the sighting on the curve ---
        let solution = solve_phase(self.track.shape(), x0, y0);
        let phase = self.config.phase_policy.resolve(solution, x0, y0)?;
        if !solution.is_solved() {
            warn!(
                "Phase solve {:?} for sighting ({:.2}, {:.2}); predicting with phase {}",
                solution, x0, y0, phase
            );
        }
        let track = self.track.with_phase(phase);

        // --- 3. Speed from the mission clock ---
        let elapsed = now_s - state.mission_start_time_s;
        let speed_mps = self.config.speed_profile.speed_mps(elapsed);

        // --- 4. Distance covered while we descend, within one loop ---
        let perimeter = track.perimeter();
        let travelled = reduce_to_loop(speed_mps * self.config.descent_time_s, perimeter);
        let along = match state.rotation {
            RotationSense::Ccw => travelled,
            RotationSense::Cw => reduce_to_loop(perimeter - travelled, perimeter),
        };

        // --- 5. Invert arclength -> curve parameter ---
        let root = self.parameter_at_distance(&track, along);
        if !root.converged {
            warn!(
                "Arclength inversion stopped after {} iterations at t = {:.6}",
                root.iterations, root.t
            );
        }

        // --- 6. Back to geodetic ---
        let local = track.position(root.t);
        let position = offset_to_geo_point(&state.origin, local.x, local.y)?;

        debug!(
            "Predicted target at {} (t = {:.4}, s = {:.2} m, v = {:.3} m/s)",
            position, root.t, travelled, speed_mps
        );

        Ok(Prediction {
            position,
            curve_parameter: root.t,
            phase: PhaseEstimate {
                solution,
                used: phase,
            },
            speed_mps,
            distance_m: travelled,
            converged: root.converged,
            iterations: root.iterations,
            seconds_since_observed: now_s - state.last_observed_time_s,
        })
    }
}

impl Default for TargetPredictor {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

fn reduce_to_loop(distance_m: f64, perimeter: f64) -> f64 {
    if !(perimeter > 0.0) || !distance_m.is_finite() {
        return 0.0;
    }
    distance_m.rem_euclid(perimeter)
}
