// precland_sim/src/simulation/runner.rs

//! The closed simulation loop: move the world, render, detect, guide, command.

use crate::simulation::config::{ScenarioConfig, TargetMotion};
use crate::simulation::core::pacing::FramePacer;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::core::state::SimulatorState;
use crate::simulation::error::SimError;
use crate::simulation::plugins::camera::{load_appearance, render_state, save_frame};
use crate::simulation::plugins::perception::{MarkerDetector, OracleDetector};
use crate::simulation::plugins::target::TargetMover;
use crate::simulation::plugins::vehicle::SimVehicle;
use image::{Rgb, RgbImage};
use mavlink::common::MavMessage;
use precland_core::controllers::landing::{GuidanceCommand, LandingGuidance, Observation};
use precland_core::estimation::predictor::TargetPredictor;
use precland_core::frames::local::LocalFrame;
use precland_core::messages::{CommandSink, RESEND_INTERVAL};
use precland_core::models::trajectory::LemniscateTrack;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options that come from the command line rather than the scenario.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory for rendered frames; `None` skips rendering.
    pub frames_dir: Option<PathBuf>,
    /// Overrides `simulation.duration_seconds`.
    pub duration_seconds: Option<f64>,
    /// Runs as fast as possible even when `simulation.realtime` is set.
    pub fast: bool,
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub simulated_seconds: f64,
    pub frames: usize,
    pub landed: bool,
    /// Horizontal distance between vehicle and target at the end, metres.
    pub miss_distance_m: f64,
    pub commands_sent: usize,
    pub marker_sightings: usize,
}

/// A command message due at a simulation time.
#[derive(Debug, Clone)]
struct Scheduled {
    due_s: f64,
    message: MavMessage,
}

/// Owns every piece of one simulation run.
pub struct Simulator {
    config: ScenarioConfig,
    options: RunOptions,
    state: SimulatorState,
    rng: SimulationRng,
    vehicle: SimVehicle,
    target: TargetMover,
    detector: Box<dyn MarkerDetector>,
    guidance: LandingGuidance,
    mirror: Option<Box<dyn CommandSink>>,
    appearance: Option<RgbImage>,
    queue: VecDeque<Scheduled>,
}

impl Simulator {
    pub fn new(config: ScenarioConfig, options: RunOptions) -> Result<Self, SimError> {
        let home = LocalFrame::new(config.simulation.home.to_geo_point())?;
        let camera = config.camera.model;

        let predictor = TargetPredictor::new(config.estimator.clone());
        let track = LemniscateTrack::new(config.estimator.track, config.estimator.arc_step);
        let target = TargetMover::new(
            &config.target.motion,
            track,
            config.estimator.speed_profile.clone(),
            -config.simulation.mission_start_seconds,
        );
        let mut guidance = LandingGuidance::new(
            config.guidance,
            camera,
            predictor,
            *home.home(),
            config.simulation.mission_start_seconds,
        );
        if let TargetMotion::Track { rotation, .. } = config.target.motion {
            guidance = guidance.with_rotation(rotation);
        }

        let appearance = match &options.frames_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Some(load_appearance(config.target.image.as_deref())?)
            }
            None => None,
        };

        Ok(Self {
            state: SimulatorState::new(home).with_target(target.pose()),
            rng: SimulationRng::from_seed(config.simulation.seed),
            vehicle: SimVehicle::new(home, &config.vehicle),
            detector: Box::new(OracleDetector::new(camera, config.vehicle.pixel_noise_stddev)),
            target,
            guidance,
            mirror: None,
            appearance,
            queue: VecDeque::new(),
            config,
            options,
        })
    }

    /// Also forwards every command delivered to the simulated vehicle to `sink`.
    pub fn with_mirror(mut self, sink: Box<dyn CommandSink>) -> Self {
        self.mirror = Some(sink);
        self
    }

    /// Replaces the default oracle detector.
    pub fn with_detector(mut self, detector: Box<dyn MarkerDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    pub fn guidance(&self) -> &LandingGuidance {
        &self.guidance
    }

    /// Runs until touchdown or the configured duration.
    pub fn run(mut self) -> Result<RunReport, SimError> {
        let camera = self.config.camera.model;
        let dt = 1.0 / camera.frame_rate;
        let duration = self
            .options
            .duration_seconds
            .unwrap_or(self.config.simulation.duration_seconds);
        let [r, g, b] = self.config.camera.background;
        let background = Rgb([r, g, b]);
        let mut pacer = if self.config.simulation.realtime && !self.options.fast {
            Some(FramePacer::new(camera.frame_rate)?)
        } else {
            None
        };

        info!(
            "Starting run: {:.0} s at {:.1} fps, seed {}",
            duration, camera.frame_rate, self.config.simulation.seed
        );

        let max_frames = (duration * camera.frame_rate).round() as usize;
        let mut clock_s = 0.0;
        let mut frames = 0;
        let mut commands_sent = 0;
        let mut marker_sightings = 0;

        while frames < max_frames && !self.vehicle.is_landed() {
            // --- Advance the world ---
            self.target.advance(dt);
            self.vehicle.step(dt);
            clock_s = (frames + 1) as f64 * dt;
            commands_sent += self.deliver_due(clock_s)?;

            let location = self.vehicle.location()?;
            self.state = self
                .state
                .refresh(&location, self.vehicle.attitude())?
                .with_target(self.target.pose());

            // --- Sense ---
            if let (Some(dir), Some(appearance)) = (&self.options.frames_dir, &self.appearance) {
                match render_state(&camera, &self.state, self.config.target.size_m, appearance, background) {
                    Ok(frame) => {
                        save_frame(&frame, dir, frames)?;
                    }
                    Err(e) => debug!("Frame {} not rendered: {}", frames, e),
                }
            }
            if let Some(pacer) = pacer.as_mut() {
                pacer.wait();
            }
            frames += 1;

            // --- Decide, unless a command stream is still playing out or we are landing ---
            if !self.queue.is_empty() || self.guidance.is_landing() {
                continue;
            }
            let observation = self.detector.detect(&self.state, &mut self.rng);
            if matches!(observation, Observation::Marker { .. }) {
                marker_sightings += 1;
            }
            let telemetry = self.vehicle.telemetry(&mut self.rng)?;
            let command = self.guidance.step(&telemetry, observation)?;
            self.schedule(&command, clock_s)?;
        }

        commands_sent += self.deliver_due(f64::INFINITY)?;
        let report = RunReport {
            simulated_seconds: clock_s,
            frames,
            landed: self.vehicle.is_landed(),
            miss_distance_m: self.state.horizontal_miss(),
            commands_sent,
            marker_sightings,
        };
        if report.landed {
            info!(
                "Landed after {:.1} s, {:.2} m from the target",
                report.simulated_seconds, report.miss_distance_m
            );
        } else {
            warn!(
                "Run ended after {:.1} s without landing, {:.2} m from the target",
                report.simulated_seconds, report.miss_distance_m
            );
        }
        Ok(report)
    }

    /// Expands `command` into timed messages: streams at 10 Hz, one-shots now.
    fn schedule(&mut self, command: &GuidanceCommand, now_s: f64) -> Result<(), SimError> {
        let mut messages: Vec<MavMessage> = Vec::new();
        command.issue(&mut messages, |_: Duration| {})?;
        let step = RESEND_INTERVAL.as_secs_f64();
        for (i, message) in messages.into_iter().enumerate() {
            self.queue.push_back(Scheduled {
                due_s: now_s + i as f64 * step,
                message,
            });
        }
        Ok(())
    }

    /// Hands every message due by `now_s` to the vehicle and the mirror.
    fn deliver_due(&mut self, now_s: f64) -> Result<usize, SimError> {
        let mut delivered = 0;
        while self.queue.front().map_or(false, |s| s.due_s <= now_s) {
            let Some(scheduled) = self.queue.pop_front() else {
                break;
            };
            if self.vehicle.is_landed() {
                continue;
            }
            self.vehicle.send(&scheduled.message)?;
            if let Some(mirror) = self.mirror.as_mut() {
                mirror.send(&scheduled.message)?;
            }
            delivered += 1;
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::parse_scenario;
    use precland_core::estimation::predictor::RotationSense;
    use precland_core::types::Pose3;
    use precland_core::error::CommandError;
    use std::sync::{Arc, Mutex};

    fn scenario(toml_text: &str) -> ScenarioConfig {
        parse_scenario(toml_text).unwrap()
    }

    fn fast() -> RunOptions {
        RunOptions {
            fast: true,
            ..RunOptions::default()
        }
    }

    /// A detector that never finds the marker.
    struct BlindDetector;

    impl MarkerDetector for BlindDetector {
        fn detect(&mut self, _: &SimulatorState, _: &mut SimulationRng) -> Observation {
            Observation::Lost
        }
    }

    /// Records what reaches the mirror link.
    struct SharedRecorder(Arc<Mutex<Vec<MavMessage>>>);

    impl CommandSink for SharedRecorder {
        fn send(&mut self, message: &MavMessage) -> Result<(), CommandError> {
            self.0
                .lock()
                .map_err(|e| CommandError::Link(e.to_string()))?
                .push(message.clone());
            Ok(())
        }
    }

    #[test]
    fn test_lands_on_static_target() {
        let config = scenario(
            r#"
            [simulation]
            duration_seconds = 120.0

            [camera.model]
            frame_rate = 10.0

            [target.motion]
            type = "Static"
            north_m = 3.0
            east_m = -2.0
            "#,
        );
        let report = Simulator::new(config, fast()).unwrap().run().unwrap();
        assert!(report.landed, "report: {report:?}");
        assert!(report.miss_distance_m < 0.6, "report: {report:?}");
        assert!(report.marker_sightings > 0);
        assert!(report.commands_sent > 0);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let text = r#"
            [simulation]
            duration_seconds = 20.0
            seed = 11

            [camera.model]
            frame_rate = 10.0

            [vehicle]
            gps_noise_stddev_m = 0.3
            pixel_noise_stddev = 2.0
            "#;
        let a = Simulator::new(scenario(text), fast()).unwrap().run().unwrap();
        let b = Simulator::new(scenario(text), fast()).unwrap().run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duration_override_and_mirror() {
        let config = scenario(
            r#"
            [camera.model]
            frame_rate = 10.0
            "#,
        );
        assert!(matches!(config.target.motion, TargetMotion::Static { .. }));
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let options = RunOptions {
            duration_seconds: Some(2.0),
            ..fast()
        };
        let report = Simulator::new(config, options)
            .unwrap()
            .with_mirror(Box::new(SharedRecorder(recorded.clone())))
            .run()
            .unwrap();
        assert!(report.simulated_seconds <= 2.0 + 1e-9);
        assert_eq!(report.frames, 20);
        assert_eq!(recorded.lock().unwrap().len(), report.commands_sent);
    }

    #[test]
    fn test_tracked_target_run_completes() {
        let config = scenario(
            r#"
            [simulation]
            duration_seconds = 30.0

            [camera.model]
            frame_rate = 10.0

            [target.motion]
            type = "Track"

            [vehicle]
            start_north_m = 90.0
            start_east_m = 30.0

            [estimator]
            phase_policy = "assume_zero"
            "#,
        );
        let report = Simulator::new(config, fast()).unwrap().run().unwrap();
        assert!(report.frames > 0);
        assert!(report.marker_sightings > 0);
        assert!(report.commands_sent > 0);
    }

    #[test]
    fn test_renders_frames_to_disk() {
        let dir = std::env::temp_dir().join(format!("precland_frames_{}", std::process::id()));
        let options = RunOptions {
            frames_dir: Some(dir.clone()),
            duration_seconds: Some(0.3),
            fast: true,
        };
        let config = scenario("[camera.model]\nframe_rate = 10.0\n");
        let report = Simulator::new(config, options).unwrap().run().unwrap();
        assert_eq!(report.frames, 3);
        assert!(dir.join("frame_00000.png").is_file());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_track_rotation_reaches_guidance() {
        let config = scenario(
            r#"
            [target.motion]
            type = "Track"
            rotation = "cw"
            "#,
        );
        let simulator = Simulator::new(config, fast()).unwrap();
        assert_eq!(simulator.guidance().rotation(), RotationSense::Cw);

        let still = Simulator::new(scenario(""), fast()).unwrap();
        assert_eq!(still.guidance().rotation(), RotationSense::Ccw);
    }

    #[test]
    fn test_initial_state_and_replaced_detector() {
        let config = scenario(
            r#"
            [simulation]
            duration_seconds = 5.0

            [camera.model]
            frame_rate = 10.0
            "#,
        );
        let simulator = Simulator::new(config, fast()).unwrap();
        assert_eq!(simulator.state().target, Pose3::new(5.0, 0.0, 0.0));

        let report = simulator.with_detector(Box::new(BlindDetector)).run().unwrap();
        assert!(!report.landed);
        assert_eq!(report.marker_sightings, 0);
        assert_eq!(report.frames, 50);
    }
}
