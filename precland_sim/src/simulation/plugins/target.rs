// precland_sim/src/simulation/plugins/target.rs

use crate::simulation::config::TargetMotion;
use precland_core::estimation::predictor::{RotationSense, SpeedProfile};
use precland_core::models::trajectory::LemniscateTrack;
use precland_core::types::Pose3;

/// Ground-truth motion of the landing target.
///
/// A tracked target moves along the same ground track the estimator assumes,
/// at the same mission-time speed schedule.
#[derive(Debug, Clone)]
pub struct TargetMover {
    motion: Motion,
    elapsed_s: f64,
}

#[derive(Debug, Clone)]
enum Motion {
    Static {
        north_m: f64,
        east_m: f64,
    },
    Track {
        track: LemniscateTrack,
        profile: SpeedProfile,
        parameter: f64,
        rotation: RotationSense,
    },
}

impl TargetMover {
    /// `track` and `profile` are only used for [`TargetMotion::Track`].
    pub fn new(
        motion: &TargetMotion,
        track: LemniscateTrack,
        profile: SpeedProfile,
        mission_elapsed_s: f64,
    ) -> Self {
        let motion = match *motion {
            TargetMotion::Static { north_m, east_m } => Motion::Static { north_m, east_m },
            TargetMotion::Track {
                phase,
                start_parameter,
                rotation,
            } => Motion::Track {
                track: track.with_phase(phase),
                profile,
                parameter: start_parameter,
                rotation,
            },
        };
        Self {
            motion,
            elapsed_s: mission_elapsed_s,
        }
    }

    /// Current ground pose `(north, east, 0)` relative to home.
    pub fn pose(&self) -> Pose3 {
        match &self.motion {
            Motion::Static { north_m, east_m } => Pose3::new(*north_m, *east_m, 0.0),
            Motion::Track {
                track, parameter, ..
            } => {
                let p = track.position(*parameter);
                Pose3::new(p.x, p.y, 0.0)
            }
        }
    }

    /// Moves the target forward by `dt` seconds of mission time.
    pub fn advance(&mut self, dt: f64) {
        if let Motion::Track {
            track,
            profile,
            parameter,
            rotation,
        } = &mut self.motion
        {
            let speed = profile.speed_mps(self.elapsed_s);
            let rate = track.speed(*parameter);
            if rate > 0.0 {
                *parameter += rotation.sign() * speed * dt / rate;
            }
        }
        self.elapsed_s += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_static_target_stays_put() {
        let mut mover = TargetMover::new(
            &TargetMotion::Static {
                north_m: 4.0,
                east_m: -2.0,
            },
            LemniscateTrack::default(),
            SpeedProfile::default(),
            0.0,
        );
        mover.advance(10.0);
        assert_eq!(mover.pose(), Pose3::new(4.0, -2.0, 0.0));
    }

    #[test]
    fn test_tracked_target_covers_scheduled_distance() {
        let track = LemniscateTrack::default();
        let mut mover = TargetMover::new(
            &TargetMotion::Track {
                phase: 0.0,
                start_parameter: 0.0,
                rotation: RotationSense::Ccw,
            },
            track,
            SpeedProfile::default(),
            0.0,
        );
        for _ in 0..100 {
            mover.advance(0.1);
        }
        let Motion::Track { parameter, .. } = mover.motion else {
            panic!("expected tracked motion");
        };
        // 10 s at 15 km/h along the curve.
        assert_relative_eq!(track.arc_length(parameter), 10.0 * 15.0 / 3.6, max_relative = 1e-2);
    }
}
