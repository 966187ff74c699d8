// precland_sim/src/simulation/plugins/perception.rs

use crate::simulation::core::prng::SimulationRng;
use crate::simulation::core::state::SimulatorState;
use precland_core::controllers::landing::Observation;
use precland_core::models::camera::CameraModel;
use precland_core::types::Pose3;
use rand_distr::{Distribution, Normal};

/// Anything that turns the current world into a marker observation.
pub trait MarkerDetector {
    fn detect(&mut self, state: &SimulatorState, rng: &mut SimulationRng) -> Observation;
}

/// Stand-in for a real fiducial detector.
///
/// Projects the true target centre through the camera model and reports it,
/// with optional Gaussian pixel error. The marker is lost when it is behind the
/// camera or its centre falls outside the raster.
#[derive(Debug, Clone)]
pub struct OracleDetector {
    camera: CameraModel,
    pixel_noise: Option<Normal<f64>>,
}

impl OracleDetector {
    pub fn new(camera: CameraModel, pixel_noise_stddev: f64) -> Self {
        let pixel_noise = if pixel_noise_stddev > 0.0 {
            Normal::new(0.0, pixel_noise_stddev).ok()
        } else {
            None
        };
        Self {
            camera,
            pixel_noise,
        }
    }
}

impl MarkerDetector for OracleDetector {
    fn detect(&mut self, state: &SimulatorState, rng: &mut SimulationRng) -> Observation {
        // Same depth convention as the renderer: up becomes negative depth.
        let target = Pose3::new(state.target.x(), state.target.y(), -state.target.z());
        let eye = Pose3::new(state.vehicle.x(), state.vehicle.y(), -state.vehicle.z());
        let Ok((mut u, mut v)) = self.camera.project_to_pixel(&state.attitude, &target, &eye) else {
            return Observation::Lost;
        };

        if let Some(noise) = &self.pixel_noise {
            u += noise.sample(&mut rng.0);
            v += noise.sample(&mut rng.0);
        }

        let (w, h) = (self.camera.width as f64, self.camera.height as f64);
        if (0.0..w).contains(&u) && (0.0..h).contains(&v) {
            Observation::Marker { center_px: (u, v) }
        } else {
            Observation::Lost
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use precland_core::frames::local::LocalFrame;
    use precland_core::types::{Attitude, GeoPoint};

    fn state(vehicle: Pose3, target: Pose3) -> SimulatorState {
        let home = LocalFrame::new(GeoPoint::relative(47.0, 8.0, 0.0)).unwrap();
        SimulatorState {
            vehicle,
            target,
            attitude: Attitude::level(),
            ..SimulatorState::new(home)
        }
    }

    #[test]
    fn test_target_below_is_seen_at_centre() {
        let mut detector = OracleDetector::new(CameraModel::default(), 0.0);
        let mut rng = SimulationRng::from_seed(1);
        let obs = detector.detect(&state(Pose3::new(3.0, 3.0, 15.0), Pose3::new(3.0, 3.0, 0.0)), &mut rng);
        match obs {
            Observation::Marker { center_px } => {
                assert_abs_diff_eq!(center_px.0, 320.0, epsilon = 1e-9);
                assert_abs_diff_eq!(center_px.1, 240.0, epsilon = 1e-9);
            }
            Observation::Lost => panic!("target directly below should be visible"),
        }
    }

    #[test]
    fn test_target_out_of_view_is_lost() {
        let mut detector = OracleDetector::new(CameraModel::default(), 0.0);
        let mut rng = SimulationRng::from_seed(1);
        let far = state(Pose3::new(0.0, 0.0, 5.0), Pose3::new(100.0, 0.0, 0.0));
        assert_eq!(detector.detect(&far, &mut rng), Observation::Lost);

        let landed = state(Pose3::new(0.0, 0.0, 0.0), Pose3::new(0.0, 0.0, 0.0));
        assert_eq!(detector.detect(&landed, &mut rng), Observation::Lost);
    }

    #[test]
    fn test_detection_round_trips_through_guidance_unprojection() {
        let camera = CameraModel::default();
        let mut detector = OracleDetector::new(camera, 0.0);
        let mut rng = SimulationRng::from_seed(1);
        let s = state(Pose3::new(0.0, 0.0, 12.0), Pose3::new(2.0, -1.5, 0.0));
        let Observation::Marker { center_px } = detector.detect(&s, &mut rng) else {
            panic!("target should be visible");
        };
        let (north, east) = camera.unproject_level(center_px, 12.0, 0.0).unwrap();
        assert_abs_diff_eq!(north, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(east, -1.5, epsilon = 1e-9);
    }
}
