// precland_sim/src/simulation/core/state.rs

use precland_core::error::FrameError;
use precland_core::frames::local::LocalFrame;
use precland_core::types::{Attitude, GeoPoint, Pose3};

/// Everything the renderer and detector need about one instant of the world.
///
/// Poses are `(north, east, up)` in the home-anchored [`LocalFrame`]. The state
/// is a plain value: each tick produces a new one from the previous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorState {
    pub home: LocalFrame,
    pub target: Pose3,
    pub vehicle: Pose3,
    pub attitude: Attitude,
}

impl SimulatorState {
    pub fn new(home: LocalFrame) -> Self {
        Self {
            home,
            target: Pose3::default(),
            vehicle: Pose3::default(),
            attitude: Attitude::level(),
        }
    }

    /// The state with the vehicle moved to `location` and oriented to `attitude`.
    pub fn refresh(self, location: &GeoPoint, attitude: Attitude) -> Result<Self, FrameError> {
        let position = self.home.to_local(location)?;
        Ok(Self {
            vehicle: Pose3::from_position(position).with_attitude(attitude),
            attitude,
            ..self
        })
    }

    pub fn with_target(self, target: Pose3) -> Self {
        Self { target, ..self }
    }

    /// Horizontal distance between the vehicle and the target, metres.
    pub fn horizontal_miss(&self) -> f64 {
        let d = self.target.position - self.vehicle.position;
        d.x.hypot(d.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use precland_core::frames::offset_to_geo_point;

    #[test]
    fn test_refresh_returns_a_new_state() {
        let home = GeoPoint::relative(47.0, 8.0, 0.0);
        let frame = LocalFrame::new(home).unwrap();
        let initial = SimulatorState::new(frame).with_target(Pose3::new(5.0, 0.0, 0.0));

        let location = offset_to_geo_point(&home, 3.0, 4.0).unwrap().with_altitude(12.0);
        let attitude = Attitude::new(0.0, 0.0, 0.5);
        let next = initial.refresh(&location, attitude).unwrap();

        assert_eq!(initial.vehicle, Pose3::default());
        assert_abs_diff_eq!(next.vehicle.x(), 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(next.vehicle.y(), 4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(next.vehicle.z(), 12.0);
        assert_eq!(next.attitude, attitude);
        assert_eq!(next.target, initial.target);
        assert_abs_diff_eq!(next.horizontal_miss(), 4.47213595, epsilon = 1e-6);
    }

    #[test]
    fn test_refresh_rejects_mixed_altitude_references() {
        let frame = LocalFrame::new(GeoPoint::relative(47.0, 8.0, 0.0)).unwrap();
        let state = SimulatorState::new(frame);
        assert!(state
            .refresh(&GeoPoint::global(47.0, 8.0, 500.0), Attitude::level())
            .is_err());
    }
}
