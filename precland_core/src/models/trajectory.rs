// precland_core/src/models/trajectory.rs

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Default integration step for the arclength, in radians of curve parameter.
pub const DEFAULT_ARC_STEP: f64 = 0.001;

/// Fixed constants of the lemniscate-like ground track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TrackShape {
    /// Centre of the track, metres north of the origin.
    pub cx: f64,
    /// Centre of the track, metres east of the origin.
    pub cy: f64,
    /// North amplitude; also the speed scale of the analytic speed model.
    pub a: f64,
    /// East amplitude.
    pub b: f64,
}

impl Default for TrackShape {
    fn default() -> Self {
        Self {
            cx: 50.0,
            cy: 30.0,
            a: 40.0,
            b: 20.0,
        }
    }
}

/// The target's ground track, a lemniscate-like closed curve with a phase shift.
///
/// `x` is the north offset and `y` the east offset from the track origin:
///
/// ```text
/// x(t) = cx + A cos(t+φ) / (sin t · sin(t+φ) + 1)
/// y(t) = cy + B sin(2(t+φ)) / (sin t · sin(t+φ) + 1)
/// ```
///
/// Speed along the curve is modelled analytically as `A / sqrt(1 + sin²(t+φ))`.
/// That function has period π, so the full-loop perimeter does not depend on φ;
/// it is integrated once at construction and shared by every phase of the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LemniscateTrack {
    shape: TrackShape,
    phase: f64,
    step: f64,
    perimeter: f64,
}

impl LemniscateTrack {
    pub fn new(shape: TrackShape, step: f64) -> Self {
        let step = if step > 0.0 { step } else { DEFAULT_ARC_STEP };
        let mut track = Self {
            shape,
            phase: 0.0,
            step,
            perimeter: 0.0,
        };
        track.perimeter = track.arc_length(TAU);
        track
    }

    /// The same track shifted to phase `phase`, reusing the cached perimeter.
    pub fn with_phase(&self, phase: f64) -> Self {
        Self { phase, ..*self }
    }

    pub fn shape(&self) -> &TrackShape {
        &self.shape
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Arclength of one full loop, `arc_length(2π)`.
    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    /// Position `(north, east)` at curve parameter `t`.
    pub fn position(&self, t: f64) -> Vector2<f64> {
        let s = &self.shape;
        let tp = t + self.phase;
        let denom = t.sin() * tp.sin() + 1.0;
        Vector2::new(
            s.cx + s.a * tp.cos() / denom,
            s.cy + s.b * (2.0 * tp).sin() / denom,
        )
    }

    /// Analytic velocity model `(ẋ, ẏ)` at curve parameter `t`.
    ///
    /// Exact at φ = 0 for tracks with `b = a / 2`; like [`Self::speed`] it is
    /// scaled by `a` alone.
    pub fn velocity(&self, t: f64) -> Vector2<f64> {
        let a = self.shape.a;
        let sin_tp = (t + self.phase).sin();
        let sin2 = sin_tp * sin_tp;
        let denom = (1.0 + sin2) * (1.0 + sin2);
        Vector2::new(
            (a * sin2 * sin_tp - 3.0 * a * sin_tp) / denom,
            (a - 3.0 * a * sin2) / denom,
        )
    }

    /// Instantaneous speed along the curve at parameter `t`.
    pub fn speed(&self, t: f64) -> f64 {
        let sin_tp = (t + self.phase).sin();
        self.shape.a / (1.0 + sin_tp * sin_tp).sqrt()
    }

    /// Arclength from parameter 0 to `t` by fixed-step integration of [`Self::speed`].
    ///
    /// Whole steps are summed left-Riemann style and the remainder is a partial
    /// step, so the result is continuous, non-decreasing and exactly 0 at `t <= 0`.
    /// Costs `O(t / step)` speed evaluations.
    pub fn arc_length(&self, t: f64) -> f64 {
        if !(t > 0.0) {
            return 0.0;
        }
        let h = self.step;
        let whole = (t / h).floor();
        let n = whole as usize;

        let mut integral = 0.0;
        for k in 0..n {
            integral += self.speed(k as f64 * h) * h;
        }
        integral + self.speed(whole * h) * (t - whole * h)
    }
}

impl Default for LemniscateTrack {
    fn default() -> Self {
        Self::new(TrackShape::default(), DEFAULT_ARC_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_arc_length_at_zero_is_zero() {
        let track = LemniscateTrack::default();
        assert_eq!(track.arc_length(0.0), 0.0);
        assert_eq!(track.arc_length(-1.0), 0.0);
        assert_eq!(track.with_phase(1.3).arc_length(0.0), 0.0);
    }

    #[test]
    fn test_arc_length_is_monotone() {
        for phase in [0.0, 0.4, 2.0] {
            let track = LemniscateTrack::default().with_phase(phase);
            let mut previous = 0.0;
            for i in 0..=400 {
                let t = i as f64 * TAU / 400.0 + 0.000_37 * (i % 3) as f64;
                let s = track.arc_length(t);
                assert!(s >= previous, "arc_length decreased at t = {t}");
                previous = s;
            }
        }
    }

    #[test]
    fn test_arc_length_is_continuous_across_step_boundaries() {
        let track = LemniscateTrack::default();
        let boundary = 1.234;
        let below = track.arc_length(boundary - 1e-9);
        let above = track.arc_length(boundary + 1e-9);
        assert_abs_diff_eq!(below, above, epsilon = 1e-6);
    }

    #[test]
    fn test_perimeter_matches_elliptic_integral() {
        // 4 K(i) with K(i) ~= 1.311028777 for the default speed scale of 40.
        let track = LemniscateTrack::default();
        assert_relative_eq!(track.perimeter(), 40.0 * 4.0 * 1.311_028_777, max_relative = 1e-4);
    }

    #[test]
    fn test_perimeter_is_independent_of_phase() {
        let track = LemniscateTrack::default();
        for phase in [0.3, 1.0, 2.5] {
            let shifted = track.with_phase(phase);
            assert_relative_eq!(shifted.arc_length(TAU), track.perimeter(), max_relative = 1e-6);
        }
    }

    #[test]
    fn test_position_at_zero_phase() {
        let track = LemniscateTrack::default();
        let p = track.position(0.0);
        assert_abs_diff_eq!(p.x, 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_velocity_matches_position_derivative() {
        let track = LemniscateTrack::default();
        let h = 1e-6;
        for t in [0.0, 0.4, 1.3, 2.9, 4.1] {
            let numeric = (track.position(t + h) - track.position(t - h)) / (2.0 * h);
            let analytic = track.velocity(t);
            assert_abs_diff_eq!(analytic.x, numeric.x, epsilon = 1e-5);
            assert_abs_diff_eq!(analytic.y, numeric.y, epsilon = 1e-5);
        }
        // Heading straight east through the start point.
        let v0 = track.velocity(0.0);
        assert_abs_diff_eq!(v0.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v0.y, 40.0, epsilon = 1e-12);
    }

    #[test]
    fn test_speed_bounds() {
        let track = LemniscateTrack::default();
        for i in 0..100 {
            let v = track.speed(i as f64 * 0.1);
            assert!(v <= 40.0 + 1e-12 && v >= 40.0 / 2f64.sqrt() - 1e-12);
        }
    }
}
