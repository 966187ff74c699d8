// precland_core/src/estimation/phase.rs

//! Solving for the track's phase shift from a single sighting.
//!
//! The sighting's local `(x0, y0)` must lie on the curve for some parameter.
//! Two arccos identities give two candidate pairs, one from the north
//! coordinate and one from the east coordinate. The candidate that agrees with
//! its partner (compared after integer truncation) wins.

use crate::error::TrajectoryError;
use crate::models::trajectory::TrackShape;
use serde::{Deserialize, Serialize};

/// Result of the phase solve. Callers must pick a policy for the non-`Solved` cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseSolution {
    Solved(f64),
    /// Both arccos domains are violated for this sighting.
    Undefined,
    /// Candidates exist but none agree.
    Ambiguous,
}

impl PhaseSolution {
    pub fn is_solved(&self) -> bool {
        matches!(self, PhaseSolution::Solved(_))
    }
}

/// What to do when the phase cannot be solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhasePolicy {
    /// Refuse to predict.
    #[default]
    Reject,
    /// Predict with φ = 0. The estimate is degraded and flagged as such.
    AssumeZero,
}

impl PhasePolicy {
    /// Resolves a solution into the phase to use, or the error the policy demands.
    pub fn resolve(&self, solution: PhaseSolution, x0: f64, y0: f64) -> Result<f64, TrajectoryError> {
        match (solution, self) {
            (PhaseSolution::Solved(phase), _) => Ok(phase),
            (_, PhasePolicy::AssumeZero) => Ok(0.0),
            (PhaseSolution::Undefined, PhasePolicy::Reject) => {
                Err(TrajectoryError::PhaseSolveUndefined { x0, y0 })
            }
            (PhaseSolution::Ambiguous, PhasePolicy::Reject) => {
                Err(TrajectoryError::PhaseSolveAmbiguous { x0, y0 })
            }
        }
    }
}

/// North-coordinate candidates `(acos(-r), acos(r))`, if `r < 1`.
fn north_candidates(shape: &TrackShape, x0: f64) -> Option<(f64, f64)> {
    let a2 = shape.a * shape.a;
    let dx2 = (x0 - shape.cx) * (x0 - shape.cx);
    let r = ((2.0 * dx2) / (a2 + dx2)).sqrt();
    (r.abs() < 1.0).then(|| ((-r).acos(), r.acos()))
}

/// East-coordinate candidates, the roots of
/// `(4B² + dy²) w² - 6 dy² w + 9 dy² - 4B² = 0`, if the discriminant is positive.
fn east_candidates(shape: &TrackShape, y0: f64) -> Option<(f64, f64)> {
    let k = 4.0 * shape.b * shape.b;
    let dy2 = (y0 - shape.cy) * (y0 - shape.cy);
    let discriminant = 4.0 * k * k - 32.0 * k * dy2;
    if !(discriminant > 0.0) {
        return None;
    }
    let root = discriminant.sqrt();
    let denom = 2.0 * (k + dy2);
    let c = ((6.0 * dy2 + root) / denom).clamp(-1.0, 1.0).acos();
    let d = ((6.0 * dy2 - root) / denom).clamp(-1.0, 1.0).acos();
    Some((c, d))
}

fn same_whole_part(a: f64, b: f64) -> bool {
    a.trunc() == b.trunc()
}

/// Solves the phase shift of `shape` for a sighting at local `(x0, y0)` (north, east).
pub fn solve_phase(shape: &TrackShape, x0: f64, y0: f64) -> PhaseSolution {
    let north = north_candidates(shape, x0);
    let east = east_candidates(shape, y0);

    match (north, east) {
        (None, None) => PhaseSolution::Undefined,
        (Some((a, b)), east) => {
            let east_agrees = east.map_or(false, |(c, d)| same_whole_part(c, d));
            if same_whole_part(a, b) || east_agrees {
                return PhaseSolution::Solved(a);
            }
            match east {
                Some((c, d)) if same_whole_part(b, c) || same_whole_part(b, d) => {
                    PhaseSolution::Solved(b)
                }
                _ => PhaseSolution::Ambiguous,
            }
        }
        (None, Some(_)) => PhaseSolution::Ambiguous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_track_centre_solves_to_quarter_turn() {
        match solve_phase(&TrackShape::default(), 50.0, 30.0) {
            PhaseSolution::Solved(phase) => assert_abs_diff_eq!(phase, FRAC_PI_2, epsilon = 1e-12),
            other => panic!("expected a solved phase, got {other:?}"),
        }
    }

    #[test]
    fn test_far_sighting_is_undefined() {
        assert_eq!(solve_phase(&TrackShape::default(), 200.0, 100.0), PhaseSolution::Undefined);
    }

    #[test]
    fn test_north_branch_only_without_agreement_is_ambiguous() {
        // r ~ 0.974: acos(-r) ~ 2.91 and acos(r) ~ 0.23, east branch invalid.
        assert_eq!(solve_phase(&TrackShape::default(), 88.0, 100.0), PhaseSolution::Ambiguous);
    }

    #[test]
    fn test_east_branch_only_is_ambiguous() {
        assert_eq!(solve_phase(&TrackShape::default(), 200.0, 30.0), PhaseSolution::Ambiguous);
    }

    #[test]
    fn test_centre_follows_configured_shape() {
        let shape = TrackShape {
            cx: 0.0,
            cy: 0.0,
            ..TrackShape::default()
        };
        match solve_phase(&shape, 0.0, 0.0) {
            PhaseSolution::Solved(phase) => assert_abs_diff_eq!(phase, FRAC_PI_2, epsilon = 1e-12),
            other => panic!("expected a solved phase, got {other:?}"),
        }
        // The default centre is far off this track.
        assert_eq!(solve_phase(&shape, 50.0, 30.0), PhaseSolution::Undefined);
    }

    #[test]
    fn test_amplitudes_scale_the_branches() {
        let shape = TrackShape {
            a: 80.0,
            b: 40.0,
            ..TrackShape::default()
        };
        // Undefined on the default track, inside the doubled one.
        assert_eq!(solve_phase(&TrackShape::default(), 200.0, 100.0), PhaseSolution::Undefined);
        assert_ne!(solve_phase(&shape, 100.0, 60.0), PhaseSolution::Undefined);
    }

    #[test]
    fn test_policy_resolution() {
        assert_eq!(PhasePolicy::Reject.resolve(PhaseSolution::Solved(0.5), 0.0, 0.0), Ok(0.5));
        assert_eq!(PhasePolicy::AssumeZero.resolve(PhaseSolution::Undefined, 1.0, 2.0), Ok(0.0));
        assert_eq!(
            PhasePolicy::Reject.resolve(PhaseSolution::Undefined, 1.0, 2.0),
            Err(TrajectoryError::PhaseSolveUndefined { x0: 1.0, y0: 2.0 })
        );
        assert_eq!(
            PhasePolicy::Reject.resolve(PhaseSolution::Ambiguous, 1.0, 2.0),
            Err(TrajectoryError::PhaseSolveAmbiguous { x0: 1.0, y0: 2.0 })
        );
    }
}
