// precland_core/src/estimation/root.rs

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Stopping rules for the bracketed Newton solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RootSettings {
    /// Converged once `|F(t)|` drops below this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 1000,
        }
    }
}

/// Outcome of a root search. Non-convergence is not an error: `t` is the best
/// estimate reached when the iteration budget ran out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSolution<T> {
    pub t: T,
    pub iterations: usize,
    pub converged: bool,
}

/// Finds `t` in `[lower, upper]` with `f(t) ≈ 0` for a non-decreasing `f`.
///
/// Each iteration shrinks the bracket on the side indicated by the sign of
/// `f(t)`, then takes a Newton step with derivative `df(t)`. The Newton candidate
/// is only accepted while it stays strictly inside the bracket; otherwise the
/// solver bisects.
pub fn solve_bracketed_newton<T, F, D>(
    f: F,
    df: D,
    mut lower: T,
    mut upper: T,
    initial: T,
    settings: &RootSettings,
) -> RootSolution<T>
where
    T: Float,
    F: Fn(T) -> T,
    D: Fn(T) -> T,
{
    let half = T::from(0.5).unwrap_or_else(T::one);
    let tolerance = T::from(settings.tolerance).unwrap_or_else(T::epsilon);
    let mut t = initial.max(lower).min(upper);

    for i in 0..settings.max_iterations {
        let value = f(t);
        if value.abs() < tolerance {
            return RootSolution {
                t,
                iterations: i,
                converged: true,
            };
        }

        let slope = df(t);
        let candidate = t - value / slope;

        if value > T::zero() {
            upper = t;
            t = if !(candidate > lower) {
                half * (upper + lower)
            } else {
                candidate
            };
        } else {
            lower = t;
            t = if !(candidate < upper) {
                half * (upper + lower)
            } else {
                candidate
            };
        }
    }

    RootSolution {
        t,
        iterations: settings.max_iterations,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_finds_cube_root() {
        let solution = solve_bracketed_newton(
            |t: f64| t * t * t - 10.0,
            |t: f64| 3.0 * t * t,
            0.0,
            5.0,
            2.5,
            &RootSettings::default(),
        );
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.t, 10f64.cbrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_zero_derivative_falls_back_to_bisection() {
        // Slope 0 at the start makes the Newton candidate infinite.
        let solution = solve_bracketed_newton(
            |t: f64| t * t * t - 1.0,
            |t: f64| 3.0 * t * t,
            -1.0,
            2.0,
            0.0,
            &RootSettings::default(),
        );
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.t, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_budget_exhaustion_reports_best_estimate() {
        let settings = RootSettings {
            tolerance: 1e-15,
            max_iterations: 3,
        };
        // A wrong derivative slows convergence enough to run out of budget.
        let solution = solve_bracketed_newton(
            |t: f64| t - 0.3,
            |_t: f64| 100.0,
            0.0,
            1.0,
            1.0,
            &settings,
        );
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 3);
        assert!(solution.t > 0.3 && solution.t <= 1.0);
    }

    #[test]
    fn test_works_in_single_precision() {
        let solution = solve_bracketed_newton(
            |t: f32| t * t - 2.0,
            |t: f32| 2.0 * t,
            0.0f32,
            2.0,
            1.0,
            &RootSettings {
                tolerance: 1e-5,
                max_iterations: 100,
            },
        );
        assert!(solution.converged);
        assert_abs_diff_eq!(solution.t, 2f32.sqrt(), epsilon = 1e-4);
    }
}
