// precland_core/src/error.rs

//! Error kinds shared by the geometry, projection, prediction and command layers.
//!
//! Everything here is pure math, so nothing is retried. The types only decide
//! whether a degenerate input is surfaced to the caller or reported alongside a
//! degraded-but-usable estimate.

use crate::types::AltitudeReference;
use thiserror::Error;

/// Failures of the geodetic frame conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The geodetic variant is not one we know how to convert, or the point
    /// cannot anchor a local tangent plane (non-finite, or on a pole).
    #[error("invalid geodetic frame: {0}")]
    InvalidFrame(String),

    /// Two points with different altitude references were mixed in one computation.
    #[error("altitude reference mismatch: expected {expected:?}, found {found:?}")]
    ReferenceMismatch {
        expected: AltitudeReference,
        found: AltitudeReference,
    },
}

/// Failures of the pinhole projection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// The point lies on or behind the camera plane, so the perspective divide is undefined.
    #[error("point is behind the camera plane (depth {depth})")]
    BehindCamera { depth: f64 },
}

/// Failures of the target trajectory estimator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrajectoryError {
    /// Neither arccos branch has its argument inside [-1, 1] for this sighting.
    #[error("phase shift undefined for sighting at local ({x0:.3}, {y0:.3})")]
    PhaseSolveUndefined { x0: f64, y0: f64 },

    /// The arccos branches exist but no pair of candidates agrees.
    #[error("phase shift ambiguous for sighting at local ({x0:.3}, {y0:.3})")]
    PhaseSolveAmbiguous { x0: f64, y0: f64 },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Failures while building or handing off vehicle commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The sink could not deliver the message (closed link, write failure, ...).
    #[error("command link failure: {0}")]
    Link(String),
}

/// Failures of one landing-guidance step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuidanceError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A guidance setting is out of range.
    #[error("invalid guidance setting: {0}")]
    InvalidConfig(String),
}
