// precland_sim/src/simulation/error.rs

use precland_core::error::{CommandError, FrameError, GuidanceError, ProjectionError};
use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading or validating a scenario.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scenario file {0:?} not found")]
    NotFound(PathBuf),

    #[error("failed to load scenario {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("invalid scenario: {0}")]
    Invalid(String),

    #[error("failed to serialise scenario: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Failures while producing a synthetic camera frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// The projected corners do not define an invertible homography.
    #[error("projected target corners are degenerate")]
    DegenerateHomography,

    #[error("target image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Top-level simulator failure.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Guidance(#[from] GuidanceError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
