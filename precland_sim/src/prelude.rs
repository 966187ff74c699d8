// precland_sim/src/prelude.rs

// Re-export the entire precland_core prelude so plugins can reach the pure types.
pub use precland_core::prelude::*;

// Re-export common simulation-specific types for easy access in other modules.
pub use crate::simulation::config::structs::*;
pub use crate::simulation::core::{pacing::FramePacer, prng::SimulationRng, state::SimulatorState};
pub use crate::simulation::error::{ConfigError, RenderError, SimError};
pub use crate::simulation::plugins::perception::{MarkerDetector, OracleDetector};
pub use crate::simulation::plugins::vehicle::SimVehicle;
pub use crate::simulation::runner::{RunOptions, RunReport, Simulator};
