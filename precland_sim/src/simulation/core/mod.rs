// precland_sim/src/simulation/core/mod.rs

pub mod pacing;
pub mod prng;
pub mod state;
