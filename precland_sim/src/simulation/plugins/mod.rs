// precland_sim/src/simulation/plugins/mod.rs

pub mod camera;
pub mod link;
pub mod perception;
pub mod target;
pub mod vehicle;
