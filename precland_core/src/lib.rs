// precland_core/src/lib.rs

// Framework-agnostic geometry, prediction and command building for precision landing.
pub mod controllers;
pub mod error;
pub mod estimation;
pub mod frames;
pub mod messages;
pub mod models;
pub mod prelude;
pub mod types;
