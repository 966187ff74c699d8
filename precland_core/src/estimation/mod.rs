// precland_core/src/estimation/mod.rs

//! Predicting where a moving landing target has gone once it leaves the camera's view.

pub mod phase;
pub mod predictor;
pub mod root;
