// precland_sim/src/simulation/config/mod.rs

//! Loading and validating scenario files.

pub mod structs;

use crate::simulation::core::pacing::FramePacer;
use crate::simulation::error::ConfigError;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

pub use structs::{ScenarioConfig, TargetMotion};

/// Reads the scenario at `path` and validates it. Omitted fields take their defaults.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    info!("Loading scenario from: {:?}", path);
    let config: ScenarioConfig = Figment::new()
        .merge(Toml::file(path))
        .extract()
        .map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
    validate(&config)?;
    Ok(config)
}

/// Parses a scenario from TOML text. Used for inline scenarios and tests.
pub fn parse_scenario(toml_text: &str) -> Result<ScenarioConfig, ConfigError> {
    let config: ScenarioConfig = Figment::new()
        .merge(Toml::string(toml_text))
        .extract()
        .map_err(|e| ConfigError::Load {
            path: "<inline>".into(),
            source: Box::new(e),
        })?;
    validate(&config)?;
    Ok(config)
}

/// The fully resolved scenario as TOML.
pub fn to_toml(config: &ScenarioConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Highest camera frame rate a scenario may ask for.
pub const MAX_FRAME_RATE: f64 = 1000.0;

fn validate(config: &ScenarioConfig) -> Result<(), ConfigError> {
    let camera = &config.camera.model;
    if !(camera.frame_rate > 0.0 && camera.frame_rate <= MAX_FRAME_RATE) {
        return Err(ConfigError::Invalid(format!(
            "camera frame_rate must be in (0, {MAX_FRAME_RATE}], got {}",
            camera.frame_rate
        )));
    }
    FramePacer::new(camera.frame_rate)?;
    if camera.width == 0 || camera.height == 0 {
        return Err(ConfigError::Invalid("camera raster must be non-empty".into()));
    }
    let duration = config.simulation.duration_seconds;
    if !(duration.is_finite() && duration > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "duration_seconds must be positive and finite, got {duration}"
        )));
    }
    if !(config.target.size_m > 0.0) {
        return Err(ConfigError::Invalid("target size_m must be positive".into()));
    }
    let vehicle = &config.vehicle;
    if !(vehicle.max_speed_mps > 0.0) || !(vehicle.land_speed_mps > 0.0) {
        return Err(ConfigError::Invalid("vehicle speeds must be positive".into()));
    }
    if !(vehicle.gps_noise_stddev_m >= 0.0) || !(vehicle.pixel_noise_stddev >= 0.0) {
        return Err(ConfigError::Invalid("noise levels must be non-negative".into()));
    }
    let track = &config.estimator.track;
    if !(track.a > 0.0) || !(track.b > 0.0) {
        return Err(ConfigError::Invalid("estimator track amplitudes must be positive".into()));
    }
    config
        .guidance
        .validate()
        .map_err(|e| ConfigError::Invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use precland_core::estimation::phase::PhasePolicy;

    #[test]
    fn test_empty_scenario_uses_defaults() {
        let config = parse_scenario("").unwrap();
        assert_eq!(config, ScenarioConfig::default());
        assert_eq!(config.camera.background, [74, 88, 109]);
        assert_eq!(config.camera.model.width, 640);
        assert_eq!(config.estimator.descent_time_s, 50.0);
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        let config = parse_scenario(
            r#"
            [simulation]
            seed = 7

            [camera.model]
            frame_rate = 10.0

            [target.motion]
            type = "Track"
            phase = 0.5

            [estimator]
            phase_policy = "assume_zero"
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.duration_seconds, 180.0);
        assert_eq!(config.camera.model.frame_rate, 10.0);
        assert_eq!(config.camera.model.height, 480);
        assert!(matches!(config.target.motion, TargetMotion::Track { phase, .. } if phase == 0.5));
        assert_eq!(config.estimator.phase_policy, PhasePolicy::AssumeZero);
        assert!(config.simulation.realtime);
        assert_eq!(config.guidance.search_half_size_m, 10.0);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(matches!(
            parse_scenario("[vehicle]\nwheelbase = 2.0\n"),
            Err(ConfigError::Load { .. })
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            parse_scenario("[camera.model]\nframe_rate = 0.0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_guidance_and_rate_bounds_are_checked() {
        for text in [
            "[guidance]\ndescent_step_m = -2.0\n",
            "[guidance]\ndescent_speed_mps = 0.0\n",
            "[guidance]\nsearch_half_size_m = -1.0\n",
            "[camera.model]\nframe_rate = 5000.0\n",
            "[camera.model]\nframe_rate = 1e-300\n",
            "[vehicle]\ngps_noise_stddev_m = -0.1\n",
        ] {
            assert!(
                matches!(parse_scenario(text), Err(ConfigError::Invalid(_))),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn test_realtime_pacing_is_the_default() {
        assert!(parse_scenario("").unwrap().simulation.realtime);
        assert!(!parse_scenario("[simulation]\nrealtime = false\n").unwrap().simulation.realtime);
    }

    #[test]
    fn test_resolved_scenario_prints_and_reloads() {
        let config = parse_scenario("[vehicle]\ntakeoff_altitude_m = 30.0\n").unwrap();
        let text = to_toml(&config).unwrap();
        assert!(text.contains("takeoff_altitude_m = 30.0"));
        assert_eq!(parse_scenario(&text).unwrap(), config);
    }

    #[test]
    fn test_shipped_scenario_loads() {
        let config = load_scenario(Path::new("assets/scenarios/precision_landing.toml")).unwrap();
        assert!(matches!(config.target.motion, TargetMotion::Track { .. }));
        assert_eq!(config.estimator.speed_profile.segments.len(), 3);
        assert_eq!(config.estimator.phase_policy, PhasePolicy::AssumeZero);
    }

    #[test]
    fn test_missing_file_is_reported() {
        assert!(matches!(
            load_scenario(Path::new("does/not/exist.toml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
