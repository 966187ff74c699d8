// precland_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// precland_sim: closed-loop precision-landing simulator.
///
/// Flies a kinematic multirotor onto a ground target using synthetic camera
/// detections, the landing guidance and the target-trajectory predictor.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(
        short,
        long,
        default_value = "assets/scenarios/precision_landing.toml"
    )]
    pub scenario: PathBuf,

    /// Run without rendering or writing camera frames.
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Where rendered frames are written.
    #[arg(long, default_value = "frames")]
    pub frames_dir: PathBuf,

    /// Mirror every command to a live MAVLink endpoint, e.g. `udpout:127.0.0.1:14550`.
    #[arg(long)]
    pub mavlink: Option<String>,

    /// Override the scenario's duration, in seconds.
    #[arg(long)]
    pub duration: Option<f64>,

    /// Run as fast as possible instead of holding frames to the camera rate.
    #[arg(long, default_value_t = false)]
    pub fast: bool,

    /// Print the resolved scenario as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}
