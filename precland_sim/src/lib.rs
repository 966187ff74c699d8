// precland_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the precland_sim crate.
pub mod prelude;

pub mod cli;
pub mod simulation;

use crate::cli::Cli;
use crate::simulation::config::{load_scenario, to_toml};
use crate::simulation::error::SimError;
use crate::simulation::plugins::link::MavlinkLink;
use crate::simulation::runner::{RunOptions, RunReport, Simulator};
use tracing::info;

/// Loads the scenario named on the command line and runs it.
///
/// With `--print-config` the resolved scenario is printed and nothing is simulated.
pub fn run(cli: &Cli) -> Result<Option<RunReport>, SimError> {
    let config = load_scenario(&cli.scenario)?;
    if cli.print_config {
        println!("{}", to_toml(&config)?);
        return Ok(None);
    }

    let options = RunOptions {
        frames_dir: (!cli.headless).then(|| cli.frames_dir.clone()),
        duration_seconds: cli.duration,
        fast: cli.fast,
    };
    let mut simulator = Simulator::new(config, options)?;
    if let Some(address) = &cli.mavlink {
        simulator = simulator.with_mirror(Box::new(MavlinkLink::connect(address)?));
    }

    let report = simulator.run()?;
    info!(
        "{} frames, {} commands, {} marker sightings",
        report.frames, report.commands_sent, report.marker_sightings
    );
    Ok(Some(report))
}
