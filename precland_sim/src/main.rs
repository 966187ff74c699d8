// precland_sim/src/main.rs

use clap::Parser;
use precland_sim::cli::Cli;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,precland_sim=debug,precland_core=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match precland_sim::run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Simulation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
