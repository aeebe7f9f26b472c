mod azure;
mod cli;
mod config;
mod interrupt;
mod inventory;
mod logging;
mod model;
mod paths;
mod plan;
mod provider;
mod provision;
mod report;
mod resource;
mod util;
mod validate;
mod workflow;

use anyhow::Result;
use clap::Parser;
use cli::{Command, RootArgs};
use paths::OutputPaths;
use std::process::ExitCode;

/// Exit status for configuration errors, reported before any Azure call.
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let args = RootArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(config_err) = config::config_error(&err) {
                eprintln!("error: {config_err}");
                return ExitCode::from(EXIT_CONFIG);
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &RootArgs) -> Result<()> {
    let output = args.command.output();
    let paths = OutputPaths::new(output.out_dir.clone());
    paths.ensure_root()?;
    logging::init(&paths.log_path(), output.verbose)?;
    tracing::info!(command = args.command.name(), "starting");

    match &args.command {
        Command::Provision(args) => workflow::run_provision(args),
        Command::Validate(args) => workflow::run_validate(args),
        Command::Check(args) => workflow::run_check(args),
        Command::Summary(args) => workflow::run_summary(args),
    }
}
