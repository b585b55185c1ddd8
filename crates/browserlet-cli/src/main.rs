#![warn(missing_docs)]
//! Entry point for the `browserlet` binary: `run`, `test`, and `vault`
//! subcommands.

mod cli;
mod config;
mod diagnostic_json;
mod error;
mod progress;
mod run_cmd;
mod test_cmd;
mod vault_cmd;
mod vault_support;

use std::process;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_spec = browserlet_logging::compute_spec(
        cli.log.trace,
        cli.log.debug,
        cli.log.log_level.as_deref(),
        cli.log.log_filter.as_deref(),
    );
    let env_filter = browserlet_logging::env_filter_from_spec(&log_spec);
    registry()
        .with(env_filter)
        .with(fmt::layer().without_time())
        .try_init()
        .ok();

    match dispatch(cli.command).await {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    }
}

async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run(args) => run_cmd::run(args).await,
        Commands::Test(args) => test_cmd::run(args).await,
        Commands::Vault(args) => vault_cmd::run(args.command),
    }
}
