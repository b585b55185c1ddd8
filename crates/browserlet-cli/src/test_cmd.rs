//! `test <dir>` subcommand: run every `.bsl` script in a directory across
//! a worker pool.

use std::sync::Arc;

use browserlet_protocol::ExitCode;
use browserlet_runner::{
    batch::{run_batch, BatchConfig, BatchOutcome},
    events,
};

use crate::{
    cli::TestArgs,
    config::runner_config_from_args,
    error::{Error, Result},
    progress, vault_support,
};

/// Run every script under `args.dir`, returning the worst exit code across
/// the batch.
pub async fn run(args: TestArgs) -> Result<i32> {
    let scripts = discover_scripts(&args.dir)?;
    if scripts.is_empty() {
        return Err(Error::InvalidInput(format!("no .bsl scripts found under {}", args.dir.display())));
    }

    let config = Arc::new(runner_config_from_args(&args.shared));
    let batch = BatchConfig { workers: args.workers, bail: args.bail };

    let vault = if args.shared.vault {
        Some(vault_support::open_unlocked_vault()?)
    } else {
        None
    };

    let (tx, rx) = events::channel();
    let progress_task = tokio::spawn(progress::drain(rx, config.diagnostic_json));

    let outcomes = tokio::task::spawn_blocking(move || run_batch(scripts, config, batch, vault, tx)).await?;
    let _ = progress_task.await;

    let mut worst = ExitCode::Success;
    for outcome in &outcomes {
        let this = match outcome {
            BatchOutcome::Ran(result) => result.exit_code,
            BatchOutcome::Errored(message) => {
                eprintln!("script failed to run: {message}");
                ExitCode::Infrastructure
            }
            BatchOutcome::Skipped => ExitCode::Skipped,
        };
        worst = worse(worst, this);
    }

    println!("ran {} script(s)", outcomes.len());
    Ok(worst.code())
}

fn discover_scripts(dir: &std::path::Path) -> Result<Vec<std::path::PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!("{} is not a directory", dir.display())));
    }
    let mut scripts: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("bsl"))
        .collect();
    scripts.sort();
    Ok(scripts)
}

fn worse(a: ExitCode, b: ExitCode) -> ExitCode {
    fn rank(e: ExitCode) -> u8 {
        match e {
            ExitCode::Success => 0,
            ExitCode::StepFailure => 1,
            ExitCode::Infrastructure => 2,
            ExitCode::Skipped => 3,
        }
    }
    if rank(b) > rank(a) { b } else { a }
}
