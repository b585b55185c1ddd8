//! `run <script>` subcommand.

use std::sync::{atomic::AtomicBool, Arc};

use browserlet_bsl::load_script;
use browserlet_dom::ChromeDriver;
use browserlet_repair::RepairSuggestion;
use browserlet_runner::{events, Runner};

use crate::{
    cli::RunArgs, config::runner_config_from_args, diagnostic_json, error::Result, progress,
    vault_support,
};

/// Run a single script, returning the process exit code.
pub async fn run(args: RunArgs) -> Result<i32> {
    let mut script = load_script(&args.script)?;
    let config = runner_config_from_args(&args.shared);
    let diagnostic_json_requested = config.diagnostic_json;
    let micro_prompt_handle = config.micro_prompts.then(tokio::runtime::Handle::current);

    let vault = if args.shared.vault {
        Some(vault_support::open_unlocked_vault()?)
    } else {
        None
    };

    let (tx, rx) = events::channel();
    let progress_task = tokio::spawn(progress::drain(rx, diagnostic_json_requested));

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_signal = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    let script_path = args.script.clone();
    let interactive = args.shared.interactive;
    let result = tokio::task::spawn_blocking(move || -> Result<_> {
        let driver = ChromeDriver::launch(config.headed)?;
        let runner = Runner::new(config, vault, tx, cancel, micro_prompt_handle);
        Ok(runner.run_script(&driver, &mut script, &script_path, |suggestion| {
            confirm_repair(interactive, suggestion)
        })?)
    })
    .await??;

    let diagnostic = progress_task.await.map_err(crate::error::Error::Join)?;
    if diagnostic_json_requested {
        if let Some(diagnostic) = diagnostic {
            let report = diagnostic_json::report(&diagnostic);
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
        }
    }

    Ok(result.exit_code.code())
}

/// Confirm a repair suggestion under `ApplyPolicy::Interactive`. Under
/// `ApplyPolicy::Auto` the engine never calls this closure, so
/// `interactive` is always true when it runs; it's threaded through
/// anyway so the default `--auto-repair`-only run never blocks on stdin.
fn confirm_repair(interactive: bool, suggestion: &RepairSuggestion) -> bool {
    if !interactive {
        return false;
    }
    println!("repair suggestion (confidence {:.2}): {}", suggestion.confidence, suggestion.reasoning);
    for hint in &suggestion.suggested_hints {
        println!("  - {hint:?}");
    }
    print!("apply? [y/N] ");
    let _ = std::io::Write::flush(&mut std::io::stdout());
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
