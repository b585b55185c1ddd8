//! The `test <dir>` worker pool.
//!
//! A fixed-size pool (default 1) of workers, each owning its own isolated
//! `ChromeDriver`. Workers share only an atomic "next index" counter and a
//! "bailed" flag; results are written into a pre-sized array by index so
//! ordering survives out-of-order completion.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use browserlet_bsl::load_script;
use browserlet_dom::ChromeDriver;
use browserlet_protocol::ExitCode;
use browserlet_repair::RepairSuggestion;
use browserlet_vault::PasswordStorage;
use tracing::warn;

use crate::{config::RunnerConfig, events::EventSender, runner::{RunResult, Runner}};

/// Tuning for the batch worker pool.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Number of concurrent workers, each with its own browser instance.
    pub workers: usize,
    /// Stop launching new scripts once any worker reports a non-zero exit
    /// code; scripts already running are allowed to finish.
    pub bail: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { workers: 1, bail: false }
    }
}

/// One script's outcome within a batch run.
pub enum BatchOutcome {
    /// The script ran to completion (successfully or not).
    Ran(RunResult),
    /// The script's `.bsl` file failed to load, the browser failed to
    /// launch, or the run aborted with an infrastructure error.
    Errored(String),
    /// The script was never started because bail semantics had already
    /// tripped.
    Skipped,
}

/// Run every script in `scripts` across a pool of `batch.workers` threads,
/// each with its own `ChromeDriver`, returning one outcome per script in the
/// same order as `scripts`.
pub fn run_batch(
    scripts: Vec<PathBuf>,
    config: Arc<RunnerConfig>,
    batch: BatchConfig,
    vault: Option<Arc<dyn PasswordStorage>>,
    events: EventSender,
) -> Vec<BatchOutcome> {
    let total = scripts.len();
    let scripts = Arc::new(scripts);
    let next_index = Arc::new(AtomicUsize::new(0));
    let bailed = Arc::new(AtomicBool::new(false));
    let results: Arc<Mutex<Vec<Option<BatchOutcome>>>> =
        Arc::new(Mutex::new((0..total).map(|_| None).collect()));

    let worker_count = batch.workers.max(1).min(total.max(1));
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let scripts = Arc::clone(&scripts);
        let next_index = Arc::clone(&next_index);
        let bailed = Arc::clone(&bailed);
        let results = Arc::clone(&results);
        let config = Arc::clone(&config);
        let vault = vault.clone();
        let events = events.clone();

        handles.push(std::thread::spawn(move || {
            worker_loop(scripts, next_index, bailed, results, config, vault, events, batch.bail);
        }));
    }

    for handle in handles {
        if handle.join().is_err() {
            warn!("a batch worker thread panicked");
        }
    }

    Arc::try_unwrap(results)
        .map(|mutex| mutex.into_inner().expect("worker panic already handled above"))
        .unwrap_or_else(|arc| arc.lock().expect("worker panic already handled above").drain(..).collect())
        .into_iter()
        .map(|slot| slot.unwrap_or(BatchOutcome::Skipped))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    scripts: Arc<Vec<PathBuf>>,
    next_index: Arc<AtomicUsize>,
    bailed: Arc<AtomicBool>,
    results: Arc<Mutex<Vec<Option<BatchOutcome>>>>,
    config: Arc<RunnerConfig>,
    vault: Option<Arc<dyn PasswordStorage>>,
    events: EventSender,
    bail_on_failure: bool,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            warn!(error = %err, "batch worker could not build its tokio runtime");
            return;
        }
    };
    let _guard = runtime.enter();

    loop {
        let index = next_index.fetch_add(1, Ordering::SeqCst);
        if index >= scripts.len() {
            return;
        }

        if bailed.load(Ordering::SeqCst) {
            results.lock().expect("results mutex poisoned")[index] = Some(BatchOutcome::Skipped);
            continue;
        }

        let script_path = &scripts[index];
        let outcome = run_one(script_path, &config, vault.clone(), events.clone());

        if bail_on_failure {
            if let BatchOutcome::Ran(result) = &outcome {
                if result.exit_code != ExitCode::Success {
                    bailed.store(true, Ordering::SeqCst);
                }
            }
        }

        results.lock().expect("results mutex poisoned")[index] = Some(outcome);
    }
}

fn run_one(
    script_path: &PathBuf,
    config: &RunnerConfig,
    vault: Option<Arc<dyn PasswordStorage>>,
    events: EventSender,
) -> BatchOutcome {
    let mut script = match load_script(script_path) {
        Ok(script) => script,
        Err(err) => return BatchOutcome::Errored(err.to_string()),
    };

    let driver = match ChromeDriver::launch(config.headed) {
        Ok(driver) => driver,
        Err(err) => return BatchOutcome::Errored(err.to_string()),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let runner = Runner::new(config.clone(), vault, events, cancel, None);

    let no_interactive_confirm = |_suggestion: &RepairSuggestion| false;
    match runner.run_script(&driver, &mut script, script_path, no_interactive_confirm) {
        Ok(result) => BatchOutcome::Ran(result),
        Err(err) => BatchOutcome::Errored(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_batch_config_is_single_worker_no_bail() {
        let config = BatchConfig::default();
        assert_eq!(config.workers, 1);
        assert!(!config.bail);
    }
}
