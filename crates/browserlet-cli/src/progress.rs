//! Drains the runner's event channel: human-readable progress lines by
//! default, or silent accumulation of the run's failure diagnostic when
//! `--diagnostic-json` is set.

use browserlet_protocol::FailureDiagnostic;
use browserlet_runner::events::{EventReceiver, RunnerEvent};
use tracing::{info, warn};

/// Drain `rx` until the channel closes, returning the last failure
/// diagnostic seen (there is at most one, since a run stops at the first
/// failing step).
pub async fn drain(mut rx: EventReceiver, quiet: bool) -> Option<Box<FailureDiagnostic>> {
    let mut diagnostic = None;
    while let Some(event) = rx.recv().await {
        match event {
            RunnerEvent::StepStarted { step_id, index } => {
                if !quiet {
                    info!(step = %step_id, index, "step started");
                }
            }
            RunnerEvent::StepResolved { step_id, stage, confidence } => {
                if !quiet {
                    info!(step = %step_id, stage = stage.0, confidence, "resolved");
                }
            }
            RunnerEvent::StepSucceeded { step_id } => {
                if !quiet {
                    info!(step = %step_id, "succeeded");
                }
            }
            RunnerEvent::StepFailed { step_id, diagnostic: step_diagnostic, message } => {
                if !quiet {
                    warn!(step = %step_id, message = %message, "failed");
                }
                if step_diagnostic.is_some() {
                    diagnostic = step_diagnostic;
                }
            }
            RunnerEvent::RepairAttempted { step_id, applied } => {
                if !quiet {
                    info!(step = %step_id, applied, "repair attempted");
                }
            }
            RunnerEvent::AuthRequired { reason } => {
                warn!(reason = %reason, "authentication required");
            }
            RunnerEvent::RunFinished { exit_code } => {
                if !quiet {
                    info!(code = exit_code.code(), "run finished");
                }
            }
        }
    }
    diagnostic
}
