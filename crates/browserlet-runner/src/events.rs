//! The bounded progress channel the runner drains between steps.

use browserlet_protocol::{ExitCode, FailureDiagnostic, Stage};

/// Capacity of the channel returned by [`channel`]. Bounded so a runner
/// that outruns its consumer (e.g. a CLI not printing fast enough) applies
/// backpressure rather than growing without limit.
pub const CHANNEL_CAPACITY: usize = 256;

/// One notable occurrence during a script run, drained by the CLI to print
/// progress or accumulate a `--diagnostic-json` report.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    /// A step started executing.
    StepStarted {
        /// The step's id.
        step_id: String,
        /// Its zero-based index in the script.
        index: usize,
    },
    /// A step's target resolved to an element.
    StepResolved {
        /// The step's id.
        step_id: String,
        /// The cascade stage that produced the match.
        stage: Stage,
        /// The accepted confidence.
        confidence: f64,
    },
    /// A step completed successfully.
    StepSucceeded {
        /// The step's id.
        step_id: String,
    },
    /// A step failed; the run's final exit code reflects the worst
    /// failure seen.
    StepFailed {
        /// The step's id.
        step_id: String,
        /// Why resolution failed, when that was the cause.
        diagnostic: Option<Box<FailureDiagnostic>>,
        /// A human-readable summary, for kinds with no diagnostic (action
        /// failure, timeout, credential unavailable).
        message: String,
    },
    /// A repair attempt was made against a failed resolution.
    RepairAttempted {
        /// The step's id.
        step_id: String,
        /// Whether the suggestion was applied.
        applied: bool,
    },
    /// The bridge (or a future interactive provider) needs the user's
    /// attention before the run can continue.
    AuthRequired {
        /// What the run is waiting on.
        reason: String,
    },
    /// The run finished.
    RunFinished {
        /// The script's final exit code.
        exit_code: ExitCode,
    },
}

/// Sending half of the runner's event channel.
pub type EventSender = tokio::sync::mpsc::Sender<RunnerEvent>;
/// Receiving half, held by whoever drains progress (the CLI).
pub type EventReceiver = tokio::sync::mpsc::Receiver<RunnerEvent>;

/// Create a bounded event channel sized to [`CHANNEL_CAPACITY`].
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::channel(CHANNEL_CAPACITY)
}
