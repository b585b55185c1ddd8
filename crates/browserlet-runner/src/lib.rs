//! The Runner: substitution, per-step orchestration, repair-retry,
//! exit-code discipline, session restore, and the batch worker pool.
//!
//! # Stable API Surface
//! - [`Runner`] / [`RunResult`] / [`StepOutcome`]: run one script.
//! - [`batch::run_batch`] / [`batch::BatchConfig`] / [`batch::BatchOutcome`]:
//!   run a directory of scripts across a worker pool.
//! - [`RunnerConfig`] / [`LlmProvider`]: assembled by the CLI from flags.
//! - [`events::RunnerEvent`]: the bounded progress channel.
#![warn(missing_docs)]

pub mod batch;
mod config;
mod error;
pub mod events;
mod micro_prompt;
mod runner;
mod session;
mod substitution;
mod variables;

pub use config::{LlmProvider, RunnerConfig};
pub use error::{Error, Result};
pub use micro_prompt::LlmMicroPrompt;
pub use runner::{RunResult, Runner, StepOutcome};
pub use session::SessionLedger;
pub use substitution::{substitute, SubstitutionError};
pub use variables::ExtractedVariables;
