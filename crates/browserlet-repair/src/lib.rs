//! The repair engine: triggered only when the cascade resolver fails and an
//! LLM provider is configured.
//!
//! # Stable API Surface
//! - [`RepairEngine`] / [`ApplyPolicy`] / [`RepairOutcome`]: the entry point
//!   the runner calls after a failed resolution.
//! - [`RepairProvider`]: the seam implemented by [`ClaudeProvider`] and
//!   [`OllamaProvider`], or a test double.
//! - [`audit::AuditEntry`]: one row of the on-disk repair history.
#![warn(missing_docs)]

mod audit;
mod claude;
mod engine;
mod error;
mod excerpt;
mod ollama;
mod prompt;
mod provider;

pub use audit::{AuditEntry, HISTORY_FILENAME};
pub use claude::ClaudeProvider;
pub use engine::{ApplyPolicy, RepairEngine, RepairOutcome, AUTO_REPAIR_THRESHOLD};
pub use error::{Error, Result};
pub use excerpt::build_excerpt;
pub use ollama::OllamaProvider;
pub use provider::{RepairProvider, RepairRequest, RepairSuggestion};
