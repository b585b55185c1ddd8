//! The provider seam: anything that can turn a failed resolution into a
//! set of suggested hints.

use browserlet_protocol::{ActionKind, Hint};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything a provider needs to suggest a fix for a failed step.
#[derive(Debug, Clone)]
pub struct RepairRequest {
    /// The step's id.
    pub step_id: String,
    /// The step's declared intent.
    pub intent: String,
    /// The action the step was trying to perform.
    pub action: ActionKind,
    /// Hint types that matched at least one candidate.
    pub matched: Vec<String>,
    /// Hint types that matched no candidate.
    pub failed: Vec<String>,
    /// A cleaned, ≤600-character HTML excerpt rooted on the nearest
    /// landmark containing a hint value, or `<body>`.
    pub dom_excerpt: String,
    /// The page URL at the time of failure.
    pub page_url: String,
}

/// A provider's suggested fix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepairSuggestion {
    /// Replacement hints for the step's target.
    pub suggested_hints: Vec<Hint>,
    /// The provider's confidence in this suggestion, in `[0, 1]`.
    pub confidence: f64,
    /// A short human-readable justification, never persisted with secret
    /// values (the request it was derived from never carries any).
    pub reasoning: String,
}

/// An LLM (or other) backend that can propose replacement hints for a step
/// whose cascade resolution failed.
#[async_trait::async_trait]
pub trait RepairProvider: Send + Sync {
    /// Human-readable provider name, used in logs and the audit trail.
    fn name(&self) -> &'static str;

    /// Ask the provider for a suggestion. Implementations may fail (network,
    /// malformed response); [`crate::engine::RepairEngine`] is responsible
    /// for turning any `Err` into "no suggestion" rather than propagating it.
    async fn suggest(&self, request: &RepairRequest) -> Result<RepairSuggestion>;
}
