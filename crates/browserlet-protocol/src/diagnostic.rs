//! Structured failure diagnostics produced by the cascade resolver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    candidate::Candidate,
    hint::{Hint, HintType},
};

/// The cascade stage, 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stage(pub u8);

impl Stage {
    /// Stage 1: exact anchor.
    pub const EXACT_ANCHOR: Stage = Stage(1);
    /// Stage 2: hint-weighted broad scan.
    pub const BROAD_SCAN: Stage = Stage(2);
    /// Stage 3: structural-context boosts.
    pub const STRUCTURAL_BOOST: Stage = Stage(3);
    /// Stage 4: micro-prompt assist.
    pub const MICRO_PROMPT: Stage = Stage(4);
    /// Stage 5: fallback selector.
    pub const FALLBACK_SELECTOR: Stage = Stage(5);
}

/// Per-hint scoring detail against one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintScore {
    /// The hint that was scored.
    pub hint: Hint,
    /// That hint type's weight.
    pub weight: f64,
    /// Whether the candidate matched this hint's predicate.
    pub matched: bool,
    /// `weight` if matched, else `0.0`.
    pub contribution: f64,
}

/// One candidate's score breakdown, as surfaced in a diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The candidate descriptor.
    pub candidate: Candidate,
    /// Sum of matched weights divided by sum of all hint weights.
    pub base_confidence: f64,
    /// `base_confidence` plus stage-3 structural boosts, clamped to [0, 1].
    pub adjusted_confidence: f64,
    /// Per-hint contribution breakdown.
    pub hint_scores: Vec<HintScore>,
}

/// Confidence accounting attached to a diagnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Confidence {
    /// The resolver's configured threshold.
    pub threshold: f64,
    /// The best-scoring candidate's adjusted confidence, if any candidates
    /// were found at all.
    pub best_score: Option<f64>,
    /// `threshold - best_score`; positive means failure.
    pub gap: Option<f64>,
}

/// A structured failure record returned when no cascade stage produces a
/// confident, unique match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDiagnostic {
    /// The step that failed to resolve.
    pub step_id: String,
    /// The page URL at the time of failure.
    pub page_url: String,
    /// When the failure occurred.
    pub timestamp: DateTime<Utc>,
    /// The last stage attempted.
    pub failed_at_stage: Stage,
    /// Confidence accounting.
    pub confidence: Confidence,
    /// The hints that were searched for.
    pub searched_hints: Vec<Hint>,
    /// Hint types that matched at least one candidate.
    pub matched: Vec<HintType>,
    /// Hint types that matched no candidate.
    pub failed: Vec<HintType>,
    /// Up to five best-scoring candidates.
    pub top_candidates: Vec<ScoredCandidate>,
    /// A suggested fix string derived from the diagnostic.
    pub suggestion: Option<String>,
}

impl FailureDiagnostic {
    /// Derive a human-readable suggestion string from the diagnostic's
    /// matched/failed hint-type breakdown.
    pub fn derive_suggestion(&self) -> String {
        if self.failed.is_empty() {
            return "two candidates tied within the uniqueness margin; \
                    add a more specific hint to disambiguate"
                .to_string();
        }
        let failed_names = self
            .failed
            .iter()
            .map(|h| format!("{h:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "hints [{failed_names}] matched no element; consider a \
             text_contains or aria_label hint closer to the visible control"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_names_failed_hints() {
        let diag = FailureDiagnostic {
            step_id: "step-001-click".into(),
            page_url: "https://example.com".into(),
            timestamp: Utc::now(),
            failed_at_stage: Stage::FALLBACK_SELECTOR,
            confidence: Confidence {
                threshold: 0.70,
                best_score: None,
                gap: None,
            },
            searched_hints: vec![],
            matched: vec![],
            failed: vec![HintType::Role, HintType::TextContains],
            top_candidates: vec![],
            suggestion: None,
        };
        let suggestion = diag.derive_suggestion();
        assert!(suggestion.contains("Role"));
        assert!(suggestion.contains("TextContains"));
    }
}
