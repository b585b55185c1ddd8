//! Renders a [`FailureDiagnostic`] into the documented `--diagnostic-json`
//! wire shape, which names fields (`step`, `page`, `text`) that differ from
//! the in-process [`browserlet_protocol`] model's own naming.

use browserlet_protocol::{Confidence, FailureDiagnostic, Hint};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct DiagnosticReport<'a> {
    step: &'a str,
    page: &'a str,
    timestamp: DateTime<Utc>,
    failed_at_stage: u8,
    confidence: Confidence,
    searched_hints: &'a [Hint],
    top_candidates: Vec<CandidateReport<'a>>,
    suggestion: Option<&'a str>,
}

#[derive(Serialize)]
struct CandidateReport<'a> {
    tag: &'a str,
    text: &'a str,
    attributes: &'a browserlet_protocol::CandidateAttributes,
    structural_context: &'a browserlet_protocol::StructuralContext,
    base_confidence: f64,
    adjusted_confidence: f64,
    hint_scores: &'a [browserlet_protocol::HintScore],
}

/// Build the wire-shaped report for `diagnostic`.
pub fn report(diagnostic: &FailureDiagnostic) -> DiagnosticReport<'_> {
    DiagnosticReport {
        step: &diagnostic.step_id,
        page: &diagnostic.page_url,
        timestamp: diagnostic.timestamp,
        failed_at_stage: diagnostic.failed_at_stage.0,
        confidence: diagnostic.confidence,
        searched_hints: &diagnostic.searched_hints,
        top_candidates: diagnostic
            .top_candidates
            .iter()
            .map(|c| CandidateReport {
                tag: &c.candidate.tag,
                text: &c.candidate.visible_text,
                attributes: &c.candidate.attributes,
                structural_context: &c.candidate.structural_context,
                base_confidence: c.base_confidence,
                adjusted_confidence: c.adjusted_confidence,
                hint_scores: &c.hint_scores,
            })
            .collect(),
        suggestion: diagnostic.suggestion.as_deref(),
    }
}
