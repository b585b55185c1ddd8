//! Builds the ≤600-character cleaned-HTML excerpt a repair request carries:
//! an excerpt rooted on the nearest landmark whose text or markup contains
//! any hint value, taken from the live page. This workspace's
//! [`browserlet_dom::BrowserDriver`] never hands back raw HTML — only
//! [`browserlet_protocol::Candidate`] descriptors. So rather than add a
//! second, raw-HTML extraction path to the driver trait, this module
//! synthesizes an equivalent excerpt out of the diagnostic's own top-scored
//! candidates — the same descriptors the failure diagnostic already
//! reports. See `DESIGN.md` for the reasoning.

use browserlet_protocol::FailureDiagnostic;

/// Hard cap on the excerpt length.
const MAX_EXCERPT_LEN: usize = 600;

/// Render a synthetic HTML excerpt from `diagnostic`'s top candidates,
/// preferring the one whose text or attributes contain one of the searched
/// hint values; falls back to a generic `<body>` wrapper when none do.
pub fn build_excerpt(diagnostic: &FailureDiagnostic) -> String {
    let hint_values: Vec<&str> = diagnostic
        .searched_hints
        .iter()
        .map(|h| h.value.as_str())
        .collect();

    let rooted = diagnostic
        .top_candidates
        .iter()
        .find(|c| candidate_contains_any(&c.candidate, &hint_values));

    let body = match rooted.or_else(|| diagnostic.top_candidates.first()) {
        Some(scored) => render_candidate(&scored.candidate),
        None => "<body></body>".to_string(),
    };

    truncate_chars(&body, MAX_EXCERPT_LEN)
}

fn candidate_contains_any(candidate: &browserlet_protocol::Candidate, values: &[&str]) -> bool {
    values.iter().any(|v| {
        !v.is_empty()
            && (candidate.visible_text.to_lowercase().contains(&v.to_lowercase())
                || candidate
                    .attributes
                    .aria_label
                    .as_deref()
                    .is_some_and(|a| a.to_lowercase().contains(&v.to_lowercase())))
    })
}

fn render_candidate(candidate: &browserlet_protocol::Candidate) -> String {
    let mut attrs = String::new();
    if let Some(id) = &candidate.attributes.id {
        attrs.push_str(&format!(" id=\"{id}\""));
    }
    if let Some(role) = &candidate.attributes.role {
        attrs.push_str(&format!(" role=\"{role}\""));
    }
    if let Some(label) = &candidate.attributes.aria_label {
        attrs.push_str(&format!(" aria-label=\"{label}\""));
    }
    if let Some(legend) = &candidate.structural_context.fieldset_legend {
        return format!(
            "<fieldset><legend>{legend}</legend><{tag}{attrs}>{text}</{tag}></fieldset>",
            tag = candidate.tag,
            text = candidate.visible_text
        );
    }
    format!("<{tag}{attrs}>{text}</{tag}>", tag = candidate.tag, text = candidate.visible_text)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use browserlet_protocol::{
        Candidate, CandidateAttributes, Confidence, FailureDiagnostic, Hint, HintType,
        ScoredCandidate, Stage, StructuralContext,
    };
    use chrono::Utc;

    use super::*;

    fn diagnostic_with(candidates: Vec<Candidate>, hints: Vec<Hint>) -> FailureDiagnostic {
        FailureDiagnostic {
            step_id: "step-001-click".into(),
            page_url: "https://example.com".into(),
            timestamp: Utc::now(),
            failed_at_stage: Stage::FALLBACK_SELECTOR,
            confidence: Confidence {
                threshold: 0.70,
                best_score: Some(0.5),
                gap: Some(0.2),
            },
            searched_hints: hints,
            matched: vec![],
            failed: vec![HintType::Role],
            top_candidates: candidates
                .into_iter()
                .map(|candidate| ScoredCandidate {
                    candidate,
                    base_confidence: 0.5,
                    adjusted_confidence: 0.5,
                    hint_scores: vec![],
                })
                .collect(),
            suggestion: None,
        }
    }

    #[test]
    fn prefers_candidate_containing_a_hint_value() {
        let target = Candidate::new(
            "button",
            "Submit form",
            CandidateAttributes::default(),
            StructuralContext::default(),
        );
        let other = Candidate::new(
            "button",
            "Cancel",
            CandidateAttributes::default(),
            StructuralContext::default(),
        );
        let diagnostic = diagnostic_with(
            vec![other, target],
            vec![Hint::plain(HintType::TextContains, "Submit")],
        );
        let excerpt = build_excerpt(&diagnostic);
        assert!(excerpt.contains("Submit form"));
    }

    #[test]
    fn falls_back_to_body_with_no_candidates() {
        let diagnostic = diagnostic_with(vec![], vec![]);
        assert_eq!(build_excerpt(&diagnostic), "<body></body>");
    }

    #[test]
    fn truncates_to_six_hundred_characters() {
        let long = "x".repeat(1000);
        assert_eq!(truncate_chars(&long, MAX_EXCERPT_LEN).chars().count(), MAX_EXCERPT_LEN);
    }
}
