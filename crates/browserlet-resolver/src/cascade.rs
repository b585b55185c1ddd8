//! The five-stage cascade: a forward-only state machine with one terminal
//! success state per stage and one terminal failure state.

use browserlet_dom::{BrowserDriver, ResolvedElement};
use browserlet_protocol::{Confidence, FailureDiagnostic, Hint, HintType, ScoredCandidate, Stage, Target};
use chrono::Utc;

use crate::{config::ResolverConfig, micro_prompt::MicroPromptProvider, scoring::score_candidate};

/// Additional weight given to structural hints when stage 3 specifically
/// re-examines them, on top of the contribution already counted in the
/// stage-2 base score. An explicit, documented interpretation of "adding
/// weighted matches" for structural context — see `DESIGN.md`.
const STRUCTURAL_BOOST_MULTIPLIER: f64 = 0.5;

/// Hint types considered in stage 3's structural-boost pass.
const STRUCTURAL_TYPES: [HintType; 6] = [
    HintType::FieldsetContext,
    HintType::AssociatedLabel,
    HintType::LandmarkContext,
    HintType::SectionContext,
    HintType::NearLabel,
    HintType::PositionContext,
];

/// A successful resolution: exactly one element, plus the stage and
/// confidence it was accepted at.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved element, ready for the action executor.
    pub element: ResolvedElement,
    /// Which cascade stage produced the match.
    pub stage: Stage,
    /// The accepted adjusted confidence (1.0 for a fallback-selector match
    /// is not guaranteed; stage 5 fixes it at 0.80).
    pub confidence: f64,
}

/// Resolve `target` against the live page `driver` exposes, running stages
/// 1 through 5 in order and returning at the first confident, unique match.
pub fn resolve(
    driver: &dyn BrowserDriver,
    target: &Target,
    step_id: &str,
    config: &ResolverConfig,
    micro_prompt: Option<&dyn MicroPromptProvider>,
) -> browserlet_dom::Result<Result<Resolution, FailureDiagnostic>> {
    // "If hints is empty, only fallback_selector can succeed" — an empty
    // hint set has no score to compute (base_confidence's denominator is
    // zero), so stages 1-4 are skipped entirely rather than scoring every
    // scanned candidate at a meaningless 0.0.
    if target.hints.is_empty() {
        return Ok(match &target.fallback_selector {
            Some(selector) => match driver.resolve_selector(selector)? {
                Some(element) => Ok(Resolution {
                    element,
                    stage: Stage::FALLBACK_SELECTOR,
                    confidence: 0.80,
                }),
                None => Err(diagnostic_for(
                    driver,
                    step_id,
                    Stage::FALLBACK_SELECTOR,
                    Confidence {
                        threshold: config.threshold,
                        best_score: None,
                        gap: None,
                    },
                    &[],
                    Vec::new(),
                )?),
            },
            None => Err(diagnostic_for(
                driver,
                step_id,
                Stage::EXACT_ANCHOR,
                Confidence {
                    threshold: config.threshold,
                    best_score: None,
                    gap: None,
                },
                &[],
                Vec::new(),
            )?),
        });
    }

    let candidates = driver.scan_candidates()?;

    if let Some(resolution) = try_exact_anchor(&candidates, target, config) {
        return Ok(Ok(resolution));
    }

    let mut scored: Vec<(ScoredCandidate, ResolvedElement)> = candidates
        .iter()
        .map(|resolved| {
            (
                score_candidate(&resolved.candidate, &target.hints),
                resolved.clone(),
            )
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.adjusted_confidence
            .partial_cmp(&a.0.adjusted_confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(resolution) = accept_if_unique(&scored, config, Stage::BROAD_SCAN) {
        return Ok(Ok(resolution));
    }

    let rescan_len = scored.len().min(config.structural_rescan_limit);
    let mut structurally_boosted: Vec<(ScoredCandidate, ResolvedElement)> = scored[..rescan_len]
        .iter()
        .map(|(score, element)| (apply_structural_boost(score), element.clone()))
        .collect();
    structurally_boosted.sort_by(|a, b| {
        b.0.adjusted_confidence
            .partial_cmp(&a.0.adjusted_confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(resolution) = accept_if_unique(&structurally_boosted, config, Stage::STRUCTURAL_BOOST)
    {
        return Ok(Ok(resolution));
    }

    if let Some(provider) = micro_prompt {
        let top5: Vec<ScoredCandidate> = structurally_boosted
            .iter()
            .take(config.top_candidates_reported)
            .map(|(s, _)| s.clone())
            .collect();
        if let Some(choice) = provider.choose(&target.intent, &top5) {
            if choice < structurally_boosted.len().min(top5.len()) {
                let (score, element) = &structurally_boosted[choice];
                if score.adjusted_confidence >= config.threshold {
                    return Ok(Ok(Resolution {
                        element: element.clone(),
                        stage: Stage::MICRO_PROMPT,
                        confidence: score.adjusted_confidence,
                    }));
                }
            }
        }
    }

    if let Some(selector) = &target.fallback_selector {
        if let Some(element) = driver.resolve_selector(selector)? {
            return Ok(Ok(Resolution {
                element,
                stage: Stage::FALLBACK_SELECTOR,
                confidence: 0.80,
            }));
        }
    }

    let best_score = structurally_boosted
        .first()
        .map(|(s, _)| s.adjusted_confidence);
    let confidence = Confidence {
        threshold: config.threshold,
        best_score,
        gap: best_score.map(|b| config.threshold - b),
    };
    let top_candidates: Vec<ScoredCandidate> = structurally_boosted
        .into_iter()
        .take(config.top_candidates_reported)
        .map(|(s, _)| s)
        .collect();

    Ok(Err(diagnostic_for(
        driver,
        step_id,
        Stage::FALLBACK_SELECTOR,
        confidence,
        &target.hints,
        top_candidates,
    )?))
}

/// Stage 1: exact anchor. Scores every candidate against only the
/// "identifier-class" hints (`data_attribute`/`id`/`name`, or `role`
/// together with `aria_label`/`text_contains`); a single hit at base
/// confidence ≥ 0.90 returns immediately.
fn try_exact_anchor(
    candidates: &[ResolvedElement],
    target: &Target,
    config: &ResolverConfig,
) -> Option<Resolution> {
    let _ = config;
    let anchor_hints = exact_anchor_subset(&target.hints)?;

    let mut hits: Vec<&ResolvedElement> = Vec::new();
    for resolved in candidates {
        let score = score_candidate(&resolved.candidate, &anchor_hints);
        if score.base_confidence >= 0.90 {
            hits.push(resolved);
        }
    }

    match hits.as_slice() {
        [single] => Some(Resolution {
            element: (*single).clone(),
            stage: Stage::EXACT_ANCHOR,
            confidence: 0.90,
        }),
        _ => None,
    }
}

/// Pick out the identifier-class hint subset, or `None` if `hints` contains
/// none of them.
fn exact_anchor_subset(hints: &[Hint]) -> Option<Vec<Hint>> {
    let direct: Vec<Hint> = hints
        .iter()
        .filter(|h| h.kind.is_exact_anchor())
        .cloned()
        .collect();
    if !direct.is_empty() {
        return Some(direct);
    }

    let role = hints.iter().find(|h| h.kind == HintType::Role)?;
    let companion = hints
        .iter()
        .find(|h| matches!(h.kind, HintType::AriaLabel | HintType::TextContains))?;
    Some(vec![role.clone(), companion.clone()])
}

/// Stage 3: add [`STRUCTURAL_BOOST_MULTIPLIER`] times the structural-hint
/// contribution already present in `score.hint_scores` on top of the
/// stage-2 base.
fn apply_structural_boost(score: &ScoredCandidate) -> ScoredCandidate {
    let total_weight: f64 = score.hint_scores.iter().map(|s| s.weight).sum();
    if total_weight <= 0.0 {
        return score.clone();
    }
    let structural_contribution: f64 = score
        .hint_scores
        .iter()
        .filter(|s| STRUCTURAL_TYPES.contains(&s.hint.kind))
        .map(|s| s.contribution)
        .sum();
    let boost = STRUCTURAL_BOOST_MULTIPLIER * (structural_contribution / total_weight);
    let mut boosted = score.clone();
    boosted.adjusted_confidence = (score.adjusted_confidence + boost).clamp(0.0, 1.0);
    boosted
}

/// The stage-2/stage-3 uniqueness gate: the leader must clear `threshold`
/// and lead the runner-up by at least `uniqueness_margin`.
fn accept_if_unique(
    ranked: &[(ScoredCandidate, ResolvedElement)],
    config: &ResolverConfig,
    stage: Stage,
) -> Option<Resolution> {
    let (leader, element) = ranked.first()?;
    if leader.adjusted_confidence < config.threshold {
        return None;
    }
    let runner_up = ranked.get(1).map(|(s, _)| s.adjusted_confidence).unwrap_or(0.0);
    if leader.adjusted_confidence - runner_up < config.uniqueness_margin {
        return None;
    }
    Some(Resolution {
        element: element.clone(),
        stage,
        confidence: leader.adjusted_confidence,
    })
}

/// Build the failure diagnostic, pulling matched/failed hint-type lists
/// directly out of `top_candidates`' structured `hint_scores` rather than
/// parsing any error string.
fn diagnostic_for(
    driver: &dyn BrowserDriver,
    step_id: &str,
    stage: Stage,
    confidence: Confidence,
    searched_hints: &[Hint],
    top_candidates: Vec<ScoredCandidate>,
) -> browserlet_dom::Result<FailureDiagnostic> {
    let page_url = driver.current_url().unwrap_or_default();

    let mut matched = Vec::new();
    let mut failed = Vec::new();
    for hint in searched_hints {
        let matched_anywhere = top_candidates.iter().any(|c| {
            c.hint_scores
                .iter()
                .any(|s| s.hint.kind == hint.kind && s.matched)
        });
        if matched_anywhere {
            matched.push(hint.kind);
        } else {
            failed.push(hint.kind);
        }
    }
    matched.dedup();
    failed.dedup();

    let mut diagnostic = FailureDiagnostic {
        step_id: step_id.to_string(),
        page_url,
        timestamp: Utc::now(),
        failed_at_stage: stage,
        confidence,
        searched_hints: searched_hints.to_vec(),
        matched,
        failed,
        top_candidates,
        suggestion: None,
    };
    diagnostic.suggestion = Some(diagnostic.derive_suggestion());
    Ok(diagnostic)
}

#[cfg(test)]
mod tests {
    use browserlet_dom::ResolvedElement;
    use browserlet_protocol::{Candidate, CandidateAttributes};
    use std::{path::Path, time::Duration};

    use super::*;

    struct FakeDriver {
        elements: Vec<ResolvedElement>,
        url: String,
    }

    impl BrowserDriver for FakeDriver {
        fn navigate(&self, _url: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn current_url(&self) -> browserlet_dom::Result<String> {
            Ok(self.url.clone())
        }
        fn scan_candidates(&self) -> browserlet_dom::Result<Vec<ResolvedElement>> {
            Ok(self.elements.clone())
        }
        fn resolve_selector(&self, selector: &str) -> browserlet_dom::Result<Option<ResolvedElement>> {
            Ok(self.elements.iter().find(|e| e.candidate.attributes.id.as_deref() == Some(selector.trim_start_matches('#'))).cloned())
        }
        fn click(&self, _element_ref: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn type_text(&self, _element_ref: &str, _text: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn select_option(&self, _element_ref: &str, _value: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn hover(&self, _element_ref: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn scroll_into_view(&self, _element_ref: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn wait_visible(&self, _element_ref: &str, _timeout: Duration) -> browserlet_dom::Result<bool> {
            Ok(true)
        }
        fn wait_hidden(&self, _element_ref: &str, _timeout: Duration) -> browserlet_dom::Result<bool> {
            Ok(true)
        }
        fn extract_text(&self, _element_ref: &str) -> browserlet_dom::Result<String> {
            Ok(String::new())
        }
        fn extract_table(&self, _element_ref: &str) -> browserlet_dom::Result<Vec<Vec<String>>> {
            Ok(Vec::new())
        }
        fn screenshot(&self, _path: &Path) -> browserlet_dom::Result<()> {
            Ok(())
        }
    }

    fn element(role: &str, text: &str, id: Option<&str>) -> ResolvedElement {
        ResolvedElement {
            element_ref: format!("ref-{role}-{text}"),
            candidate: Candidate::new(
                "button",
                text,
                CandidateAttributes {
                    role: Some(role.to_string()),
                    id: id.map(str::to_string),
                    ..Default::default()
                },
                Default::default(),
            ),
        }
    }

    #[test]
    fn resolves_unique_role_and_text_match_at_broad_scan() {
        let driver = FakeDriver {
            elements: vec![
                element("button", "Sign in", None),
                element("button", "Cancel", None),
            ],
            url: "https://example.com".into(),
        };
        let target = Target {
            intent: "submit".into(),
            hints: vec![
                Hint::plain(HintType::Role, "button"),
                Hint::plain(HintType::TextContains, "Sign in"),
            ],
            fallback_selector: None,
        };
        let outcome = resolve(&driver, &target, "step-001-click", &ResolverConfig::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.stage, Stage::EXACT_ANCHOR);
    }

    #[test]
    fn refuses_when_candidates_tie_within_margin() {
        let driver = FakeDriver {
            elements: vec![element("button", "ok", None), element("button", "ok", None)],
            url: "https://example.com".into(),
        };
        let target = Target {
            intent: "confirm".into(),
            hints: vec![Hint::plain(HintType::Role, "button")],
            fallback_selector: None,
        };
        let outcome = resolve(&driver, &target, "step-001-click", &ResolverConfig::default(), None).unwrap();
        assert!(outcome.is_err());
    }

    #[test]
    fn empty_hints_without_fallback_refuses_immediately() {
        let driver = FakeDriver {
            elements: vec![],
            url: "https://example.com".into(),
        };
        let target = Target {
            intent: "anything".into(),
            hints: vec![],
            fallback_selector: None,
        };
        let outcome = resolve(&driver, &target, "step-001-click", &ResolverConfig::default(), None).unwrap();
        assert!(outcome.is_err());
    }

    #[test]
    fn empty_hints_with_nonmatching_fallback_reports_no_best_score() {
        // Real DOM elements are present (unlike the empty-candidate-list
        // case above), so a regression that lets stage 2's broad scan run
        // against an empty hint set would score every one of them at a
        // meaningless 0.0 instead of reporting `best_score: None`.
        let driver = FakeDriver {
            elements: vec![
                element("button", "Sign in", Some("login-button")),
                element("textbox", "Email", Some("email-field")),
            ],
            url: "https://example.com".into(),
        };
        let target = Target {
            intent: "anything".into(),
            hints: vec![],
            fallback_selector: Some("#absolutely-does-not-exist-xyz".into()),
        };
        let diagnostic = resolve(&driver, &target, "step-001-click", &ResolverConfig::default(), None)
            .unwrap()
            .unwrap_err();
        assert_eq!(diagnostic.failed_at_stage, Stage::FALLBACK_SELECTOR);
        assert_eq!(diagnostic.confidence.best_score, None);
        assert_eq!(diagnostic.confidence.gap, None);
    }

    #[test]
    fn falls_back_to_selector_when_hints_do_not_resolve() {
        let driver = FakeDriver {
            elements: vec![element("generic", "x", Some("target-id"))],
            url: "https://example.com".into(),
        };
        let target = Target {
            intent: "whatever".into(),
            hints: vec![Hint::plain(HintType::TextContains, "does-not-match-anything")],
            fallback_selector: Some("#target-id".into()),
        };
        let outcome = resolve(&driver, &target, "step-001-click", &ResolverConfig::default(), None)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.stage, Stage::FALLBACK_SELECTOR);
        assert_eq!(outcome.confidence, 0.80);
    }
}
