//! Hint match predicates and the weighted scoring function shared by every
//! cascade stage.

use browserlet_protocol::{Candidate, Hint, HintScore, HintType, HintValue, ScoredCandidate};

/// Case-insensitive substring test.
fn contains_fold(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether `candidate` satisfies `hint`'s predicate.
pub fn matches_hint(candidate: &Candidate, hint: &Hint) -> bool {
    match hint.kind {
        HintType::DataAttribute => match &hint.value {
            HintValue::Named { name, value } => candidate
                .attributes
                .data_attributes
                .get(name.as_str())
                .is_some_and(|v| v == value),
            HintValue::Plain(_) => false,
        },
        HintType::Role => candidate
            .attributes
            .role
            .as_deref()
            .is_some_and(|r| r == hint.value.as_str()),
        HintType::Type => candidate
            .attributes
            .r#type
            .as_deref()
            .is_some_and(|t| t == hint.value.as_str()),
        HintType::Name => candidate
            .attributes
            .name
            .as_deref()
            .is_some_and(|n| n == hint.value.as_str()),
        HintType::Id => candidate
            .attributes
            .id
            .as_deref()
            .is_some_and(|id| id == hint.value.as_str()),
        HintType::AriaLabel => candidate
            .attributes
            .aria_label
            .as_deref()
            .is_some_and(|a| contains_fold(a, hint.value.as_str())),
        HintType::TextContains => contains_fold(&candidate.visible_text, hint.value.as_str()),
        HintType::PlaceholderContains => candidate
            .attributes
            .placeholder
            .as_deref()
            .is_some_and(|p| contains_fold(p, hint.value.as_str())),
        HintType::ClassContains => candidate
            .attributes
            .class_tokens
            .iter()
            .any(|c| contains_fold(c, hint.value.as_str())),
        HintType::FieldsetContext => candidate
            .structural_context
            .fieldset_legend
            .as_deref()
            .is_some_and(|l| contains_fold(l, hint.value.as_str())),
        HintType::AssociatedLabel => candidate
            .structural_context
            .associated_label
            .as_deref()
            .is_some_and(|l| contains_fold(l, hint.value.as_str())),
        HintType::LandmarkContext => candidate
            .structural_context
            .landmark
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(hint.value.as_str())),
        HintType::SectionContext => candidate
            .structural_context
            .section_heading
            .as_deref()
            .is_some_and(|h| contains_fold(h, hint.value.as_str())),
        HintType::NearLabel => candidate
            .structural_context
            .near_label
            .as_deref()
            .is_some_and(|l| contains_fold(l, hint.value.as_str())),
        HintType::PositionContext => matches_position(candidate, hint.value.as_str()),
    }
}

/// Match a literal `"row N"` / `"col N"` / `"index N"` hint value against the
/// candidate's computed position.
fn matches_position(candidate: &Candidate, value: &str) -> bool {
    let Some(position) = &candidate.structural_context.position else {
        return false;
    };
    let mut parts = value.split_whitespace();
    let (Some(kind), Some(n)) = (parts.next(), parts.next()) else {
        return false;
    };
    let Ok(n) = n.parse::<u32>() else {
        return false;
    };
    match kind.to_ascii_lowercase().as_str() {
        "row" => position.row == Some(n),
        "col" | "column" => position.col == Some(n),
        "index" => position.index == n,
        _ => false,
    }
}

/// Score `candidate` against `hints`, producing the per-hint breakdown and
/// `base_confidence = sum(contribution) / sum(weight)`. A hint
/// set with zero total weight (i.e. empty) scores `0.0`.
pub fn score_candidate(candidate: &Candidate, hints: &[Hint]) -> ScoredCandidate {
    let hint_scores: Vec<HintScore> = hints
        .iter()
        .map(|hint| {
            let weight = hint.weight();
            let matched = matches_hint(candidate, hint);
            HintScore {
                hint: hint.clone(),
                weight,
                matched,
                contribution: if matched { weight } else { 0.0 },
            }
        })
        .collect();

    let total_weight: f64 = hint_scores.iter().map(|s| s.weight).sum();
    let total_contribution: f64 = hint_scores.iter().map(|s| s.contribution).sum();
    let base_confidence = if total_weight > 0.0 {
        total_contribution / total_weight
    } else {
        0.0
    };

    ScoredCandidate {
        candidate: candidate.clone(),
        base_confidence,
        adjusted_confidence: base_confidence,
        hint_scores,
    }
}

#[cfg(test)]
mod tests {
    use browserlet_protocol::CandidateAttributes;

    use super::*;

    fn candidate_with_role(role: &str) -> Candidate {
        Candidate::new(
            "button",
            "Submit",
            CandidateAttributes {
                role: Some(role.to_string()),
                ..Default::default()
            },
            Default::default(),
        )
    }

    #[test]
    fn role_match_is_exact() {
        let candidate = candidate_with_role("button");
        assert!(matches_hint(&candidate, &Hint::plain(HintType::Role, "button")));
        assert!(!matches_hint(&candidate, &Hint::plain(HintType::Role, "Button")));
    }

    #[test]
    fn text_contains_is_case_insensitive() {
        let candidate = Candidate::new(
            "button",
            "Sign In Now",
            CandidateAttributes::default(),
            Default::default(),
        );
        assert!(matches_hint(
            &candidate,
            &Hint::plain(HintType::TextContains, "sign in")
        ));
    }

    #[test]
    fn base_confidence_averages_contributions() {
        let candidate = candidate_with_role("button");
        let hints = vec![
            Hint::plain(HintType::Role, "button"),
            Hint::plain(HintType::TextContains, "nonexistent"),
        ];
        let scored = score_candidate(&candidate, &hints);
        // role (1.00) matched, text_contains (0.80) did not: 1.00 / 1.80
        assert!((scored.base_confidence - (1.00 / 1.80)).abs() < 1e-9);
    }

    #[test]
    fn empty_hints_score_zero() {
        let candidate = candidate_with_role("button");
        let scored = score_candidate(&candidate, &[]);
        assert_eq!(scored.base_confidence, 0.0);
    }

    #[test]
    fn position_context_matches_row() {
        let mut candidate = candidate_with_role("cell");
        candidate.structural_context.position = Some(browserlet_protocol::PositionIndex {
            row: Some(2),
            col: Some(1),
            index: 5,
        });
        assert!(matches_hint(
            &candidate,
            &Hint::plain(HintType::PositionContext, "row 2")
        ));
        assert!(!matches_hint(
            &candidate,
            &Hint::plain(HintType::PositionContext, "row 3")
        ));
    }
}
