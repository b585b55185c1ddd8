//! Property tests for the weighted scoring function:
//! `base_confidence` stays within `[0, 1]` and tracks exactly the weight of
//! the hints a candidate actually matches, for arbitrary hint sets.

use std::collections::HashSet;

use browserlet_protocol::{Candidate, CandidateAttributes, Hint, HintType, StructuralContext};
use browserlet_resolver::score_candidate;
use proptest::prelude::*;

/// A handful of disjoint, fixed-length lowercase tokens so `text_contains`'s
/// substring predicate can't accidentally match a token it wasn't given.
fn distinct_tokens() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{6}", 1..8).prop_map(|set: HashSet<String>| set.into_iter().collect())
}

proptest! {
    /// `base_confidence` is always bounded to `[0, 1]` regardless of which
    /// subset of hints a candidate happens to satisfy.
    #[test]
    fn base_confidence_is_always_bounded(
        tokens in distinct_tokens(),
        inclusion_mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let mask: Vec<bool> = tokens.iter().enumerate().map(|(i, _)| *inclusion_mask.get(i).unwrap_or(&false)).collect();
        let visible_text = tokens
            .iter()
            .zip(&mask)
            .filter(|(_, included)| **included)
            .map(|(token, _)| token.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let candidate = Candidate::new("button", visible_text, CandidateAttributes::default(), StructuralContext::default());
        let hints: Vec<Hint> = tokens.iter().map(|t| Hint::plain(HintType::TextContains, t.clone())).collect();

        let scored = score_candidate(&candidate, &hints);
        prop_assert!((0.0..=1.0).contains(&scored.base_confidence));
    }

    /// The scored contribution of each hint matches exactly whether its
    /// token was included in the candidate's visible text — no hint
    /// contributes unless the predicate it encodes actually holds.
    #[test]
    fn per_hint_contribution_matches_inclusion(
        tokens in distinct_tokens(),
        inclusion_mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let mask: Vec<bool> = tokens.iter().enumerate().map(|(i, _)| *inclusion_mask.get(i).unwrap_or(&false)).collect();
        let visible_text = tokens
            .iter()
            .zip(&mask)
            .filter(|(_, included)| **included)
            .map(|(token, _)| token.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let candidate = Candidate::new("button", visible_text, CandidateAttributes::default(), StructuralContext::default());
        let hints: Vec<Hint> = tokens.iter().map(|t| Hint::plain(HintType::TextContains, t.clone())).collect();

        let scored = score_candidate(&candidate, &hints);
        for (hint_score, included) in scored.hint_scores.iter().zip(&mask) {
            prop_assert_eq!(hint_score.matched, *included);
            prop_assert_eq!(hint_score.contribution, if *included { hint_score.weight } else { 0.0 });
        }

        let expected_total: f64 = scored.hint_scores.iter().map(|s| s.contribution).sum();
        let total_weight: f64 = scored.hint_scores.iter().map(|s| s.weight).sum();
        prop_assert!((scored.base_confidence - expected_total / total_weight).abs() < 1e-9);
    }

    /// A candidate matching every hint in the set always scores exactly 1.0.
    #[test]
    fn matching_every_hint_scores_one(tokens in distinct_tokens()) {
        let visible_text = tokens.join(" ");
        let candidate = Candidate::new("button", visible_text, CandidateAttributes::default(), StructuralContext::default());
        let hints: Vec<Hint> = tokens.iter().map(|t| Hint::plain(HintType::TextContains, t.clone())).collect();

        let scored = score_candidate(&candidate, &hints);
        prop_assert!((scored.base_confidence - 1.0).abs() < 1e-9);
    }
}
