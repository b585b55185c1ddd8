//! The repair engine: requests a suggestion, gates it by policy, and on
//! acceptance rewrites the `.bsl` file and appends an audit entry.

use std::path::Path;

use browserlet_protocol::{FailureDiagnostic, Hint, Step, Target};
use tracing::{info, warn};

use crate::{
    audit::{self, AuditEntry},
    excerpt::build_excerpt,
    provider::{RepairProvider, RepairRequest, RepairSuggestion},
};

/// Confidence an auto-repair suggestion must clear to be applied
/// unattended.
pub const AUTO_REPAIR_THRESHOLD: f64 = 0.70;

/// How the engine should decide whether to apply a suggestion it received.
#[derive(Debug, Clone, Copy)]
pub enum ApplyPolicy {
    /// Apply automatically when `confidence >= `[`AUTO_REPAIR_THRESHOLD`].
    Auto,
    /// Apply only when the caller-supplied callback approves; the engine
    /// itself does not own a terminal prompt.
    Interactive,
    /// Never apply; a suggestion is still fetched and returned for display.
    Off,
}

/// What happened when the engine was asked to repair a failed resolution.
pub enum RepairOutcome {
    /// No provider is configured, the provider failed, or it returned no
    /// suggestion the policy accepted.
    NotApplied,
    /// A suggestion was applied: hints rewritten on disk, step updated in
    /// memory, audit entry appended.
    Applied {
        /// The hints now in effect for this step.
        new_hints: Vec<Hint>,
    },
}

/// Drives the optional LLM-assisted repair loop for one failed step.
pub struct RepairEngine {
    provider: Option<std::sync::Arc<dyn RepairProvider>>,
    policy: ApplyPolicy,
}

impl RepairEngine {
    /// Build an engine with no provider configured: every call is a no-op
    /// and `repair` always returns [`RepairOutcome::NotApplied`].
    pub fn disabled() -> Self {
        Self {
            provider: None,
            policy: ApplyPolicy::Off,
        }
    }

    /// Build an engine that asks `provider` for suggestions and applies
    /// them per `policy`.
    pub fn new(provider: std::sync::Arc<dyn RepairProvider>, policy: ApplyPolicy) -> Self {
        Self {
            provider: Some(provider),
            policy,
        }
    }

    /// Whether a provider is configured at all; the runner only attempts
    /// repair when this is true.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Ask the provider for a suggestion for `diagnostic`/`step`, apply it
    /// per policy via `confirm` (consulted only under
    /// [`ApplyPolicy::Interactive`]), and on acceptance rewrite
    /// `script_path`'s on-disk step and append an audit entry.
    ///
    /// Never returns an error: any provider failure, malformed response, or
    /// policy rejection degrades to [`RepairOutcome::NotApplied`].
    pub async fn repair(
        &self,
        script_path: &Path,
        step_index: usize,
        step: &Step,
        diagnostic: &FailureDiagnostic,
        confirm: impl Fn(&RepairSuggestion) -> bool,
    ) -> RepairOutcome {
        let Some(provider) = &self.provider else {
            return RepairOutcome::NotApplied;
        };

        let Some(target) = &step.target else {
            return RepairOutcome::NotApplied;
        };

        let request = build_request(step_index, step, target, diagnostic);
        let suggestion = match provider.suggest(&request).await {
            Ok(suggestion) => suggestion,
            Err(err) => {
                warn!(provider = provider.name(), error = %err, "repair provider failed");
                return RepairOutcome::NotApplied;
            }
        };

        if !self.should_apply(&suggestion, confirm) {
            info!(
                provider = provider.name(),
                confidence = suggestion.confidence,
                "repair suggestion not applied"
            );
            return RepairOutcome::NotApplied;
        }

        match apply(script_path, step_index, target, &suggestion, &diagnostic.page_url) {
            Ok(new_hints) => RepairOutcome::Applied { new_hints },
            Err(err) => {
                warn!(error = %err, "failed to apply repair suggestion");
                RepairOutcome::NotApplied
            }
        }
    }

    fn should_apply(
        &self,
        suggestion: &RepairSuggestion,
        confirm: impl Fn(&RepairSuggestion) -> bool,
    ) -> bool {
        match self.policy {
            ApplyPolicy::Off => false,
            ApplyPolicy::Auto => suggestion.confidence >= AUTO_REPAIR_THRESHOLD,
            ApplyPolicy::Interactive => confirm(suggestion),
        }
    }
}

fn build_request(
    step_index: usize,
    step: &Step,
    target: &Target,
    diagnostic: &FailureDiagnostic,
) -> RepairRequest {
    RepairRequest {
        step_id: step.effective_id(step_index),
        intent: target.intent.clone(),
        action: step.action,
        matched: diagnostic.matched.iter().map(|h| format!("{h:?}")).collect(),
        failed: diagnostic.failed.iter().map(|h| format!("{h:?}")).collect(),
        dom_excerpt: build_excerpt(diagnostic),
        page_url: diagnostic.page_url.clone(),
    }
}

fn apply(
    script_path: &Path,
    step_index: usize,
    target: &Target,
    suggestion: &RepairSuggestion,
    page_url: &str,
) -> crate::error::Result<Vec<Hint>> {
    browserlet_bsl::apply_hint_rewrite(script_path, step_index, &suggestion.suggested_hints)?;

    audit::append(
        script_path,
        AuditEntry {
            timestamp: chrono::Utc::now(),
            script_path: script_path.display().to_string(),
            step_index,
            original_hints: target.hints.clone(),
            applied_hints: suggestion.suggested_hints.clone(),
            confidence: suggestion.confidence,
            reasoning: suggestion.reasoning.clone(),
            url: page_url.to_string(),
        },
    )?;

    Ok(suggestion.suggested_hints.clone())
}

#[cfg(test)]
mod tests {
    use browserlet_protocol::{
        ActionKind, Confidence, FailureDiagnostic, HintType, Stage,
    };
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::provider::RepairProvider;

    struct FixedProvider(RepairSuggestion);

    #[async_trait::async_trait]
    impl RepairProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn suggest(&self, _request: &RepairRequest) -> crate::error::Result<RepairSuggestion> {
            Ok(RepairSuggestion {
                suggested_hints: self.0.suggested_hints.clone(),
                confidence: self.0.confidence,
                reasoning: self.0.reasoning.clone(),
            })
        }
    }

    fn sample_diagnostic() -> FailureDiagnostic {
        FailureDiagnostic {
            step_id: "step-002-click".into(),
            page_url: "https://example.com".into(),
            timestamp: Utc::now(),
            failed_at_stage: Stage::FALLBACK_SELECTOR,
            confidence: Confidence {
                threshold: 0.70,
                best_score: Some(0.4),
                gap: Some(0.3),
            },
            searched_hints: vec![
                Hint::plain(HintType::Role, "button"),
                Hint::plain(HintType::TextContains, "Sign in"),
            ],
            matched: vec![],
            failed: vec![HintType::Role, HintType::TextContains],
            top_candidates: vec![],
            suggestion: None,
        }
    }

    fn sample_step() -> Step {
        Step {
            id: Some("submit".into()),
            action: ActionKind::Click,
            target: Some(Target {
                intent: "submit button".into(),
                hints: vec![Hint::plain(HintType::Role, "button")],
                fallback_selector: None,
            }),
            value: None,
            timeout: None,
            output: None,
        }
    }

    fn write_script(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("login.bsl");
        std::fs::write(
            &path,
            "name: login\nsteps:\n  - id: submit\n    action: click\n    target:\n      intent: submit button\n      hints:\n        - type: role\n          value: button\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn auto_policy_applies_high_confidence_suggestions() {
        let dir = tempdir().unwrap();
        let script_path = write_script(dir.path());
        let provider = std::sync::Arc::new(FixedProvider(RepairSuggestion {
            suggested_hints: vec![Hint::plain(HintType::AriaLabel, "Submit form")],
            confidence: 0.82,
            reasoning: "matched visible text".into(),
        }));
        let engine = RepairEngine::new(provider, ApplyPolicy::Auto);

        let outcome = engine
            .repair(&script_path, 0, &sample_step(), &sample_diagnostic(), |_| true)
            .await;

        match outcome {
            RepairOutcome::Applied { new_hints } => {
                assert_eq!(new_hints.len(), 1);
                assert_eq!(new_hints[0].kind, HintType::AriaLabel);
            }
            RepairOutcome::NotApplied => panic!("expected repair to apply"),
        }
        let rewritten = std::fs::read_to_string(&script_path).unwrap();
        assert!(rewritten.contains("aria_label"));
    }

    #[tokio::test]
    async fn auto_policy_skips_low_confidence_suggestions() {
        let dir = tempdir().unwrap();
        let script_path = write_script(dir.path());
        let provider = std::sync::Arc::new(FixedProvider(RepairSuggestion {
            suggested_hints: vec![Hint::plain(HintType::AriaLabel, "Submit form")],
            confidence: 0.40,
            reasoning: "low confidence".into(),
        }));
        let engine = RepairEngine::new(provider, ApplyPolicy::Auto);

        let outcome = engine
            .repair(&script_path, 0, &sample_step(), &sample_diagnostic(), |_| true)
            .await;
        assert!(matches!(outcome, RepairOutcome::NotApplied));
    }

    #[tokio::test]
    async fn disabled_engine_never_applies() {
        let dir = tempdir().unwrap();
        let script_path = write_script(dir.path());
        let engine = RepairEngine::disabled();
        let outcome = engine
            .repair(&script_path, 0, &sample_step(), &sample_diagnostic(), |_| true)
            .await;
        assert!(matches!(outcome, RepairOutcome::NotApplied));
    }

    #[tokio::test]
    async fn interactive_policy_consults_confirm_callback() {
        let dir = tempdir().unwrap();
        let script_path = write_script(dir.path());
        let provider = std::sync::Arc::new(FixedProvider(RepairSuggestion {
            suggested_hints: vec![Hint::plain(HintType::AriaLabel, "Submit form")],
            confidence: 0.95,
            reasoning: "high confidence".into(),
        }));
        let engine = RepairEngine::new(provider, ApplyPolicy::Interactive);
        let outcome = engine
            .repair(&script_path, 0, &sample_step(), &sample_diagnostic(), |_| false)
            .await;
        assert!(matches!(outcome, RepairOutcome::NotApplied));
    }
}
