//! Runner tuning knobs assembled by the CLI from flags, environment, and
//! config-file defaults.

use std::{path::PathBuf, sync::Arc, time::Duration};

use browserlet_repair::{ClaudeProvider, OllamaProvider, RepairProvider};
use browserlet_resolver::ResolverConfig;

/// Which LLM backend a configured [`RepairEngine`](browserlet_repair::RepairEngine)
/// or micro-prompt assist should call.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Anthropic's Messages API.
    Claude {
        /// Overrides `ANTHROPIC_API_KEY` when set.
        api_key: Option<String>,
        /// Overrides the provider's default model when set.
        model: Option<String>,
    },
    /// A local Ollama server.
    Ollama {
        /// Overrides the provider's default endpoint when set.
        endpoint: Option<String>,
        /// Overrides the provider's default model when set.
        model: Option<String>,
    },
}

/// Everything a [`crate::runner::Runner`] needs beyond the script itself.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Run Chrome headed (visible) rather than headless.
    pub headed: bool,
    /// Per-step timeout, used when a step doesn't override it.
    pub global_timeout: Duration,
    /// Directory screenshots and session-restore ledgers are written under.
    pub output_dir: PathBuf,
    /// Whether the stage-4 micro-prompt assist is enabled.
    pub micro_prompts: bool,
    /// Auto-apply repair suggestions that clear the confidence threshold.
    pub auto_repair: bool,
    /// Consult a human before applying a repair suggestion.
    pub interactive_repair: bool,
    /// Emit a single `--diagnostic-json` report instead of human-readable
    /// progress.
    pub diagnostic_json: bool,
    /// Resume from a previous run's session-restore ledger, identified by
    /// this id, skipping steps already recorded as succeeded.
    pub session_restore: Option<String>,
    /// The resolver's tuning constants.
    pub resolver: ResolverConfig,
    /// Which LLM backend repair/micro-prompts should use, if any.
    pub llm_provider: Option<LlmProvider>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            headed: false,
            global_timeout: Duration::from_secs(10),
            output_dir: PathBuf::from("."),
            micro_prompts: false,
            auto_repair: false,
            interactive_repair: false,
            diagnostic_json: false,
            session_restore: None,
            resolver: ResolverConfig::default(),
            llm_provider: None,
        }
    }
}

impl RunnerConfig {
    /// Whether any repair policy is enabled at all; the runner only builds
    /// a [`browserlet_repair::RepairEngine`] when this is true.
    pub fn repair_enabled(&self) -> bool {
        self.auto_repair || self.interactive_repair
    }

    /// Build the configured [`RepairProvider`] from `llm_provider`, or
    /// `None` if no LLM backend is configured (repair is then a no-op).
    ///
    /// `ClaudeProvider` itself reads `ANTHROPIC_MODEL` when present; an explicit `model` override here is applied via the same
    /// environment variable so both construction paths stay consistent.
    pub fn build_repair_provider(&self) -> Option<Arc<dyn RepairProvider>> {
        match self.llm_provider.as_ref()? {
            LlmProvider::Claude { api_key, model } => {
                if let Some(model) = model {
                    std::env::set_var("ANTHROPIC_MODEL", model);
                }
                let provider = match api_key {
                    Some(key) => ClaudeProvider::new(key.clone()),
                    None => ClaudeProvider::from_env()?,
                };
                Some(Arc::new(provider))
            }
            LlmProvider::Ollama { endpoint, model } => {
                Some(Arc::new(OllamaProvider::new(endpoint.clone(), model.clone())))
            }
        }
    }
}
