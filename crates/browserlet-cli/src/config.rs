//! Assembles a [`RunnerConfig`] from parsed CLI flags.

use std::time::Duration;

use browserlet_runner::{LlmProvider, RunnerConfig};

use crate::cli::{LlmProviderArg, SharedRunArgs};

/// Build a [`RunnerConfig`] from the flags shared by `run` and `test`.
pub fn runner_config_from_args(args: &SharedRunArgs) -> RunnerConfig {
    let wants_llm = args.micro_prompts || args.auto_repair || args.interactive;
    let llm_provider = wants_llm.then(|| match args.llm_provider {
        LlmProviderArg::Claude => LlmProvider::Claude {
            api_key: args.anthropic_api_key.clone(),
            model: args.llm_model.clone(),
        },
        LlmProviderArg::Ollama => LlmProvider::Ollama {
            endpoint: args.ollama_endpoint.clone(),
            model: args.llm_model.clone(),
        },
    });

    RunnerConfig {
        headed: args.headed,
        global_timeout: Duration::from_millis(args.timeout),
        output_dir: args.output_dir.clone(),
        micro_prompts: args.micro_prompts,
        auto_repair: args.auto_repair,
        interactive_repair: args.interactive,
        diagnostic_json: args.diagnostic_json,
        session_restore: args.session_restore.clone(),
        llm_provider,
        ..RunnerConfig::default()
    }
}
