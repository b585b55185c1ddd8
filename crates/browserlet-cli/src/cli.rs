//! Command-line interface definitions for the `browserlet` binary.

use std::path::PathBuf;

use browserlet_logging::LogArgs;
use clap::{Args, Parser, Subcommand};

/// Command-line interface for the `browserlet` binary.
#[derive(Parser, Debug)]
#[command(name = "browserlet", about = "Semantic replay automation for legacy web applications", version)]
pub struct Cli {
    /// Logging controls shared across Browserlet binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Which top-level operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single `.bsl` script.
    Run(RunArgs),
    /// Run every `.bsl` script in a directory across a worker pool.
    Test(TestArgs),
    /// Manage the credential vault.
    Vault(VaultArgs),
}

/// Flags shared by `run` and `test`.
#[derive(Args, Debug, Clone)]
pub struct SharedRunArgs {
    /// Run Chrome headed (visible) rather than headless.
    #[arg(long)]
    pub headed: bool,

    /// Per-step timeout in milliseconds, used when a step doesn't override
    /// it.
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    pub timeout: u64,

    /// Directory screenshots and session-restore ledgers are written
    /// under.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Resolve `{{credential:ALIAS}}` placeholders against the unlocked
    /// vault, prompting for the vault password if no cached key is found.
    #[arg(long)]
    pub vault: bool,

    /// Enable the stage-4 micro-prompt assist when the cascade resolver
    /// can't otherwise disambiguate.
    #[arg(long)]
    pub micro_prompts: bool,

    /// Auto-apply repair suggestions that clear the confidence threshold.
    #[arg(long)]
    pub auto_repair: bool,

    /// Prompt the user to confirm each repair suggestion before applying
    /// it.
    #[arg(long)]
    pub interactive: bool,

    /// Emit a single `--diagnostic-json` report instead of human-readable
    /// progress.
    #[arg(long)]
    pub diagnostic_json: bool,

    /// Resume from a previous run's session-restore ledger, skipping steps
    /// already recorded as succeeded.
    #[arg(long, value_name = "ID")]
    pub session_restore: Option<String>,

    /// LLM backend used by `--auto-repair`/`--interactive` and
    /// `--micro-prompts`.
    #[arg(long, value_enum, default_value_t = LlmProviderArg::Claude)]
    pub llm_provider: LlmProviderArg,

    /// Override the provider's default model.
    #[arg(long, value_name = "MODEL")]
    pub llm_model: Option<String>,

    /// Override `ANTHROPIC_API_KEY` for the Claude provider.
    #[arg(long, value_name = "KEY")]
    pub anthropic_api_key: Option<String>,

    /// Override the Ollama server endpoint.
    #[arg(long, value_name = "URL")]
    pub ollama_endpoint: Option<String>,
}

/// Which LLM backend to use; mirrors [`browserlet_runner::LlmProvider`]
/// without the resolved credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LlmProviderArg {
    /// Anthropic's Messages API.
    Claude,
    /// A local Ollama server.
    Ollama,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the `.bsl` script to run.
    pub script: PathBuf,

    /// Flags shared with `test`.
    #[command(flatten)]
    pub shared: SharedRunArgs,
}

/// Arguments for the `test` subcommand.
#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// Directory containing `.bsl` scripts to run.
    pub dir: PathBuf,

    /// Number of concurrent workers, each with its own browser instance.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub workers: usize,

    /// Stop launching new scripts once any script exits non-zero; scripts
    /// already running are allowed to finish.
    #[arg(long)]
    pub bail: bool,

    /// Flags shared with `run`.
    #[command(flatten)]
    pub shared: SharedRunArgs,
}

/// Arguments for the `vault` subcommand.
#[derive(Args, Debug, Clone)]
pub struct VaultArgs {
    /// Which vault operation to perform.
    #[command(subcommand)]
    pub command: VaultCommand,
}

/// Vault subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum VaultCommand {
    /// Create a new vault, prompting for its password.
    Init,
    /// Add a credential under `alias`, prompting for its value.
    Add {
        /// The credential's alias, referenced as `{{credential:ALIAS}}`.
        alias: String,
    },
    /// Remove the credential stored under `alias`.
    Del {
        /// The credential's alias.
        alias: String,
    },
    /// List every credential's alias, id, and creation time (never
    /// values).
    List,
    /// Drop the in-memory derived key and its on-disk cache.
    Lock,
    /// Delete the vault file, device key, and cache file.
    Reset {
        /// Skip the confirmation prompt; required in non-interactive use.
        #[arg(long)]
        yes: bool,
    },
    /// Import credentials exported by the browser extension: a JSON array
    /// of `{alias, value}` read from stdin.
    ImportFromExtension,
}
