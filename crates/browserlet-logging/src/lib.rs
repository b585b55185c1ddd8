#![warn(missing_docs)]

//! Shared logging helpers, CLI argument definitions, and the credential
//! redaction used throughout the Browserlet workspace.
//!
//! This crate consolidates:
//! - [`LogArgs`]: CLI flags flattened into every Browserlet binary.
//! - [`compute_spec`]/[`env_filter_from_spec`]: build a `tracing-subscriber`
//!   filter the same way across binaries.
//! - [`redact_credential_placeholders`]/[`redact_secret`]: replace
//!   `{{credential:ALIAS}}` placeholders and known secret values before a
//!   string reaches a log line, so a credential's plaintext never appears
//!   in logs.

use std::env;

use clap::Args;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::EnvFilter;

/// Crate targets included in default logging directives.
const OUR_CRATES: &[&str] = &[
    "browserlet_cli",
    "browserlet_runner",
    "browserlet_resolver",
    "browserlet_executor",
    "browserlet_vault",
    "browserlet_repair",
    "browserlet_dom",
    "browserlet_bsl",
];

/// Logging controls for CLI apps.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Set global log level to trace (our crates only)
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set global log level to debug (our crates only)
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single global log level for our crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    #[arg(long)]
    pub log_filter: Option<String>,
}

/// Build crate-scoped directives for the given level.
fn crate_specs(level: &str) -> Vec<String> {
    let lvl = level.to_ascii_lowercase();
    OUR_CRATES
        .iter()
        .map(|t| format!("{t}={lvl}"))
        .collect()
}

/// Build a filter directive string that sets the same `level` for all of
/// our crates.
pub fn level_spec_for(level: &str) -> String {
    crate_specs(level).join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    if let Ok(spec) = env::var("RUST_LOG") {
        spec
    } else {
        level_spec_for("info")
    }
}

/// Create an `EnvFilter` from a filter spec string.
pub fn env_filter_from_spec(spec: &str) -> EnvFilter {
    EnvFilter::new(spec)
}

/// Matches `{{credential:ALIAS}}` placeholders.
static CREDENTIAL_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{credential:[^}]*\}\}").expect("static pattern"));

/// Replace any `{{credential:ALIAS}}` placeholder in `text` with
/// `{{credential:***}}`, for the rare caller that wants to suppress alias
/// names too.
pub fn redact_credential_placeholders(text: &str) -> String {
    CREDENTIAL_PLACEHOLDER
        .replace_all(text, "{{credential:***}}")
        .into_owned()
}

/// Redact a known secret value out of arbitrary text, replacing every
/// occurrence with `***`. Used before logging anything derived from a step's
/// post-substitution value when a credential was involved.
pub fn redact_secret(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_credential_placeholder() {
        let out = redact_credential_placeholders("type value: {{credential:LINAGORA}}");
        assert_eq!(out, "type value: {{credential:***}}");
    }

    #[test]
    fn redacts_known_secret_value() {
        let out = redact_secret("typed s3cret into field", "s3cret");
        assert_eq!(out, "typed *** into field");
    }

    #[test]
    fn empty_secret_is_not_redacted_everywhere() {
        let out = redact_secret("hello world", "");
        assert_eq!(out, "hello world");
    }

    #[test]
    fn default_spec_scopes_to_our_crates_at_info() {
        let spec = compute_spec(false, false, None, None);
        assert!(spec.contains("browserlet_cli=info"));
    }
}
