//! Placeholder substitution: `{{credential:ALIAS}}` and `{{var.PATH}}`.
//!
//! Both placeholder kinds are found and replaced in a single linear
//! `Regex::replace_all` pass over the *original* string, so a resolved
//! credential value can never itself be re-scanned for a nested
//! placeholder.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{error::Error, variables::ExtractedVariables};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(credential:[^}]*|var\.[^}]*)\}\}").expect("static pattern"));

/// Errors specific to substitution; kept separate from [`crate::error::Error`]
/// because these are step-level failures, not run-aborting ones.
#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    /// `{{credential:…}}` appears in the step but no vault is available.
    #[error("step {step_id} references a credential but no vault is available")]
    VaultUnavailable {
        /// The step's id.
        step_id: String,
    },
    /// The vault failed to resolve a referenced alias.
    #[error(transparent)]
    Vault(#[from] browserlet_vault::Error),
}

/// Resolves `{{credential:ALIAS}}` placeholders during substitution.
/// Implemented by `browserlet_vault::Vault`/`SharedVault`.
pub use browserlet_vault::PasswordStorage;

/// Substitute every placeholder in `value`, in one linear scan.
///
/// Credential placeholders are considered first: if any are present and
/// `vault` is `None`, the whole substitution fails without touching the
/// variable scan (and without naming the alias value).
pub fn substitute(
    value: &str,
    step_id: &str,
    vault: Option<&dyn PasswordStorage>,
    variables: &ExtractedVariables,
) -> Result<String, SubstitutionError> {
    if vault.is_none() && has_credential_placeholder(value) {
        return Err(SubstitutionError::VaultUnavailable {
            step_id: step_id.to_string(),
        });
    }

    let mut first_error = None;
    let replaced = PLACEHOLDER.replace_all(value, |caps: &regex::Captures<'_>| {
        let inner = &caps[1];
        if let Some(alias) = inner.strip_prefix("credential:") {
            match vault.expect("checked above").resolve_credential(alias.trim()) {
                Ok(resolved) => resolved,
                Err(e) => {
                    first_error.get_or_insert(e);
                    String::new()
                }
            }
        } else if let Some(path) = inner.strip_prefix("var.") {
            variables.lookup(path.trim()).unwrap_or_default()
        } else {
            caps[0].to_string()
        }
    });

    if let Some(e) = first_error {
        return Err(SubstitutionError::Vault(e));
    }
    Ok(replaced.into_owned())
}

fn has_credential_placeholder(value: &str) -> bool {
    PLACEHOLDER
        .captures_iter(value)
        .any(|c| c[1].starts_with("credential:"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FakeVault(Mutex<std::collections::HashMap<String, String>>);

    impl PasswordStorage for FakeVault {
        fn resolve_credential(&self, alias: &str) -> browserlet_vault::Result<String> {
            self.0
                .lock()
                .unwrap()
                .get(alias)
                .cloned()
                .ok_or_else(|| browserlet_vault::Error::AliasNotFound(alias.to_string()))
        }
    }

    fn vault_with(pairs: &[(&str, &str)]) -> FakeVault {
        FakeVault(Mutex::new(
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        ))
    }

    #[test]
    fn substitutes_credential_placeholder() {
        let vault = vault_with(&[("LINAGORA", "s3cret")]);
        let out = substitute("{{credential:LINAGORA}}", "step-1", Some(&vault), &ExtractedVariables::new()).unwrap();
        assert_eq!(out, "s3cret");
    }

    #[test]
    fn credential_without_vault_fails_deterministically_without_alias_in_message() {
        let err = substitute("{{credential:LINAGORA}}", "step-004-type", None, &ExtractedVariables::new())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("step-004-type"));
        assert!(!message.contains("LINAGORA"));
    }

    #[test]
    fn substitutes_variable_reference() {
        let mut vars = ExtractedVariables::new();
        vars.set("h", serde_json::Value::String("Example Domain".into()));
        let out = substitute("heading: {{var.h}}", "step-1", None, &vars).unwrap();
        assert_eq!(out, "heading: Example Domain");
    }

    #[test]
    fn credential_value_does_not_re_enter_variable_scan() {
        let vault = vault_with(&[("ALIAS", "{{var.should_not_expand}}")]);
        let mut vars = ExtractedVariables::new();
        vars.set("should_not_expand", serde_json::Value::String("LEAKED".into()));
        let out = substitute("{{credential:ALIAS}}", "step-1", Some(&vault), &vars).unwrap();
        assert_eq!(out, "{{var.should_not_expand}}");
    }
}
