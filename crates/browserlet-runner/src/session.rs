//! `--session-restore <id>`: resume a prior run by skipping steps already
//! recorded as succeeded.

use std::{collections::HashSet, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A run's session-restore ledger, written next to the output dir and keyed
/// by the script name and restore id: `{output_dir}/{script}.session.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLedger {
    /// The restore id this ledger belongs to.
    pub session_id: String,
    /// Ids of steps that completed successfully in a prior attempt.
    pub succeeded_steps: HashSet<String>,
}

impl SessionLedger {
    /// Path the ledger for `script_name`/`session_id` lives at.
    pub fn path(output_dir: &Path, script_name: &str, session_id: &str) -> PathBuf {
        output_dir.join(format!("{script_name}.{session_id}.session.json"))
    }

    /// Load a ledger from disk, or start a fresh empty one for `session_id`
    /// if none exists yet.
    pub fn load_or_new(output_dir: &Path, script_name: &str, session_id: &str) -> Result<Self> {
        let path = Self::path(output_dir, script_name, session_id);
        match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::Infrastructure(format!("corrupt session ledger {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self {
                session_id: session_id.to_string(),
                succeeded_steps: HashSet::new(),
            }),
            Err(e) => Err(Error::Infrastructure(format!(
                "could not read session ledger {}: {e}",
                path.display()
            ))),
        }
    }

    /// Whether `step_id` already succeeded in a prior attempt and should be
    /// skipped this run.
    pub fn already_succeeded(&self, step_id: &str) -> bool {
        self.succeeded_steps.contains(step_id)
    }

    /// Record `step_id` as succeeded and persist the ledger.
    pub fn mark_succeeded(&mut self, output_dir: &Path, script_name: &str, step_id: &str) -> Result<()> {
        self.succeeded_steps.insert(step_id.to_string());
        let path = Self::path(output_dir, script_name, &self.session_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Infrastructure(format!("could not create {}: {e}", parent.display())))?;
        }
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Infrastructure(format!("could not serialize session ledger: {e}")))?;
        std::fs::write(&path, serialized)
            .map_err(|e| Error::Infrastructure(format!("could not write {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn fresh_session_has_nothing_succeeded() {
        let dir = tempdir().unwrap();
        let ledger = SessionLedger::load_or_new(dir.path(), "login", "abc123").unwrap();
        assert!(!ledger.already_succeeded("step-001-click"));
    }

    #[test]
    fn marked_steps_survive_a_reload() {
        let dir = tempdir().unwrap();
        let mut ledger = SessionLedger::load_or_new(dir.path(), "login", "abc123").unwrap();
        ledger.mark_succeeded(dir.path(), "login", "step-001-click").unwrap();

        let reloaded = SessionLedger::load_or_new(dir.path(), "login", "abc123").unwrap();
        assert!(reloaded.already_succeeded("step-001-click"));
        assert!(!reloaded.already_succeeded("step-002-type"));
    }
}
