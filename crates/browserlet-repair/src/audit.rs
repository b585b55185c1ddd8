//! Append-only JSON audit trail for applied repairs.

use std::path::Path;

use browserlet_protocol::Hint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The filename written alongside a `.bsl` script.
pub const HISTORY_FILENAME: &str = ".browserlet-repair-history.json";

/// One applied-repair record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the repair was applied.
    pub timestamp: DateTime<Utc>,
    /// Path of the `.bsl` file that was rewritten.
    pub script_path: String,
    /// Zero-based index of the rewritten step.
    pub step_index: usize,
    /// The hints the step carried before the repair.
    pub original_hints: Vec<Hint>,
    /// The hints applied by the repair.
    pub applied_hints: Vec<Hint>,
    /// The provider's reported confidence.
    pub confidence: f64,
    /// The provider's reasoning string.
    pub reasoning: String,
    /// The page URL at the time of the failure that triggered the repair.
    pub url: String,
}

/// Append `entry` to the history file sibling to `script_path`.
///
/// Read-modify-write; concurrent runners racing on the same script is a
/// documented limitation.
pub fn append(script_path: &Path, entry: AuditEntry) -> Result<()> {
    let history_path = history_path_for(script_path);
    let mut entries: Vec<AuditEntry> = if history_path.exists() {
        let raw = std::fs::read_to_string(&history_path).map_err(|e| Error::AuditIo {
            path: history_path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).unwrap_or_default()
    } else {
        Vec::new()
    };
    entries.push(entry);

    let body = serde_json::to_string_pretty(&entries).expect("AuditEntry list serializes");
    std::fs::write(&history_path, body).map_err(|e| Error::AuditIo {
        path: history_path.display().to_string(),
        message: e.to_string(),
    })
}

/// The history file path for a given `.bsl` script path.
pub fn history_path_for(script_path: &Path) -> std::path::PathBuf {
    script_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(HISTORY_FILENAME)
}

#[cfg(test)]
mod tests {
    use browserlet_protocol::HintType;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn appends_entries_across_calls() {
        let dir = tempdir().unwrap();
        let script_path = dir.path().join("login.bsl");
        std::fs::write(&script_path, "name: login\nsteps: []\n").unwrap();

        let entry = AuditEntry {
            timestamp: Utc::now(),
            script_path: script_path.display().to_string(),
            step_index: 1,
            original_hints: vec![Hint::plain(HintType::Role, "button")],
            applied_hints: vec![Hint::plain(HintType::AriaLabel, "Submit form")],
            confidence: 0.82,
            reasoning: "matched visible text".into(),
            url: "https://example.com".into(),
        };
        append(&script_path, entry.clone()).unwrap();
        append(&script_path, entry).unwrap();

        let raw = std::fs::read_to_string(history_path_for(&script_path)).unwrap();
        let entries: Vec<AuditEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
