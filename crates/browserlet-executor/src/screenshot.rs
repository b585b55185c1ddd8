//! Screenshot path synthesis.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Build `{output_dir}/{script}_{step_id}_{timestamp}.png` for a screenshot
/// step that did not specify an explicit path in `value`.
pub fn synthesize_path(output_dir: &Path, script_name: &str, step_id: &str, at: DateTime<Utc>) -> PathBuf {
    let ts = at.format("%Y%m%dT%H%M%S%.3fZ");
    output_dir.join(format!("{script_name}_{step_id}_{ts}.png"))
}

/// Resolve the screenshot destination: `value` verbatim when given, the
/// synthesized default path otherwise.
pub fn resolve_path(
    value: Option<&str>,
    output_dir: &Path,
    script_name: &str,
    step_id: &str,
) -> PathBuf {
    match value {
        Some(explicit) => PathBuf::from(explicit),
        None => synthesize_path(output_dir, script_name, step_id, Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_value_is_used_verbatim() {
        let path = resolve_path(Some("/tmp/a.png"), Path::new("/out"), "login", "step-002-screenshot");
        assert_eq!(path, PathBuf::from("/tmp/a.png"));
    }

    #[test]
    fn missing_value_synthesizes_under_output_dir() {
        let path = resolve_path(None, Path::new("/out"), "login", "step-002-screenshot");
        assert!(path.starts_with("/out"));
        assert!(path.to_string_lossy().contains("login_step-002-screenshot_"));
        assert!(path.extension().is_some_and(|e| e == "png"));
    }
}
