//! BSL (Browserlet Scripting Language) loading and in-place rewriting.
//!
//! BSL is a YAML dialect: `{name, steps: [Step]}`. Unknown keys
//! are ignored; unknown action names fail parse. Recorder output is
//! tolerated by stripping zero-width and line/paragraph-separator
//! characters before parsing.
#![warn(missing_docs)]

pub mod error;
mod rewrite;

use std::{fs, path::Path};

use browserlet_protocol::{Hint, Script};

pub use error::Error;
pub use rewrite::rewrite_step_hints;

/// Load and parse a `.bsl` file from disk.
pub fn load_script(path: &Path) -> Result<Script, Error> {
    let raw = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    parse_script(&raw, Some(path))
}

/// Parse BSL source text into a [`Script`].
///
/// Zero-width and bidi/line-separator characters (`U+200B`–`U+200F`,
/// `U+2028`–`U+202F`, `U+FEFF`) are stripped first so recorder output
/// parses identically to hand-written scripts.
pub fn parse_script(source: &str, path: Option<&Path>) -> Result<Script, Error> {
    let cleaned = strip_invisible_characters(source);
    serde_yaml::from_str(&cleaned).map_err(|e| Error::from_yaml(&e, path))
}

/// Strip the zero-width and paragraph/line-separator characters recorders
/// sometimes emit.
pub fn strip_invisible_characters(source: &str) -> String {
    source
        .chars()
        .filter(|c| !is_invisible(*c))
        .collect()
}

/// Whether `c` is one of the invisible characters BSL must tolerate.
fn is_invisible(c: char) -> bool {
    matches!(c as u32, 0x200B..=0x200F | 0x2028..=0x202F | 0xFEFF)
}

/// Atomically rewrite step `step_index`'s hints in the file at `path` to
/// `new_hints`, preserving every other byte of the file.
pub fn apply_hint_rewrite(path: &Path, step_index: usize, new_hints: &[Hint]) -> Result<(), Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let path_str = path.display().to_string();
    let rewritten = rewrite_step_hints(&source, &path_str, step_index, new_hints)?;

    let tmp_path = path.with_extension("bsl.tmp");
    fs::write(&tmp_path, rewritten).map_err(|e| Error::RewriteIo {
        path: path_str.clone(),
        message: e.to_string(),
    })?;
    fs::rename(&tmp_path, path).map_err(|e| Error::RewriteIo {
        path: path_str,
        message: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use browserlet_protocol::ActionKind;

    use super::*;

    const HAPPY_PATH: &str = r#"
name: example
steps:
  - action: navigate
    value: "https://example.com"
  - action: screenshot
    value: "/tmp/a.png"
  - action: extract
    target:
      intent: heading
      hints:
        - type: role
          value: heading
      fallback_selector: "h1"
    output:
      variable: h
"#;

    #[test]
    fn parses_happy_path_script() {
        let script = parse_script(HAPPY_PATH, None).unwrap();
        assert_eq!(script.name, "example");
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[0].action, ActionKind::Navigate);
        assert_eq!(script.steps[2].output.as_ref().unwrap().variable, "h");
    }

    #[test]
    fn unknown_action_fails_parse() {
        let src = "name: x\nsteps:\n  - action: frobnicate\n";
        let err = parse_script(src, None).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn unknown_top_level_keys_are_ignored() {
        let src = "name: x\nrecorder_version: 3\nsteps: []\n";
        let script = parse_script(src, None).unwrap();
        assert_eq!(script.name, "x");
        assert!(script.steps.is_empty());
    }

    #[test]
    fn zero_width_characters_do_not_alter_parsed_steps() {
        let clean = "name: x\nsteps:\n  - action: click\n    target: {intent: a, hints: []}\n";
        let dirty: String = clean
            .chars()
            .flat_map(|c| vec![c, '\u{200B}'])
            .collect();
        let clean_script = parse_script(clean, None).unwrap();
        let dirty_script = parse_script(&dirty, None).unwrap();
        assert_eq!(clean_script.steps.len(), dirty_script.steps.len());
        assert_eq!(clean_script.steps[0].action, dirty_script.steps[0].action);
    }

    #[test]
    fn round_trips_hint_rewrite_on_disk() {
        use browserlet_protocol::HintType;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.bsl");
        fs::write(
            &path,
            "steps:\n  - action: click\n    target:\n      intent: x\n      hints:\n        - type: role\n          value: button\n",
        )
        .unwrap();
        apply_hint_rewrite(&path, 0, &[Hint::plain(HintType::AriaLabel, "Submit")]).unwrap();
        let out = fs::read_to_string(&path).unwrap();
        assert!(out.contains("aria_label"));
        assert!(!out.contains("type: role"));
    }
}
