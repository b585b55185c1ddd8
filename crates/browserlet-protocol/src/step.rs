//! Script and step data types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hint::Hint;

/// An ordered, named sequence of steps loaded from a `.bsl` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Human-readable script name.
    pub name: String,
    /// Steps to run, in order.
    pub steps: Vec<Step>,
}

/// A single recorded action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Explicit step id; defaults to `step-NNN-action` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The action to perform.
    pub action: ActionKind,
    /// Target element description; required except for `navigate` and a
    /// bare `screenshot`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    /// Literal or placeholder-bearing value, meaning depends on `action`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Per-step timeout override, e.g. `"2s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    /// Where to store a value this step produces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,
}

impl Step {
    /// The step id, defaulting to `step-{index:03}-{action}` when unset.
    pub fn effective_id(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| {
            format!("step-{:03}-{}", index + 1, self.action.as_str())
        })
    }

    /// Resolve this step's timeout, falling back to the supplied global
    /// default, by parsing the `Ns`/`Nms` duration suffix.
    pub fn timeout_duration(&self, global: Duration) -> Result<Duration, DurationParseError> {
        match &self.timeout {
            None => Ok(global),
            Some(raw) => parse_short_duration(raw),
        }
    }
}

/// Error parsing a `Ns`/`Nms` duration string.
#[derive(Debug, thiserror::Error)]
#[error("invalid duration {0:?}: expected a suffix of s or ms, e.g. \"2s\" or \"500ms\"")]
pub struct DurationParseError(pub String);

/// Parse the `Ns` / `Nms` duration grammar scripts write timeouts in (not a
/// general-purpose duration parser; see `humantime` for that).
pub fn parse_short_duration(raw: &str) -> Result<Duration, DurationParseError> {
    let raw = raw.trim();
    if let Some(ms) = raw.strip_suffix("ms") {
        let n: u64 = ms.parse().map_err(|_| DurationParseError(raw.to_string()))?;
        return Ok(Duration::from_millis(n));
    }
    if let Some(s) = raw.strip_suffix('s') {
        let n: f64 = s.parse().map_err(|_| DurationParseError(raw.to_string()))?;
        if n < 0.0 {
            return Err(DurationParseError(raw.to_string()));
        }
        return Ok(Duration::from_secs_f64(n));
    }
    Err(DurationParseError(raw.to_string()))
}

/// The closed set of actions a step may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Navigate to a URL.
    Navigate,
    /// Click the resolved element.
    Click,
    /// Focus, clear, and type into the resolved element.
    Type,
    /// Choose an option in a `<select>`.
    Select,
    /// Wait for the resolved element to reach a visibility state.
    WaitFor,
    /// Dispatch a hover event.
    Hover,
    /// Scroll the resolved element into view.
    Scroll,
    /// Read text from the resolved element into a variable.
    Extract,
    /// Parse a `<table>` under the resolved element into records.
    TableExtract,
    /// Save a screenshot.
    Screenshot,
}

impl ActionKind {
    /// The lowercase action name, as used in step ids and BSL files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Click => "click",
            Self::Type => "type",
            Self::Select => "select",
            Self::WaitFor => "wait_for",
            Self::Hover => "hover",
            Self::Scroll => "scroll",
            Self::Extract => "extract",
            Self::TableExtract => "table_extract",
            Self::Screenshot => "screenshot",
        }
    }

    /// Whether this action requires a resolved target.
    pub fn requires_target(self, has_target: bool) -> bool {
        match self {
            Self::Navigate => false,
            Self::Screenshot => has_target,
            _ => true,
        }
    }
}

/// A target element description: intent plus weighted hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Human-readable description of what this target represents.
    pub intent: String,
    /// Weighted hints used by the cascade resolver.
    #[serde(default)]
    pub hints: Vec<Hint>,
    /// Raw CSS selector used only as the stage-5 fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_selector: Option<String>,
}

/// Where to store a value a step produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    /// Name under which the value is stored in the extracted-variables map.
    pub variable: String,
    /// Optional named transform to apply before storing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformName>,
}

/// A named, built-in value transform. Locale-aware
/// value transforms are out of scope; these are the
/// fixed, locale-independent built-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformName {
    /// Strip leading/trailing whitespace.
    Trim,
    /// Parse a leading numeric substring, emitting a canonical decimal string.
    Number,
    /// Uppercase the ASCII-visible text.
    Uppercase,
    /// Lowercase the ASCII-visible text.
    Lowercase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_id_includes_index_and_action() {
        let step = Step {
            id: None,
            action: ActionKind::Click,
            target: None,
            value: None,
            timeout: None,
            output: None,
        };
        assert_eq!(step.effective_id(4), "step-005-click");
    }

    #[test]
    fn parses_seconds_and_milliseconds() {
        assert_eq!(parse_short_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(
            parse_short_duration("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            parse_short_duration("1.5s").unwrap(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn rejects_unsuffixed_duration() {
        assert!(parse_short_duration("2").is_err());
    }
}
