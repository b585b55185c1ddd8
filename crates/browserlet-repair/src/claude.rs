//! A [`RepairProvider`] backed by the Claude Messages API.
//!
//! LLM providers are treated as external collaborators; this is a thin HTTP
//! client that asks for a JSON-shaped suggestion and nothing more.

use std::time::Duration;

use serde_json::json;
use tracing::warn;

use crate::{
    error::{Error, Result},
    prompt,
    provider::{RepairProvider, RepairRequest, RepairSuggestion},
};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Suggests replacement hints by asking a Claude model to look at the
/// failed step's context and propose a fix.
pub struct ClaudeProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ClaudeProvider {
    /// Build a provider from an explicit API key, reading `ANTHROPIC_MODEL`
    /// if set and otherwise defaulting to [`DEFAULT_MODEL`].
    pub fn new(api_key: impl Into<String>) -> Self {
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self {
            api_key: api_key.into(),
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Build a provider from the `ANTHROPIC_API_KEY` environment variable
    ///. Returns `None` when it is unset.
    pub fn from_env() -> Option<Self> {
        std::env::var("ANTHROPIC_API_KEY").ok().map(Self::new)
    }

}

#[async_trait::async_trait]
impl RepairProvider for ClaudeProvider {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn suggest(&self, request: &RepairRequest) -> Result<RepairSuggestion> {
        let response = self
            .client
            .post(API_URL)
            .timeout(REQUEST_TIMEOUT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.model,
                "max_tokens": 1024,
                "messages": [{ "role": "user", "content": prompt::build(request) }],
            }))
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Request(format!("claude api returned {}", response.status())));
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let text = envelope["content"][0]["text"].as_str().ok_or_else(|| {
            Error::InvalidResponse("missing content[0].text in claude response".to_string())
        })?;

        parse_suggestion(text)
    }
}

/// Parse the model's JSON reply, tolerating a fenced code block around it.
fn parse_suggestion(text: &str) -> Result<RepairSuggestion> {
    let trimmed = text.trim();
    let json_text = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end_matches("```").trim())
        .unwrap_or(trimmed);
    match serde_json::from_str::<RepairSuggestion>(json_text) {
        Ok(suggestion) => Ok(suggestion),
        Err(e) => {
            warn!(error = %e, "could not parse repair suggestion");
            Err(Error::InvalidResponse(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let raw = r#"{"suggested_hints":[{"type":"aria_label","value":"Submit form"}],"confidence":0.82,"reasoning":"matches visible text"}"#;
        let suggestion = parse_suggestion(raw).unwrap();
        assert_eq!(suggestion.suggested_hints.len(), 1);
        assert!((suggestion.confidence - 0.82).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"suggested_hints\":[],\"confidence\":0.1,\"reasoning\":\"none\"}\n```";
        let suggestion = parse_suggestion(raw).unwrap();
        assert!(suggestion.suggested_hints.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_suggestion("not json at all").is_err());
    }
}
