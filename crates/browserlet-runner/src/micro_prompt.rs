//! Bridges the resolver's synchronous stage-4 hook to an LLM call. Distinct from [`browserlet_repair`]: this asks a model to
//! *choose among already-scored candidates*, not to suggest new hints, so it
//! talks to the provider endpoints directly rather than going through
//! [`browserlet_repair::RepairProvider`].

use std::time::Duration;

use browserlet_protocol::ScoredCandidate;
use browserlet_resolver::MicroPromptProvider;
use serde_json::json;
use tracing::warn;

use crate::config::LlmProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const CLAUDE_DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const OLLAMA_DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/api/generate";
const OLLAMA_DEFAULT_MODEL: &str = "llama3.1";

/// A [`MicroPromptProvider`] backed by a configured LLM, bridged into the
/// resolver's synchronous call via `Handle::block_on`.
pub struct LlmMicroPrompt {
    provider: LlmProvider,
    client: reqwest::Client,
    handle: tokio::runtime::Handle,
}

impl LlmMicroPrompt {
    /// Build an adapter around `provider`, capturing the current Tokio
    /// runtime handle to block on from the resolver's synchronous call.
    pub fn new(provider: LlmProvider, handle: tokio::runtime::Handle) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn choose_async(&self, intent: &str, candidates: &[ScoredCandidate]) -> Option<usize> {
        let prompt = build_prompt(intent, candidates);
        let text = match &self.provider {
            LlmProvider::Claude { api_key, model } => {
                self.ask_claude(api_key.as_deref(), model.as_deref(), &prompt).await
            }
            LlmProvider::Ollama { endpoint, model } => {
                self.ask_ollama(endpoint.as_deref(), model.as_deref(), &prompt).await
            }
        };
        let text = match text {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "micro-prompt provider failed");
                return None;
            }
        };
        parse_choice(&text)
    }

    async fn ask_claude(&self, api_key: Option<&str>, model: Option<&str>, prompt: &str) -> reqwest::Result<String> {
        let api_key = api_key
            .map(str::to_string)
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .unwrap_or_default();
        let model = model.unwrap_or(CLAUDE_DEFAULT_MODEL);
        let response = self
            .client
            .post(CLAUDE_API_URL)
            .timeout(REQUEST_TIMEOUT)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": model,
                "max_tokens": 64,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await?
            .error_for_status()?;
        let envelope: serde_json::Value = response.json().await?;
        Ok(envelope["content"][0]["text"].as_str().unwrap_or_default().to_string())
    }

    async fn ask_ollama(&self, endpoint: Option<&str>, model: Option<&str>, prompt: &str) -> reqwest::Result<String> {
        let endpoint = endpoint.unwrap_or(OLLAMA_DEFAULT_ENDPOINT);
        let model = model.unwrap_or(OLLAMA_DEFAULT_MODEL);
        let response = self
            .client
            .post(endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "model": model, "prompt": prompt, "stream": false }))
            .send()
            .await?
            .error_for_status()?;
        let envelope: serde_json::Value = response.json().await?;
        Ok(envelope["response"].as_str().unwrap_or_default().to_string())
    }
}

impl MicroPromptProvider for LlmMicroPrompt {
    fn choose(&self, intent: &str, candidates: &[ScoredCandidate]) -> Option<usize> {
        tokio::task::block_in_place(|| self.handle.block_on(self.choose_async(intent, candidates)))
    }
}

fn build_prompt(intent: &str, candidates: &[ScoredCandidate]) -> String {
    let mut prompt = format!(
        "A browser automation step is looking for an element matching this intent: {intent:?}\n\
         Here are the top candidates, indexed from 0. Reply with only the index of the best match, or \"none\".\n\n"
    );
    for (i, c) in candidates.iter().enumerate() {
        prompt.push_str(&format!(
            "{i}: tag={} text={:?} role={:?} adjusted_confidence={:.2}\n",
            c.candidate.tag, c.candidate.visible_text, c.candidate.attributes.role, c.adjusted_confidence
        ));
    }
    prompt
}

fn parse_choice(text: &str) -> Option<usize> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_digit_choice() {
        assert_eq!(parse_choice("2"), Some(2));
    }

    #[test]
    fn parses_digit_followed_by_commentary() {
        assert_eq!(parse_choice("1 - the Sign in button"), Some(1));
    }

    #[test]
    fn none_reply_yields_no_choice() {
        assert_eq!(parse_choice("none"), None);
    }
}
