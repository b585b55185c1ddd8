//! A [`RepairProvider`] backed by a local Ollama server, for repair without
//! a network round-trip to a hosted provider.

use std::time::Duration;

use serde_json::json;

use crate::{
    error::{Error, Result},
    prompt,
    provider::{RepairProvider, RepairRequest, RepairSuggestion},
};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/api/generate";
const DEFAULT_MODEL: &str = "llama3.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Suggests replacement hints via a local Ollama model.
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Build a provider pointed at `endpoint` (or Ollama's default
    /// `http://127.0.0.1:11434/api/generate`) running `model`.
    pub fn new(endpoint: Option<String>, model: Option<String>) -> Self {
        Self {
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl RepairProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn suggest(&self, request: &RepairRequest) -> Result<RepairSuggestion> {
        let body = json!({
            "model": self.model,
            "prompt": prompt::build(request),
            "format": "json",
            "stream": false,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Request(format!("ollama returned {}", response.status())));
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let text = envelope["response"]
            .as_str()
            .ok_or_else(|| Error::InvalidResponse("missing `response` field".to_string()))?;

        serde_json::from_str(text.trim()).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}
