use super::{GenerateRequest, ModelProvider};
use async_trait::async_trait;
use loomcore::ProviderError;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Local Ollama provider. Probed for liveness before the fallback chain
/// attempts it; unreachable means skipped, not failed.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<String, ProviderError> {
        let mut payload = json!({
            "model": req.model,
            "prompt": req.prompt,
            "stream": false,
            "options": {
                "temperature": req.temperature,
                "num_predict": req.max_tokens,
            }
        });
        if let Some(system) = &req.system_prompt {
            payload["system"] = json!(system);
        }

        debug!(model = %req.model, "ollama generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("ollama: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Request(format!("ollama: HTTP {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Request(format!("ollama: invalid response: {e}")))?;

        Ok(body["response"].as_str().unwrap_or_default().to_string())
    }

    async fn is_available(&self) -> bool {
        let probe = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        matches!(probe, Ok(r) if r.status().is_success())
    }

    fn is_local(&self) -> bool {
        true
    }
}
