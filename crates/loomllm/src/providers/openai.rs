use super::{validate_json_response, GenerateRequest, ModelProvider};
use crate::schema::RecordSchema;
use async_trait::async_trait;
use loomcore::{EngineError, ProviderError, Record};
use serde_json::{json, Value};
use tracing::debug;

/// Chat-completions provider for OpenAI and OpenAI-compatible backends
/// (DeepInfra uses the same wire format with a different base URL).
pub struct OpenAiProvider {
    id: String,
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_id("openai", base_url, api_key)
    }

    pub fn with_id(
        id: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            "https://api.openai.com/v1",
            std::env::var("OPENAI_API_KEY").ok(),
        )
    }

    pub fn deepinfra_from_env() -> Self {
        Self::with_id(
            "deepinfra",
            "https://api.deepinfra.com/v1/openai",
            std::env::var("DEEPINFRA_API_KEY").ok(),
        )
    }

    async fn chat(&self, req: &GenerateRequest, json_mode: bool) -> Result<String, ProviderError> {
        let mut messages = Vec::new();
        if let Some(system) = &req.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": req.prompt}));

        let mut payload = json!({
            "model": req.model,
            "messages": messages,
            "temperature": req.temperature,
            "max_tokens": req.max_tokens,
        });
        if json_mode {
            payload["response_format"] = json!({"type": "json_object"});
        }

        debug!(provider = %self.id, model = %req.model, "chat completion request");

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("{}: {e}", self.id)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "{}: HTTP {status}: {body}",
                self.id
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Request(format!("{}: invalid response: {e}", self.id)))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Request(format!("{}: empty completion", self.id)))
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<String, ProviderError> {
        self.chat(req, false).await
    }

    async fn generate_structured(
        &self,
        req: &GenerateRequest,
        schema: &RecordSchema,
    ) -> Result<Record, EngineError> {
        if !req.json_mode {
            return super::coerce_structured(self, req, schema).await;
        }
        let structured = GenerateRequest {
            prompt: super::structured_prompt(&req.prompt, schema),
            ..req.clone()
        };
        let text = self.chat(&structured, true).await?;
        validate_json_response(&text, schema)
    }
}
