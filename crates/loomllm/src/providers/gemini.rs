use super::{validate_json_response, GenerateRequest, ModelProvider};
use crate::schema::RecordSchema;
use async_trait::async_trait;
use loomcore::{EngineError, ProviderError, Record};
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("GEMINI_API_KEY").ok())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate_content(
        &self,
        req: &GenerateRequest,
        json_mime: bool,
    ) -> Result<String, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Request("gemini: missing API key".into()))?;

        let mut generation_config = json!({
            "temperature": req.temperature,
            "maxOutputTokens": req.max_tokens,
        });
        if json_mime {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let mut payload = json!({
            "contents": [{"parts": [{"text": req.prompt}]}],
            "generationConfig": generation_config,
        });
        if let Some(system) = &req.system_prompt {
            payload["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        debug!(model = %req.model, json_mime, "generateContent request");

        let url = format!(
            "{}/models/{}:generateContent?key={key}",
            self.base_url, req.model
        );
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("gemini: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "gemini: HTTP {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Request(format!("gemini: invalid response: {e}")))?;

        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Request("gemini: empty candidate".into()))
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<String, ProviderError> {
        self.generate_content(req, false).await
    }

    async fn generate_structured(
        &self,
        req: &GenerateRequest,
        schema: &RecordSchema,
    ) -> Result<Record, EngineError> {
        // Gemini can emit pure JSON natively; the schema still rides in the
        // prompt so field names and required-ness are visible to the model.
        let structured = GenerateRequest {
            prompt: super::structured_prompt(&req.prompt, schema),
            ..req.clone()
        };
        let text = self.generate_content(&structured, true).await?;
        validate_json_response(&text, schema)
    }
}
