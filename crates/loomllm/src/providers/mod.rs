pub mod gemini;
pub mod ollama;
pub mod openai;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::extract::extract_record;
use crate::schema::RecordSchema;
use async_trait::async_trait;
use loomcore::{EngineError, ProviderError, Record};

/// Parameters for one generation call, resolved by the model selector.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Wire-level model name (the descriptor's `name`, not the registry key).
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Whether the resolved model supports a provider-native JSON mode.
    pub json_mode: bool,
}

/// Capability contract every provider adapter must support.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn generate(&self, req: &GenerateRequest) -> Result<String, ProviderError>;

    /// Generate a record validated against `schema`. The default path
    /// injects the schema into the prompt and coerces the text response;
    /// providers with a native structured mode override this.
    async fn generate_structured(
        &self,
        req: &GenerateRequest,
        schema: &RecordSchema,
    ) -> Result<Record, EngineError> {
        coerce_structured(self, req, schema).await
    }

    /// Local-only providers report reachability here so the fallback chain
    /// can skip them without counting a hard failure.
    async fn is_available(&self) -> bool {
        true
    }

    fn is_local(&self) -> bool {
        false
    }
}

/// Prompt-engineered structured output: inject the schema, generate text,
/// extract the first parseable JSON object and validate it.
pub async fn coerce_structured<P: ModelProvider + ?Sized>(
    provider: &P,
    req: &GenerateRequest,
    schema: &RecordSchema,
) -> Result<Record, EngineError> {
    let structured = GenerateRequest {
        prompt: structured_prompt(&req.prompt, schema),
        ..req.clone()
    };
    let text = provider.generate(&structured).await?;
    let mut record = extract_record(&text)?;
    schema.validate(&mut record)?;
    Ok(record)
}

pub(crate) fn structured_prompt(prompt: &str, schema: &RecordSchema) -> String {
    let schema_str = serde_json::to_string_pretty(schema.raw()).unwrap_or_default();
    format!(
        "Respond ONLY with valid JSON matching this schema. \
         Do not include any explanation or markdown formatting.\n\n\
         Schema:\n{schema_str}\n\nRequest: {prompt}"
    )
}

/// Validate a provider's native JSON response against the schema.
pub(crate) fn validate_json_response(
    text: &str,
    schema: &RecordSchema,
) -> Result<Record, EngineError> {
    let mut record = extract_record(text)?;
    schema.validate(&mut record)?;
    Ok(record)
}
