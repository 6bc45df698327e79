use crate::catalog::ModelCatalog;
use crate::providers::{GenerateRequest, ModelProvider};
use crate::schema::RecordSchema;
use loomcore::{EngineError, ProviderError, Record};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Caller-facing knobs for one generation call.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ordered fallback list tried after the primary model fails.
    pub fallback_models: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 2048,
            fallback_models: Vec::new(),
        }
    }
}

/// One failed (or skipped) attempt in a fallback chain.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub model: String,
    pub provider: String,
    pub error: String,
    /// Skipped attempts (unreachable local providers) are not hard failures.
    pub skipped: bool,
}

/// Successful outcome of a fallback chain, with the audit trail of what was
/// tried before the winning model.
#[derive(Debug, Clone)]
pub struct FallbackResult<T> {
    pub value: T,
    pub model: String,
    pub provider: String,
    pub attempts: Vec<Attempt>,
}

/// Unified entry point for model calls: resolves names through the catalog,
/// dispatches to the right provider adapter, and walks the fallback chain.
pub struct ModelSelector {
    catalog: ModelCatalog,
    providers: HashMap<String, Arc<dyn ModelProvider>>,
}

impl ModelSelector {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self {
            catalog,
            providers: HashMap::new(),
        }
    }

    /// Selector wired with the builtin catalog and real provider adapters,
    /// keyed from environment variables.
    pub fn with_default_providers() -> Self {
        use crate::providers::{GeminiProvider, OllamaProvider, OpenAiProvider};

        let mut selector = Self::new(ModelCatalog::builtin());
        selector.register_provider(Arc::new(GeminiProvider::from_env()));
        selector.register_provider(Arc::new(OpenAiProvider::from_env()));
        selector.register_provider(Arc::new(OpenAiProvider::deepinfra_from_env()));
        selector.register_provider(Arc::new(OllamaProvider::from_env()));
        selector
    }

    pub fn register_provider(&mut self, provider: Arc<dyn ModelProvider>) {
        info!(provider = provider.id(), "Registering model provider");
        self.providers.insert(provider.id().to_string(), provider);
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    fn chain<'a>(&self, opts: &'a GenerateOptions) -> Vec<Option<&'a str>> {
        let mut chain: Vec<Option<&str>> = vec![opts.model.as_deref()];
        chain.extend(opts.fallback_models.iter().map(|m| Some(m.as_str())));
        chain
    }

    fn request_for(
        &self,
        model: Option<&str>,
        prompt: &str,
        opts: &GenerateOptions,
    ) -> Result<(Arc<dyn ModelProvider>, GenerateRequest), ProviderError> {
        let (_canonical, descriptor) = self
            .catalog
            .resolve(model)
            .ok_or_else(|| ProviderError::UnknownModel(model.unwrap_or("(default)").to_string()))?;
        let provider = self
            .providers
            .get(&descriptor.provider)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(descriptor.provider.clone()))?;
        let req = GenerateRequest {
            model: descriptor.name.clone(),
            prompt: prompt.to_string(),
            system_prompt: opts.system_prompt.clone(),
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
            json_mode: descriptor.supports_json_mode,
        };
        Ok((provider, req))
    }

    /// Generate text, trying the primary model then each fallback in turn.
    pub async fn generate(
        &self,
        prompt: &str,
        opts: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        self.generate_with_attempts(prompt, opts)
            .await
            .map(|r| r.value)
    }

    /// Like [`generate`](Self::generate), keeping the audit trail of failed
    /// attempts.
    pub async fn generate_with_attempts(
        &self,
        prompt: &str,
        opts: &GenerateOptions,
    ) -> Result<FallbackResult<String>, ProviderError> {
        let mut attempts = Vec::new();

        for model in self.chain(opts) {
            let (provider, req) = match self.request_for(model, prompt, opts) {
                Ok(pair) => pair,
                Err(e) => {
                    attempts.push(Attempt {
                        model: model.unwrap_or_default().to_string(),
                        provider: String::new(),
                        error: e.to_string(),
                        skipped: false,
                    });
                    continue;
                }
            };

            if provider.is_local() && !provider.is_available().await {
                info!(provider = provider.id(), "Local provider unreachable, skipping");
                attempts.push(Attempt {
                    model: req.model,
                    provider: provider.id().to_string(),
                    error: "unreachable".to_string(),
                    skipped: true,
                });
                continue;
            }

            match provider.generate(&req).await {
                Ok(text) => {
                    return Ok(FallbackResult {
                        value: text,
                        model: req.model,
                        provider: provider.id().to_string(),
                        attempts,
                    })
                }
                Err(e) => {
                    warn!(provider = provider.id(), model = %req.model, error = %e, "Provider attempt failed");
                    attempts.push(Attempt {
                        model: req.model,
                        provider: provider.id().to_string(),
                        error: e.to_string(),
                        skipped: false,
                    });
                }
            }
        }

        Err(Self::exhausted(attempts))
    }

    /// Generate a schema-validated record. Provider failures walk the
    /// fallback chain; a structured-output parse failure surfaces
    /// immediately, it is not retried on other providers.
    pub async fn generate_structured(
        &self,
        prompt: &str,
        schema: &RecordSchema,
        opts: &GenerateOptions,
    ) -> Result<Record, EngineError> {
        self.generate_structured_with_attempts(prompt, schema, opts)
            .await
            .map(|r| r.value)
    }

    pub async fn generate_structured_with_attempts(
        &self,
        prompt: &str,
        schema: &RecordSchema,
        opts: &GenerateOptions,
    ) -> Result<FallbackResult<Record>, EngineError> {
        let mut attempts = Vec::new();

        for model in self.chain(opts) {
            let (provider, req) = match self.request_for(model, prompt, opts) {
                Ok(pair) => pair,
                Err(e) => {
                    attempts.push(Attempt {
                        model: model.unwrap_or_default().to_string(),
                        provider: String::new(),
                        error: e.to_string(),
                        skipped: false,
                    });
                    continue;
                }
            };

            if provider.is_local() && !provider.is_available().await {
                info!(provider = provider.id(), "Local provider unreachable, skipping");
                attempts.push(Attempt {
                    model: req.model,
                    provider: provider.id().to_string(),
                    error: "unreachable".to_string(),
                    skipped: true,
                });
                continue;
            }

            match provider.generate_structured(&req, schema).await {
                Ok(record) => {
                    return Ok(FallbackResult {
                        value: record,
                        model: req.model,
                        provider: provider.id().to_string(),
                        attempts,
                    })
                }
                Err(EngineError::Provider(e)) => {
                    warn!(provider = provider.id(), model = %req.model, error = %e, "Provider attempt failed");
                    attempts.push(Attempt {
                        model: req.model,
                        provider: provider.id().to_string(),
                        error: e.to_string(),
                        skipped: false,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Err(Self::exhausted(attempts).into())
    }

    fn exhausted(attempts: Vec<Attempt>) -> ProviderError {
        let hard_failures = attempts.iter().filter(|a| !a.skipped).count();
        let last = attempts
            .iter()
            .rev()
            .find(|a| !a.skipped)
            .or_else(|| attempts.last())
            .map(|a| a.error.clone())
            .unwrap_or_else(|| "no providers configured".to_string());
        ProviderError::AllProvidersFailed {
            attempts: hard_failures,
            last,
        }
    }
}
