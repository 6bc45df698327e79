use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Static registry entry for one model, keyed by canonical model name.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub provider: String,
    /// Name sent to the provider (may differ from the registry key,
    /// e.g. `openai/gpt-oss-20b` on DeepInfra).
    pub name: String,
    pub supports_structured_output: bool,
    pub supports_json_mode: bool,
    pub context_window: u32,
}

impl ModelDescriptor {
    fn new(
        provider: &str,
        name: &str,
        supports_structured_output: bool,
        supports_json_mode: bool,
        context_window: u32,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            name: name.to_string(),
            supports_structured_output,
            supports_json_mode,
            context_window,
        }
    }
}

/// Lookup table over model descriptors with alias resolution.
///
/// Populated once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: HashMap<String, ModelDescriptor>,
    aliases: HashMap<String, String>,
    default_model: String,
}

impl ModelCatalog {
    pub fn new(
        models: HashMap<String, ModelDescriptor>,
        aliases: HashMap<String, String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            models,
            aliases,
            default_model: default_model.into(),
        }
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        let mut models = HashMap::new();
        for (key, descriptor) in [
            (
                "gemini-2.0-flash-exp",
                ModelDescriptor::new("gemini", "gemini-2.0-flash-exp", true, true, 1_000_000),
            ),
            (
                "gemini-2.0-flash",
                ModelDescriptor::new("gemini", "gemini-2.0-flash", true, true, 1_000_000),
            ),
            (
                "gemini-1.5-pro",
                ModelDescriptor::new("gemini", "gemini-1.5-pro", true, true, 2_000_000),
            ),
            (
                "gemini-1.5-flash",
                ModelDescriptor::new("gemini", "gemini-1.5-flash", true, true, 1_000_000),
            ),
            (
                "gpt-4o",
                ModelDescriptor::new("openai", "gpt-4o", true, true, 128_000),
            ),
            (
                "gpt-4o-mini",
                ModelDescriptor::new("openai", "gpt-4o-mini", true, true, 128_000),
            ),
            (
                "gpt-4-turbo",
                ModelDescriptor::new("openai", "gpt-4-turbo", true, true, 128_000),
            ),
            (
                "gpt-3.5-turbo",
                ModelDescriptor::new("openai", "gpt-3.5-turbo", true, true, 16_385),
            ),
            (
                "llama3.2",
                ModelDescriptor::new("ollama", "llama3.2", true, true, 128_000),
            ),
            (
                "llama3.1",
                ModelDescriptor::new("ollama", "llama3.1", true, true, 128_000),
            ),
            (
                "gemma2",
                ModelDescriptor::new("ollama", "gemma2", true, true, 8_192),
            ),
            (
                "gpt-oss-20b",
                ModelDescriptor::new("deepinfra", "openai/gpt-oss-20b", true, false, 8_192),
            ),
        ] {
            models.insert(key.to_string(), descriptor);
        }

        let aliases = [
            ("gpt4", "gpt-4o"),
            ("gpt4o", "gpt-4o"),
            ("gpt4-mini", "gpt-4o-mini"),
            ("gemini", "gemini-2.0-flash-exp"),
            ("gemini-flash", "gemini-2.0-flash"),
            ("gemini-pro", "gemini-1.5-pro"),
            ("llama", "llama3.2"),
        ]
        .into_iter()
        .map(|(a, m)| (a.to_string(), m.to_string()))
        .collect();

        Self::new(models, aliases, "gemini-2.0-flash-exp")
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn get(&self, canonical: &str) -> Option<&ModelDescriptor> {
        self.models.get(canonical)
    }

    /// Resolve a model name or alias to its canonical registry key.
    ///
    /// Resolution order: alias table, exact key, case-insensitive key. An
    /// unknown name falls back to the default model with a warning; `None`
    /// only when the catalog cannot supply that default either (an alias
    /// pointing at a missing entry, or a default absent from the table).
    pub fn resolve(&self, model: Option<&str>) -> Option<(String, &ModelDescriptor)> {
        let requested = match model {
            Some(m) if !m.is_empty() => m,
            _ => &self.default_model,
        };

        if let Some(canonical) = self.aliases.get(requested) {
            return self
                .models
                .get(canonical)
                .map(|d| (canonical.clone(), d));
        }
        if let Some(descriptor) = self.models.get(requested) {
            return Some((requested.to_string(), descriptor));
        }

        let lower = requested.to_lowercase();
        if let Some(key) = self.models.keys().find(|k| k.to_lowercase() == lower) {
            return Some((key.clone(), &self.models[key]));
        }

        warn!(model = requested, default = %self.default_model, "Model not found, using default");
        self.models
            .get(&self.default_model)
            .map(|d| (self.default_model.clone(), d))
    }

    pub fn list(&self) -> &HashMap<String, ModelDescriptor> {
        &self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_then_exact_then_case_insensitive_then_default() {
        let catalog = ModelCatalog::builtin();

        let (name, desc) = catalog.resolve(Some("gemini-pro")).unwrap();
        assert_eq!(name, "gemini-1.5-pro");
        assert_eq!(desc.provider, "gemini");

        let (name, _) = catalog.resolve(Some("gpt-4o")).unwrap();
        assert_eq!(name, "gpt-4o");

        let (name, _) = catalog.resolve(Some("GPT-4O")).unwrap();
        assert_eq!(name, "gpt-4o");

        let (name, _) = catalog.resolve(Some("definitely-not-a-model")).unwrap();
        assert_eq!(name, catalog.default_model());

        let (name, _) = catalog.resolve(None).unwrap();
        assert_eq!(name, catalog.default_model());
    }

    #[test]
    fn deepinfra_key_differs_from_wire_name() {
        let catalog = ModelCatalog::builtin();
        let (_, desc) = catalog.resolve(Some("gpt-oss-20b")).unwrap();
        assert_eq!(desc.name, "openai/gpt-oss-20b");
        assert!(!desc.supports_json_mode);
    }

    #[test]
    fn missing_default_resolves_to_none_instead_of_panicking() {
        let mut models = HashMap::new();
        models.insert(
            "real".to_string(),
            ModelDescriptor::new("p1", "real", false, false, 8_192),
        );
        let catalog = ModelCatalog::new(models, HashMap::new(), "ghost");

        assert!(catalog.resolve(Some("unlisted")).is_none());
        assert!(catalog.resolve(None).is_none());
        assert!(catalog.resolve(Some("real")).is_some());

        let empty = ModelCatalog::new(HashMap::new(), HashMap::new(), "anything");
        assert!(empty.resolve(None).is_none());
    }
}
