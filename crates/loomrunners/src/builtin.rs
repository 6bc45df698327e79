use loomcore::{Catalog, CatalogEntry, ConfigField, NodeCategory, NodeDefinition, RunnerKind};

fn field(name: &str, field_type: &str, label: &str, required: bool) -> ConfigField {
    ConfigField {
        name: name.to_string(),
        field_type: field_type.to_string(),
        label: label.to_string(),
        description: None,
        required,
        default: None,
    }
}

fn manual_trigger() -> NodeDefinition {
    NodeDefinition {
        id: "manual_trigger".to_string(),
        name: "Manual Trigger".to_string(),
        category: NodeCategory::Trigger,
        description: "Starts a workflow on demand, passing its inline data downstream".to_string(),
        runner: RunnerKind::Trigger,
        config_schema: Vec::new(),
        module: None,
    }
}

fn condition() -> NodeDefinition {
    NodeDefinition {
        id: "condition".to_string(),
        name: "Condition".to_string(),
        category: NodeCategory::Logic,
        description: "Evaluates a condition over its inputs and emits a branch decision"
            .to_string(),
        runner: RunnerKind::Logic,
        config_schema: vec![field("condition", "string", "Condition", true)],
        module: None,
    }
}

fn http_request() -> NodeDefinition {
    NodeDefinition {
        id: "http_request".to_string(),
        name: "HTTP Request".to_string(),
        category: NodeCategory::Connector,
        description: "Fetches a URL and emits the response body".to_string(),
        runner: RunnerKind::Connector,
        config_schema: vec![
            field("operation", "string", "Operation", false),
            field("url", "string", "URL", true),
            field("method", "string", "Method", false),
        ],
        module: None,
    }
}

fn store_writer() -> NodeDefinition {
    NodeDefinition {
        id: "store_writer".to_string(),
        name: "Store Writer".to_string(),
        category: NodeCategory::Connector,
        description: "Upserts its inputs into a document collection".to_string(),
        runner: RunnerKind::Connector,
        config_schema: vec![
            field("operation", "string", "Operation", false),
            field("collection", "string", "Collection", false),
            field("id", "string", "Document ID", false),
        ],
        module: None,
    }
}

fn ai_agent() -> NodeDefinition {
    NodeDefinition {
        id: "ai_agent".to_string(),
        name: "AI Agent".to_string(),
        category: NodeCategory::Agent,
        description: "Calls a language model with a prompt template, optionally coercing the reply into a structured record".to_string(),
        runner: RunnerKind::Agent,
        config_schema: vec![
            field("agent", "string", "Agent ID", false),
            field("prompt", "string", "Prompt Template", false),
            field("schema", "object", "Output Schema", false),
            field("model", "string", "Model", false),
        ],
        module: None,
    }
}

fn pattern_filter() -> NodeDefinition {
    NodeDefinition {
        id: "pattern_filter".to_string(),
        name: "Pattern Filter".to_string(),
        category: NodeCategory::Logic,
        description: "Tests an input field against a regular expression".to_string(),
        runner: RunnerKind::Code,
        config_schema: vec![
            field("pattern", "string", "Pattern", true),
            field("field", "string", "Input Field", false),
        ],
        module: Some("nodes.pattern_filter".to_string()),
    }
}

fn structured_output() -> NodeDefinition {
    NodeDefinition {
        id: "structured_output".to_string(),
        name: "Structured Output".to_string(),
        category: NodeCategory::Logic,
        description: "Parses upstream model text into a schema-validated record".to_string(),
        runner: RunnerKind::Code,
        config_schema: vec![
            field("schema", "object", "Output Schema", true),
            field("strict", "boolean", "Strict", false),
        ],
        module: Some("nodes.structured_output".to_string()),
    }
}

/// All built-in node definitions, keyed by the implementation reference the
/// catalog uses to name them.
pub fn builtin_builders() -> Vec<(&'static str, fn() -> NodeDefinition)> {
    vec![
        ("nodes.manual_trigger", manual_trigger as fn() -> NodeDefinition),
        ("nodes.condition", condition),
        ("nodes.http_request", http_request),
        ("nodes.store_writer", store_writer),
        ("nodes.ai_agent", ai_agent),
        ("nodes.pattern_filter", pattern_filter),
        ("nodes.structured_output", structured_output),
    ]
}

/// The catalog shipped with the engine: one entry per built-in node type.
pub fn default_catalog() -> Catalog {
    let entries = [
        ("manual_trigger", "nodes.manual_trigger"),
        ("condition", "nodes.condition"),
        ("http_request", "nodes.http_request"),
        ("store_writer", "nodes.store_writer"),
        ("ai_agent", "nodes.ai_agent"),
        ("pattern_filter", "nodes.pattern_filter"),
        ("structured_output", "nodes.structured_output"),
    ];
    Catalog {
        nodes: entries
            .iter()
            .map(|(id, module)| CatalogEntry {
                id: id.to_string(),
                module: Some(module.to_string()),
                path: None,
                category: None,
                runner: None,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_catalog_entry_has_a_builder() {
        let builders = builtin_builders();
        for entry in default_catalog().nodes {
            let module = entry.module.expect("builtin entries are module-backed");
            assert!(
                builders.iter().any(|(m, _)| *m == module),
                "missing builder for {module}"
            );
        }
    }

    #[test]
    fn code_backed_definitions_name_their_module() {
        assert_eq!(
            pattern_filter().module.as_deref(),
            Some("nodes.pattern_filter")
        );
        assert_eq!(pattern_filter().runner, RunnerKind::Code);
        assert_eq!(
            structured_output().module.as_deref(),
            Some("nodes.structured_output")
        );
    }

    #[test]
    fn schemas_serialize_for_transport() {
        let value = serde_json::to_value(ai_agent()).unwrap();
        assert_eq!(value["category"], json!("agent"));
        assert_eq!(value["runner"], json!("agent"));
    }
}
