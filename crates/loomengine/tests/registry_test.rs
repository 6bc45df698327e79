use loomcore::{
    AgentDefinition, Catalog, CatalogEntry, InMemoryAgentLibrary, NodeCategory, NodeDefinition,
    RegistryError, Record, RunnerKind,
};
use loomengine::NodeRegistry;
use std::sync::Arc;

fn widget_definition() -> NodeDefinition {
    NodeDefinition {
        id: "widget".to_string(),
        name: "Widget".to_string(),
        category: NodeCategory::Logic,
        description: "Test node".to_string(),
        runner: RunnerKind::Logic,
        config_schema: Vec::new(),
        module: None,
    }
}

fn module_entry(id: &str, module: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        module: Some(module.to_string()),
        path: None,
        category: None,
        runner: None,
    }
}

#[test]
fn bad_entries_are_skipped_not_fatal() {
    let mut registry = NodeRegistry::new(Arc::new(InMemoryAgentLibrary::new()));
    registry.register_builder("test.widget", widget_definition as fn() -> NodeDefinition);

    registry.scan(&Catalog {
        nodes: vec![
            module_entry("widget", "test.widget"),
            module_entry("broken", "test.missing_module"),
            CatalogEntry {
                id: "empty".to_string(),
                module: None,
                path: None,
                category: None,
                runner: None,
            },
        ],
    });

    assert_eq!(registry.node_count(), 1);
    assert!(registry.resolve("widget").is_ok());
    assert!(matches!(
        registry.resolve("broken"),
        Err(RegistryError::UnknownNodeType(_))
    ));
}

#[test]
fn rescan_replaces_the_node_set() {
    let mut registry = NodeRegistry::new(Arc::new(InMemoryAgentLibrary::new()));
    registry.register_builder("test.widget", widget_definition as fn() -> NodeDefinition);

    let catalog = Catalog {
        nodes: vec![
            module_entry("first", "test.widget"),
            module_entry("second", "test.widget"),
        ],
    };
    registry.scan(&catalog);
    assert_eq!(registry.node_count(), 2);

    registry.scan(&catalog);
    assert_eq!(registry.node_count(), 2);

    registry.scan(&Catalog {
        nodes: vec![module_entry("first", "test.widget")],
    });
    assert_eq!(registry.node_count(), 1);
    assert!(registry.resolve("second").is_err());
}

#[test]
fn catalog_overlays_win_over_builder_defaults() {
    let mut registry = NodeRegistry::new(Arc::new(InMemoryAgentLibrary::new()));
    registry.register_builder("test.widget", widget_definition as fn() -> NodeDefinition);

    registry.scan(&Catalog {
        nodes: vec![CatalogEntry {
            id: "renamed".to_string(),
            module: Some("test.widget".to_string()),
            path: None,
            category: Some(NodeCategory::Connector),
            runner: Some(RunnerKind::Connector),
        }],
    });

    let definition = registry.resolve("renamed").unwrap();
    assert_eq!(definition.id, "renamed");
    assert_eq!(definition.category, NodeCategory::Connector);
    assert_eq!(definition.runner, RunnerKind::Connector);
    assert_eq!(definition.module.as_deref(), Some("test.widget"));
}

#[test]
fn agent_backed_entries_resolve_through_the_library() {
    let agents = Arc::new(InMemoryAgentLibrary::new());
    agents.insert(
        "summarizer",
        AgentDefinition {
            prompt_template: "Summarize: {input}".to_string(),
            output_schema: None,
            config: Record::new(),
        },
    );

    let registry = NodeRegistry::new(agents);
    registry.scan(&Catalog {
        nodes: vec![
            CatalogEntry {
                id: "summarizer_node".to_string(),
                module: None,
                path: Some("summarizer".to_string()),
                category: None,
                runner: None,
            },
            CatalogEntry {
                id: "phantom_node".to_string(),
                module: None,
                path: Some("phantom".to_string()),
                category: None,
                runner: None,
            },
        ],
    });

    assert_eq!(registry.node_count(), 1);
    let definition = registry.resolve("summarizer_node").unwrap();
    assert_eq!(definition.category, NodeCategory::Agent);
    assert_eq!(definition.runner, RunnerKind::Agent);
}
