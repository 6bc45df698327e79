use anyhow::Result;
use clap::{Parser, Subcommand};
use loomcore::{ExecutionState, InMemoryAgentLibrary, MemoryStore, NodeInstance, WorkflowGraph};
use loomengine::{Engine, NodeRegistry, Scheduler};
use loomllm::ModelSelector;
use loomrunners::{builtin_builders, default_catalog, default_runners, CodeNodeTable};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "loom")]
#[command(about = "Graphloom workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Input data as a JSON object, injected into entry nodes
        #[arg(short, long)]
        input: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file without executing it
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

fn build_registry() -> NodeRegistry {
    let agents = Arc::new(InMemoryAgentLibrary::new());
    let mut registry = NodeRegistry::new(agents);
    for (module, builder) in builtin_builders() {
        registry.register_builder(module, builder);
    }
    registry.scan(&default_catalog());
    registry
}

fn build_engine() -> Engine {
    let agents = Arc::new(InMemoryAgentLibrary::new());
    let mut registry = NodeRegistry::new(agents.clone());
    for (module, builder) in builtin_builders() {
        registry.register_builder(module, builder);
    }
    registry.scan(&default_catalog());

    let selector = Arc::new(ModelSelector::with_default_providers());
    let runners = default_runners(
        selector,
        agents,
        MemoryStore::new(),
        Arc::new(CodeNodeTable::with_builtins()),
    );
    Engine::new(Arc::new(registry), runners)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            verbose,
        } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_workflow(file, input).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

async fn run_workflow(file: PathBuf, input: Option<String>) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let raw = std::fs::read_to_string(&file)?;
    let mut graph: WorkflowGraph = serde_json::from_str(&raw)?;

    println!(
        "📋 Workflow: {}",
        graph.id.as_deref().unwrap_or("(unnamed)")
    );
    println!("   Nodes: {}", graph.nodes.len());
    println!("   Edges: {}", graph.edges.len());
    println!();

    // CLI inputs land as literals on the entry nodes (no incoming edges).
    if let Some(input_str) = input {
        let parsed: serde_json::Value = serde_json::from_str(&input_str)?;
        let object = parsed
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("Input must be a JSON object"))?;
        let entry_ids: Vec<String> = graph
            .nodes
            .iter()
            .filter(|n| !graph.edges.iter().any(|e| e.target == n.id))
            .map(|n| n.id.clone())
            .collect();
        for node in graph.nodes.iter_mut() {
            if entry_ids.contains(&node.id) {
                for (key, value) in object {
                    node.data.literals.insert(key.clone(), value.clone());
                }
            }
        }
    }

    let engine = build_engine();
    let snapshot = engine.execute(graph).await;

    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", snapshot.execution_id);
    match snapshot.state {
        ExecutionState::Completed => println!("   ✨ Completed successfully"),
        ExecutionState::Failed => {
            println!(
                "   💥 Failed: {}",
                snapshot.error.as_deref().unwrap_or("unknown error")
            )
        }
        ExecutionState::Running => println!("   Still running"),
    }

    if !snapshot.outputs.is_empty() {
        println!();
        println!("📤 Outputs:");
        for (node_id, output) in &snapshot.outputs {
            println!("   Node {}:", node_id);
            for (key, value) in output {
                println!("     {}: {}", key, value);
            }
        }
    }

    if snapshot.state == ExecutionState::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let raw = std::fs::read_to_string(&file)?;
    let graph: WorkflowGraph = serde_json::from_str(&raw)?;

    let order = Scheduler::validate_and_order(&graph)?;

    let registry = build_registry();
    for node in &graph.nodes {
        if registry.resolve(&node.type_id).is_err() {
            anyhow::bail!("Unknown node type: {}", node.type_id);
        }
    }

    println!("✅ Workflow is valid:");
    println!("   Nodes: {}", graph.nodes.len());
    println!("   Edges: {}", graph.edges.len());
    println!("   Execution order: {}", order.join(" -> "));
    Ok(())
}

fn list_nodes() {
    println!("📦 Available Node Types:");
    println!();

    let registry = build_registry();
    for node in registry.list_nodes() {
        println!("  • {} ({:?})", node.id, node.category);
        if !node.description.is_empty() {
            println!("    {}", node.description);
        }
    }
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let mut graph = WorkflowGraph::new("Example Sentiment Workflow");
    graph
        .add_node(
            NodeInstance::new("start", "manual_trigger")
                .with_label("Start")
                .with_literal("input", "I really enjoyed this release"),
        )
        .add_node(
            NodeInstance::new("classify", "ai_agent")
                .with_label("Classify Sentiment")
                .with_config("prompt", "Classify the sentiment of the user's message: {input}")
                .with_config(
                    "schema",
                    json!({
                        "properties": {
                            "sentiment": {"type": "string"},
                            "confidence": {"type": "number"}
                        },
                        "required": ["sentiment"]
                    }),
                ),
        )
        .add_node(
            NodeInstance::new("gate", "condition")
                .with_label("Positive?")
                .with_config("condition", "sentiment == positive"),
        );
    graph.connect("start", "classify").connect("classify", "gate");

    let json = serde_json::to_string_pretty(&graph)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  loom run --file {} --input '{{\"input\": \"your text here\"}}'",
        output.display()
    );
    Ok(())
}
