use actix_cors::Cors;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult};
use loomcore::{InMemoryAgentLibrary, MemoryStore, WorkflowGraph};
use loomengine::{Engine, NodeRegistry};
use loomllm::ModelSelector;
use loomrunners::{builtin_builders, default_catalog, default_runners, CodeNodeTable};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
struct AppState {
    engine: Arc<Engine>,
}

/// Response for workflow submission
#[derive(Debug, Serialize)]
struct SubmitResponse {
    execution_id: String,
    status: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "graphloom"
    }))
}

/// List available node types
#[get("/api/nodes")]
async fn list_node_types(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(HttpResponse::Ok().json(data.engine.list_node_types()))
}

/// Submit a workflow for background execution
#[post("/api/workflows/execute")]
async fn execute_workflow(
    data: web::Data<AppState>,
    graph: web::Json<WorkflowGraph>,
) -> ActixResult<impl Responder> {
    let graph = graph.into_inner();
    info!(workflow_id = ?graph.id, nodes = graph.nodes.len(), "Submitting workflow");

    let execution_id = data.engine.submit(graph).await;
    Ok(HttpResponse::Accepted().json(SubmitResponse {
        execution_id,
        status: "started",
    }))
}

/// Poll the state of a submitted execution
#[get("/api/execution/{id}/status")]
async fn execution_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let execution_id = path.into_inner();
    match data.engine.status(&execution_id).await {
        Some(snapshot) => Ok(HttpResponse::Ok().json(snapshot)),
        None => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Execution {} not found", execution_id),
        })),
    }
}

/// List recent route traces, newest first
#[get("/api/traces")]
async fn list_traces(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    Ok(HttpResponse::Ok().json(data.engine.tracer().list_recent().await))
}

/// Fetch the steps recorded under one correlation id
#[get("/api/traces/{trace_id}")]
async fn get_trace(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<impl Responder> {
    let trace_id = path.into_inner();
    match data.engine.tracer().get(&trace_id).await {
        Some(steps) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "trace_id": trace_id,
            "steps": steps,
        }))),
        None => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: format!("Trace {} not found", trace_id),
        })),
    }
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

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("🚀 Starting Graphloom Server");

    let engine = build_engine();
    info!(node_types = engine.registry().node_count(), "✅ Engine initialized");

    let app_state = web::Data::new(AppState {
        engine: Arc::new(engine),
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    info!("🌐 Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .service(health_check)
            .service(list_node_types)
            .service(execute_workflow)
            .service(execution_status)
            .service(list_traces)
            .service(get_trace)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
