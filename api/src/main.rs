use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use engine::prelude::*;
use shared::{get_redis_client, Config};

#[derive(Clone)]
struct AppState {
    access: Arc<AccessControlService>,
    orchestrator: Arc<ExecutionOrchestrator>,
    registry: Arc<StrategyRegistry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting AlphaVault API server...");

    let config = Config::from_env()?;

    let store: Arc<dyn OwnershipStore> = match std::env::var("OWNERSHIP_STORE").as_deref() {
        Ok("redis") => {
            info!("Using Redis ownership store at {}", config.redis_url);
            let client = Arc::new(get_redis_client(&config.redis_url)?);
            Arc::new(RedisOwnershipStore::new(client))
        }
        _ => Arc::new(MemoryOwnershipStore::new()),
    };

    let access = Arc::new(AccessControlService::new(
        config.executor_address.clone(),
        store,
    ));
    access
        .initialize(SignerContext::new(
            config.signer_address.clone(),
            config.protector_secret.clone(),
        ))
        .await?;

    let registry = Arc::new(StrategyRegistry::new());

    let executor: Arc<dyn RemoteExecutor> = match &config.executor_api_token {
        Some(token) => {
            info!("Submitting tasks to executor at {}", config.executor_api_url);
            Arc::new(ExecutorApiClient::new(
                config.executor_api_url.clone(),
                token.clone(),
            ))
        }
        None => Arc::new(SimulatedExecutor::new()),
    };

    let orchestrator = Arc::new(ExecutionOrchestrator::new(
        OrchestratorConfig {
            executor_address: config.executor_address.clone(),
        },
        registry.clone(),
        executor,
    ));
    orchestrator.initialize(access.clone()).await?;

    let state = AppState {
        access,
        orchestrator,
        registry,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/strategies", get(list_strategies))
        .route("/api/strategies/:id/purchase", post(purchase_strategy))
        .route("/api/ownership/:address", get(owned_strategies))
        .route(
            "/api/ownership/:address/:strategy_id",
            get(strategy_ownership),
        )
        .route("/api/execute", post(execute_strategy))
        .route("/api/executions/:task_id", get(execution_status))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.api_bind).await?;
    info!("API server listening on http://{}", config.api_bind);

    axum::serve(listener, app).await?;

    Ok(())
}

fn error_response(err: MarketError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        MarketError::NotInitialized(_)
        | MarketError::ServiceNotReady
        | MarketError::DependencyNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
        MarketError::Config(_) | MarketError::ImmutableConfig => StatusCode::CONFLICT,
        MarketError::AccessDenied(_) => StatusCode::FORBIDDEN,
        MarketError::NotFound(_) => StatusCode::NOT_FOUND,
        MarketError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MarketError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_strategies(State(state): State<AppState>) -> Json<Value> {
    let mut ids = state.registry.available_ids();
    ids.sort();

    let mut strategies = Vec::new();
    for id in ids {
        if let Ok(definition) = state.registry.create(&id) {
            let s = definition.strategy();
            strategies.push(json!({
                "id": s.id,
                "name": s.name,
                "description": s.description,
                "risk": s.risk,
                "apr_range": s.apr_range,
                "price": s.price,
                "operations": s.operations.len(),
            }));
        }
    }
    Json(json!({ "strategies": strategies }))
}

#[derive(Deserialize)]
struct PurchaseRequest {
    buyer_address: String,
}

async fn purchase_strategy(
    State(state): State<AppState>,
    Path(strategy_id): Path<String>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<PurchaseOutcome>, (StatusCode, Json<Value>)> {
    let definition = state.registry.create(&strategy_id).map_err(error_response)?;
    let outcome = state
        .access
        .purchase_strategy(&definition, &request.buyer_address)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

async fn owned_strategies(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<Value> {
    let strategies = state.access.get_user_owned_strategies(&address).await;
    Json(json!({ "strategies": strategies }))
}

async fn strategy_ownership(
    State(state): State<AppState>,
    Path((address, strategy_id)): Path<(String, String)>,
) -> Json<OwnershipStatus> {
    let status = state
        .access
        .check_strategy_ownership(&strategy_id, &address)
        .await;
    Json(status)
}

#[derive(Deserialize)]
struct ExecuteRequest {
    strategy_id: String,
    owner_address: String,
    config: StrategyConfig,
}

async fn execute_strategy(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteOutcome>, (StatusCode, Json<Value>)> {
    let outcome = state
        .orchestrator
        .execute_strategy(
            &request.strategy_id,
            &request.owner_address,
            &request.config,
        )
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

async fn execution_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Json<StatusReport> {
    let report = state.orchestrator.get_execution_status(&task_id).await;
    Json(report)
}
