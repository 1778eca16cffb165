//! HTTP gateway for Debie.
//!
//! - `GET  /status`            database liveness probe
//! - `GET  /v1/tools`          list agent tools
//! - `POST /v1/tools/{name}`   execute one tool with a JSON argument object
//!
//! Built on Axum.

pub mod api_v1;
pub mod bootstrap;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use debie_core::store::HealthStore;
use debie_core::tool::ToolRegistry;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub store: Arc<dyn HealthStore>,
    pub tools: Arc<ToolRegistry>,
    /// Connection target with the password masked, for error details.
    pub database_target: String,
    pub ping_timeout: Duration,
}

pub type SharedState = Arc<GatewayState>;

/// Build the router with every route. CORS is optional.
pub fn build_router(state: SharedState, cors: bool) -> Router {
    let router = Router::new()
        .route("/status", get(status_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state));

    let router = if cors { router.layer(CorsLayer::permissive()) } else { router };
    router.layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: debie_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let runtime = bootstrap::build_runtime(&config).await?;

    let state = Arc::new(GatewayState {
        store: runtime.store,
        tools: runtime.tools,
        database_target: config.database.redacted_url(),
        ping_timeout: config.upstream.timeout(),
    });
    let app = build_router(state, config.gateway.cors);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    api_health: &'static str,
    database_connection: &'static str,
}

#[derive(Serialize)]
pub(crate) struct ErrorDetail {
    pub(crate) detail: String,
}

async fn status_handler(
    State(state): State<SharedState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorDetail>)> {
    let outcome = match tokio::time::timeout(state.ping_timeout, state.store.ping()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("ping timed out after {}s", state.ping_timeout.as_secs_f64())),
    };

    match outcome {
        Ok(()) => Ok(Json(StatusResponse {
            status: "ok",
            api_health: "healthy",
            database_connection: "successful",
        })),
        Err(reason) => {
            warn!(store = state.store.name(), error = %reason, "Status check failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorDetail {
                    detail: format!(
                        "Database connection failed: {reason} ({})",
                        state.database_target
                    ),
                }),
            ))
        }
    }
}
