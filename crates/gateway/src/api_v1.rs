//! HTTP API v1: the agent tool surface.
//!
//! - `GET  /v1/tools`          list available tools
//! - `POST /v1/tools/{name}`   execute a tool

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use debie_core::error::ToolError;
use debie_core::tool::{ToolCall, ToolDefinition, ToolResult};

use crate::{ErrorDetail, SharedState};

pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(execute_tool_handler))
        .with_state(state)
}

#[derive(Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDefinition>,
    pub count: usize,
}

async fn list_tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    let tools = state.tools.definitions();
    let count = tools.len();
    Json(ToolListResponse { tools, count })
}

fn tool_error_status(error: &ToolError) -> StatusCode {
    match error {
        ToolError::NotFound(_) => StatusCode::NOT_FOUND,
        ToolError::InvalidArguments(_) => StatusCode::BAD_REQUEST,
        ToolError::ExecutionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn execute_tool_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(arguments): Json<serde_json::Value>,
) -> Result<Json<ToolResult>, (StatusCode, Json<ErrorDetail>)> {
    let call = ToolCall {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        arguments,
    };

    match state.tools.execute(&call).await {
        Ok(result) => {
            info!(tool = %call.name, call_id = %call.id, success = result.success, "Tool executed");
            Ok(Json(result))
        }
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool call rejected");
            Err((tool_error_status(&e), Json(ErrorDetail { detail: e.to_string() })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{body_json, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use debie_core::profile::UserProfile;
    use debie_store::InMemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn list_tools() {
        let app = v1_router(test_state(Arc::new(InMemoryStore::new())));

        let req = Request::builder().uri("/tools").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: ToolListResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(json.count, 12);
        assert!(json.tools.iter().any(|t| t.name == "get_glucose_readings"));
        assert!(json.tools.iter().any(|t| t.name == "enrich_with_user_context"));
    }

    #[tokio::test]
    async fn unknown_tool_is_404() {
        let app = v1_router(test_state(Arc::new(InMemoryStore::new())));
        let response = app.oneshot(post_json("/tools/nope", serde_json::json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_arguments_are_400() {
        let app = v1_router(test_state(Arc::new(InMemoryStore::new())));
        let response = app
            .oneshot(post_json(
                "/tools/get_glucose_readings",
                serde_json::json!({"user_id": "not-a-uuid"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["detail"].as_str().unwrap().contains("Invalid tool arguments"));
    }

    #[tokio::test]
    async fn out_of_range_window_is_400() {
        let app = v1_router(test_state(Arc::new(InMemoryStore::new())));
        let response = app
            .oneshot(post_json(
                "/tools/get_glucose_readings",
                serde_json::json!({"user_id": uuid::Uuid::new_v4().to_string(), "days": 100_000_000}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["detail"].as_str().unwrap().contains("date range"));
    }

    #[tokio::test]
    async fn executes_user_info() {
        let store = Arc::new(InMemoryStore::new());
        let user = uuid::Uuid::new_v4();
        let mut profile = UserProfile::new(user);
        profile.username = Some("river".into());
        store.put_profile(profile).await;
        let app = v1_router(test_state(store));

        let response = app
            .oneshot(post_json("/tools/get_user_info", serde_json::json!({"user_id": user.to_string()})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(!json["call_id"].as_str().unwrap().is_empty());
        assert_eq!(json["data"]["data"]["username"], "river");
    }
}
