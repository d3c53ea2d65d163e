use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use policyglass_common::{PolicyFilters, PolicyGlassError};
use policyglass_core::{policy_detail, run_orchestrator, Deps};

pub fn build_router(deps: Arc<Deps>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/policy/{bill_id}", get(policy))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(deps)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn chat(State(deps): State<Arc<Deps>>, Json(body): Json<Value>) -> Response {
    let Some(message) = body.get("message").and_then(Value::as_str) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing message"})),
        )
            .into_response();
    };
    let filters: Option<PolicyFilters> = body
        .get("filters")
        .cloned()
        .and_then(|raw| serde_json::from_value(raw).ok());

    match run_orchestrator(&deps, message, filters).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn policy(State(deps): State<Arc<Deps>>, Path(bill_id): Path<String>) -> Response {
    if bill_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing billId"})),
        )
            .into_response();
    }

    match policy_detail(&deps, &bill_id).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PolicyGlassError) -> Response {
    let status = if err.is_structural() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(error = %err, "Request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({"error": err.to_string()}))).into_response()
}
