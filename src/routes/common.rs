//! Common routes served outside the route prefix: liveness, readiness, version, API definition.

use crate::handlers::api_definition;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routes: Option<usize>,
}

async fn health() -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
        services: None,
        routes: None,
    })
}

/// 503 until at least one route is registered.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<StatusBody>) {
    let routes = state.routes.len();
    let status = if routes == 0 { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::OK };
    let body = StatusBody {
        status: if routes == 0 { "empty" } else { "ok" },
        services: Some(state.api_definition.services.len()),
        routes: Some(routes),
    };
    (status, Json(body))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready, GET /version, GET /api-definition.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/api-definition", get(api_definition))
        .with_state(state)
}
