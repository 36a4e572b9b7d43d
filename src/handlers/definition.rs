//! Serves the resolved service descriptors so remote callers can generate proxies.

use crate::config::ApiDefinition;
use crate::state::AppState;
use axum::{extract::State, Json};

pub async fn api_definition(State(state): State<AppState>) -> Json<ApiDefinition> {
    Json(state.api_definition.as_ref().clone())
}
