//! Service routes: everything not matched elsewhere goes to the route-table dispatcher.
//! Paths are resolved at request time against the table built at registration, so there is
//! one axum route regardless of how many services are registered.

use crate::handlers::dispatch;
use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

pub fn service_routes(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
