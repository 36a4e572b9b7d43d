//! Single entry point for every service route: match (verb, path) in the route table and invoke its handle.

use crate::config::HttpVerb;
use crate::error::AppError;
use crate::extractors::CallContext;
use crate::response::Reply;
use crate::service::Invocation;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, Uri},
};
use serde_json::Value;
use std::collections::HashMap;

pub async fn dispatch(
    State(state): State<AppState>,
    context: CallContext,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Reply, AppError> {
    let not_found = || AppError::RouteNotFound {
        verb: method.to_string(),
        path: uri.path().to_string(),
    };
    let verb = HttpVerb::from_method(&method).ok_or_else(not_found)?;
    let path = strip_route_prefix(uri.path(), state.route_prefix()).ok_or_else(not_found)?;
    let matched = state.routes.lookup(verb, path)?;
    tracing::debug!(
        verb = %verb,
        path = %path,
        service = %matched.entry.service,
        method = %matched.entry.descriptor.logical_name,
        "dispatch"
    );

    let body = parse_body(&body)?;
    let call = Invocation {
        context,
        id: matched.id,
        query,
        body,
    };
    (matched.entry.handle())(call).await
}

fn parse_body(bytes: &Bytes) -> Result<Option<Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("body must be valid JSON: {}", e)))
}

/// "/api/app/book/1" under "/api/app" -> "/book/1". None when the path is outside the prefix.
pub fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
