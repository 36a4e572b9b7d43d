//! Shared application state for all routes. Built once at startup and never mutated.

use crate::config::ApiDefinition;
use crate::routes::RouteTable;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    /// Also carries the route prefix service paths are mounted under.
    pub api_definition: Arc<ApiDefinition>,
}

impl AppState {
    pub fn route_prefix(&self) -> &str {
        &self.api_definition.route_prefix
    }
}
