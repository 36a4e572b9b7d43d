//! Startup registration: definitions -> convention resolution -> validation -> route table.

use crate::config::{normalize_prefix, validate, ApiDefinition, ServiceDescriptor, Settings};
use crate::convention::resolve_service;
use crate::error::ConfigError;
use crate::routes::{common_routes, service_routes, RouteTable};
use crate::service::ServiceDefinition;
use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

#[derive(Default)]
pub struct ServiceRegistry {
    definitions: Vec<ServiceDefinition>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, definition: ServiceDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Resolve every definition and build the route table. Any conflict aborts the build;
    /// there is no partially registered state.
    pub fn build(self) -> Result<Application, ConfigError> {
        let mut descriptors = Vec::with_capacity(self.definitions.len());
        let mut bindings = Vec::new();
        for definition in self.definitions {
            let (declaration, handles) = definition.into_handles();
            let descriptor = resolve_service(&declaration)?;
            for (method, (_, handle)) in descriptor.methods.iter().zip(handles) {
                bindings.push((descriptor.service_name.clone(), method.clone(), handle));
            }
            tracing::info!(
                service = %descriptor.service_name,
                declared = %descriptor.declared_name,
                methods = descriptor.methods.len(),
                "registered service"
            );
            descriptors.push(descriptor);
        }
        validate(&descriptors)?;
        let route_table = RouteTable::build(bindings)?;
        Ok(Application {
            descriptors: Arc::new(descriptors),
            route_table: Arc::new(route_table),
        })
    }
}

/// Immutable result of registration, shared by every request worker.
#[derive(Clone)]
pub struct Application {
    pub descriptors: Arc<Vec<ServiceDescriptor>>,
    pub route_table: Arc<RouteTable>,
}

impl Application {
    pub fn api_definition(&self, route_prefix: &str) -> ApiDefinition {
        ApiDefinition {
            route_prefix: normalize_prefix(route_prefix),
            services: self.descriptors.as_ref().clone(),
        }
    }

    pub fn state(&self, settings: &Settings) -> AppState {
        AppState {
            routes: self.route_table.clone(),
            api_definition: Arc::new(self.api_definition(&settings.route_prefix)),
        }
    }

    /// Common routes plus every service route under `settings.route_prefix`.
    pub fn router(&self, settings: &Settings) -> Router {
        let state = self.state(settings);
        Router::new()
            .merge(common_routes(state.clone()))
            .merge(service_routes(state, settings.body_limit))
    }
}
