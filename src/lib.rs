//! Convention-based CRUD services: any entity + DTO becomes a uniform networked CRUD contract,
//! with routes and client proxies derived from declared service names.

pub mod auth;
pub mod case;
pub mod config;
pub mod convention;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod mapping;
pub mod proxy;
pub mod registry;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;

pub use auth::{AllowAll, AuthDecision, Authorizer, PermissionAuthorizer};
pub use config::{ApiDefinition, Capability, HttpVerb, MethodDescriptor, ServiceDescriptor, Settings, ValidationRule};
pub use convention::{resolve_method_name, resolve_name, resolve_service};
pub use dto::{PagedAndSortedRequest, PagedResult};
pub use error::{AppError, ConfigError, ErrorKind, FieldViolation, ProxyError};
pub use extractors::CallContext;
pub use mapping::{Entity, EntityDto, EntityKey};
pub use proxy::{HttpTransport, ProxyArgs, ProxyClient, RouterTransport, ServiceProxy, Transport};
pub use registry::{Application, ServiceRegistry};
pub use repository::{ensure_database_exists, InMemoryRepository, ListFilter, PgDocumentRepository, Repository};
pub use response::Reply;
pub use routes::{common_routes, service_routes, RouteTable};
pub use service::{CrudAppService, Invocation, ServiceDefinition};
pub use state::AppState;
