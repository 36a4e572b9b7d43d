//! CrudAppService: generic CRUD over any entity/DTO pair, and the definitions that expose it.

mod crud;
mod definition;
mod validation;
pub use crud::CrudAppService;
pub use definition::{HandlerFuture, Invocation, MethodHandle, MethodKind, ServiceDefinition};
pub use validation::RequestValidator;
