//! HTTP handlers for service dispatch and the API definition.

pub mod dispatch;
pub mod definition;
pub use dispatch::dispatch;
pub use definition::api_definition;
