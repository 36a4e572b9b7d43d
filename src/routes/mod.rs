//! Route table and the axum routers built from it.

mod common;
mod service;
mod table;

pub use common::common_routes;
pub use service::service_routes;
pub use table::{normalize_path, RouteEntry, RouteMatch, RouteTable};
