//! Request extractors.

mod context;

pub use context::{CallContext, TENANT_ID_HEADER, USER_ID_HEADER};
