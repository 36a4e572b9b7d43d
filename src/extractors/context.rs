//! Extract the caller context (user and tenant ids) from request headers.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

/// Header carrying the caller's user id. Default: `X-User-Id`.
pub const USER_ID_HEADER: &str = "X-User-Id";
/// Header carrying the tenant id. Default: `X-Tenant-ID`.
pub const TENANT_ID_HEADER: &str = "X-Tenant-ID";

/// Per-request caller identity handed to the authorization hook.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallContext {
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
}

impl CallContext {
    pub fn user(user_id: impl Into<String>) -> Self {
        CallContext {
            user_id: Some(user_id.into()),
            tenant_id: None,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        CallContext {
            user_id: header_value(headers, USER_ID_HEADER),
            tenant_id: header_value(headers, TENANT_ID_HEADER),
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for CallContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CallContext::from_headers(&parts.headers))
    }
}
