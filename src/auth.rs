//! Authorization hook consulted before every mutating call reaches a repository.

use crate::extractors::CallContext;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny,
}

/// Capability check. `permission` names the service and action, e.g. "Book.Create".
#[async_trait]
pub trait Authorizer: Send + Sync + 'static {
    async fn check(&self, permission: &str, context: &CallContext) -> AuthDecision;
}

/// Grants everything. Default for services built without an authorizer.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn check(&self, _permission: &str, _context: &CallContext) -> AuthDecision {
        AuthDecision::Allow
    }
}

/// Static permission grants per user id. Anonymous callers are denied.
#[derive(Clone, Debug, Default)]
pub struct PermissionAuthorizer {
    grants: HashMap<String, HashSet<String>>,
}

impl PermissionAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, user_id: impl Into<String>, permission: impl Into<String>) -> Self {
        self.grants.entry(user_id.into()).or_default().insert(permission.into());
        self
    }

    pub fn is_granted(&self, user_id: &str, permission: &str) -> bool {
        self.grants
            .get(user_id)
            .map(|p| p.contains(permission))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Authorizer for PermissionAuthorizer {
    async fn check(&self, permission: &str, context: &CallContext) -> AuthDecision {
        match context.user_id.as_deref() {
            Some(user) if self.is_granted(user, permission) => AuthDecision::Allow,
            _ => AuthDecision::Deny,
        }
    }
}

/// Permission name for an action on a service: ("Book", "Create") -> "Book.Create".
pub fn permission_name(service: &str, action: &str) -> String {
    format!("{}.{}", service, action)
}
