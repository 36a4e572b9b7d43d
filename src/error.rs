//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Startup-time failures. Any of these aborts registration; no router is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("registration conflict: {verb} {path} declared by both {first} and {second}")]
    RegistrationConflict {
        verb: String,
        path: String,
        first: String,
        second: String,
    },
    #[error("duplicate service name '{name}' (declared as {first} and {second})")]
    DuplicateService {
        name: String,
        first: String,
        second: String,
    },
    #[error("duplicate method '{method}' on service '{service}'")]
    DuplicateMethod { service: String, method: String },
    #[error("invalid service name: '{0}'")]
    InvalidServiceName(String),
    #[error("invalid method name: '{0}'")]
    InvalidMethodName(String),
    #[error("settings: {0}")]
    Settings(String),
}

/// One violated field contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldViolation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldViolation>),
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },
    #[error("forbidden: missing permission {capability}")]
    Forbidden { capability: String },
    #[error("no route for {verb} {path}")]
    RouteNotFound { verb: String, path: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("repository: {0}")]
    Repository(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Internal,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Forbidden { .. } => ErrorKind::Forbidden,
            AppError::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Repository(_) => ErrorKind::Internal,
            AppError::Db(sqlx::Error::RowNotFound) => ErrorKind::NotFound,
            AppError::Db(_) => ErrorKind::Internal,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation(violations) => serde_json::to_value(violations).ok(),
            AppError::NotFound { entity, id } => Some(serde_json::json!({ "entity": entity, "id": id })),
            AppError::Forbidden { capability } => Some(serde_json::json!({ "capability": capability })),
            AppError::RouteNotFound { verb, path } => Some(serde_json::json!({ "verb": verb, "path": path })),
            _ => None,
        }
    }
}

/// Error kind shared by the server envelope and client proxies. Serialized as the envelope `code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[serde(rename = "validation_error")]
    Validation,
    NotFound,
    Forbidden,
    RouteNotFound,
    BadRequest,
    Conflict,
    #[serde(rename = "internal_error")]
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::RouteNotFound => "route_not_found",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal_error",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "validation_error" => ErrorKind::Validation,
            "not_found" => ErrorKind::NotFound,
            "forbidden" => ErrorKind::Forbidden,
            "route_not_found" => ErrorKind::RouteNotFound,
            "bad_request" => ErrorKind::BadRequest,
            "conflict" => ErrorKind::Conflict,
            "internal_error" | "config_error" | "database_error" | "repository_error" => ErrorKind::Internal,
            _ => return None,
        })
    }

    /// Best guess when the server did not send an envelope.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::BadRequest,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            422 => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound | ErrorKind::RouteNotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let code = match &self {
            AppError::Config(_) => "config_error",
            AppError::Repository(_) => "repository_error",
            AppError::Db(e) if !matches!(e, sqlx::Error::RowNotFound) => "database_error",
            _ => kind.code(),
        };
        if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        (kind.status(), Json(body)).into_response()
    }
}

/// Client-side proxy failures. Server-reported failures keep their kind; only failures to
/// reach the server at all are `Transport`.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{kind:?} ({status}): {message}")]
    Remote {
        kind: ErrorKind,
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },
    #[error("transport: {0}")]
    Transport(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("service '{service}' has no method '{method}'")]
    UnknownMethod { service: String, method: String },
    #[error("unknown service '{0}'")]
    UnknownService(String),
    #[error("method '{0}' needs an id")]
    MissingId(String),
}

impl ProxyError {
    /// Kind of a server-reported failure; None for client-side failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ProxyError::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Field violations carried by a remote validation failure.
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self {
            ProxyError::Remote {
                kind: ErrorKind::Validation,
                details: Some(details),
                ..
            } => serde_json::from_value(details.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_code() {
        for kind in [
            ErrorKind::Validation,
            ErrorKind::NotFound,
            ErrorKind::Forbidden,
            ErrorKind::RouteNotFound,
            ErrorKind::BadRequest,
            ErrorKind::Conflict,
            ErrorKind::Internal,
        ] {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn validation_message_lists_every_field() {
        let err = AppError::Validation(vec![
            FieldViolation::new("name", "name is required"),
            FieldViolation::new("price", "price must be at least 0"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("name is required"));
        assert!(msg.contains("price must be at least 0"));
    }

    #[test]
    fn route_not_found_maps_to_404() {
        let err = AppError::RouteNotFound {
            verb: "GET".into(),
            path: "/nope".into(),
        };
        assert_eq!(err.kind().status(), StatusCode::NOT_FOUND);
    }
}
