//! Declared service shapes: CRUD capabilities, HTTP verbs, and per-field validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One member of the CRUD capability set a service may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    Create,
    Get,
    GetList,
    Update,
    Delete,
}

impl Capability {
    /// Canonical declaration order; resolved methods follow it.
    pub const ALL: [Capability; 5] = [
        Capability::Create,
        Capability::Get,
        Capability::GetList,
        Capability::Update,
        Capability::Delete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Create => "Create",
            Capability::Get => "Get",
            Capability::GetList => "GetList",
            Capability::Update => "Update",
            Capability::Delete => "Delete",
        }
    }

    /// Create, Update and Delete go through the authorization hook.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Capability::Create | Capability::Update | Capability::Delete)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
        }
    }

    pub fn to_method(self) -> axum::http::Method {
        match self {
            HttpVerb::Get => axum::http::Method::GET,
            HttpVerb::Post => axum::http::Method::POST,
            HttpVerb::Put => axum::http::Method::PUT,
            HttpVerb::Delete => axum::http::Method::DELETE,
        }
    }

    /// None for methods outside the convention (PATCH, HEAD, ...).
    pub fn from_method(method: &axum::http::Method) -> Option<Self> {
        match *method {
            axum::http::Method::GET => Some(HttpVerb::Get),
            axum::http::Method::POST => Some(HttpVerb::Post),
            axum::http::Method::PUT => Some(HttpVerb::Put),
            axum::http::Method::DELETE => Some(HttpVerb::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field contract carried by a DTO. Keys are wire (camelCase) field names.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

impl ValidationRule {
    pub fn required() -> Self {
        ValidationRule {
            required: Some(true),
            ..Default::default()
        }
    }

    pub fn max_length(mut self, max: u32) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn min_length(mut self, min: u32) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn allowed(mut self, values: Vec<serde_json::Value>) -> Self {
        self.allowed = Some(values);
        self
    }
}
