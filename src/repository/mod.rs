//! Persistence collaborator contract consumed by the CRUD engine, plus the bundled adapters.

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::{ensure_database_exists, PgDocumentRepository};

use crate::error::AppError;
use crate::mapping::Entity;
use async_trait::async_trait;
use serde_json::Value;

/// Exact-match filter over entity fields (snake_case names). Values arrive as strings from the query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub fields: Vec<(String, String)>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    /// True when every filtered field of the serialized entity equals the filter value.
    pub fn matches(&self, doc: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| doc.get(field).map(|v| scalar_matches(v, expected)).unwrap_or(false))
    }
}

fn scalar_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => match (n.as_f64(), expected.trim().parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        Value::Bool(b) => expected.eq_ignore_ascii_case(if *b { "true" } else { "false" }),
        Value::Null => expected.eq_ignore_ascii_case("null"),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Narrow get/list/insert/replace/remove contract keyed by the entity's primary key.
/// Locking and transactions are the adapter's business.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync + 'static {
    async fn get(&self, id: &E::Key) -> Result<Option<E>, AppError>;

    /// All matching entities in the adapter's natural order.
    async fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<E>, AppError>;

    /// Persist a new entity, assigning a key when it has none. Returns the stored entity.
    async fn insert(&self, entity: E) -> Result<E, AppError>;

    /// Replace the whole entity. None when `id` is absent.
    async fn replace(&self, id: &E::Key, entity: E) -> Result<Option<E>, AppError>;

    /// False when `id` is absent.
    async fn remove(&self, id: &E::Key) -> Result<bool, AppError>;
}
