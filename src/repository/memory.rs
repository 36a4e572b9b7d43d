use super::{ListFilter, Repository};
use crate::error::AppError;
use crate::mapping::{key_space_exhausted, Entity, EntityKey};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Process-local repository. Natural order is key order.
pub struct InMemoryRepository<E: Entity> {
    rows: RwLock<BTreeMap<E::Key, E>>,
    sequence: AtomicU64,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        InMemoryRepository {
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Seed with entities that already carry keys.
    pub fn with_entities(entities: impl IntoIterator<Item = E>) -> Self {
        let mut rows = BTreeMap::new();
        for e in entities {
            if let Some(id) = e.id().cloned() {
                rows.insert(id, e);
            }
        }
        let sequence = rows.len() as u64;
        InMemoryRepository {
            rows: RwLock::new(rows),
            sequence: AtomicU64::new(sequence),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn get(&self, id: &E::Key) -> Result<Option<E>, AppError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn list(&self, filter: Option<&ListFilter>) -> Result<Vec<E>, AppError> {
        let rows = self.rows.read().await;
        let filter = match filter {
            Some(f) if !f.is_empty() => f,
            _ => return Ok(rows.values().cloned().collect()),
        };
        let mut out = Vec::new();
        for e in rows.values() {
            let doc = serde_json::to_value(e).map_err(|err| AppError::Repository(err.to_string()))?;
            if filter.matches(&doc) {
                out.push(e.clone());
            }
        }
        Ok(out)
    }

    async fn insert(&self, mut entity: E) -> Result<E, AppError> {
        let mut rows = self.rows.write().await;
        let id = match entity.id().cloned() {
            Some(id) => {
                if rows.contains_key(&id) {
                    return Err(AppError::Conflict(format!("id {} already exists", id)));
                }
                id
            }
            None => loop {
                let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                let candidate = E::Key::generate(sequence).ok_or_else(|| key_space_exhausted(sequence))?;
                if !rows.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        entity.set_id(id.clone());
        rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn replace(&self, id: &E::Key, mut entity: E) -> Result<Option<E>, AppError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(id) {
            Some(slot) => {
                entity.set_id(id.clone());
                *slot = entity.clone();
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, id: &E::Key) -> Result<bool, AppError> {
        Ok(self.rows.write().await.remove(id).is_some())
    }
}
