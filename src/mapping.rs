//! Entity/DTO mapping: storage-shaped entities, network-shaped DTOs, and the key type tying them together.

use crate::config::ValidationRule;
use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// Primary key type. `Display`/`FromStr` give the canonical string used in `{id}` path segments.
pub trait EntityKey:
    Clone + Ord + Debug + Display + FromStr + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Server-assigned key for the `sequence`-th insert into a collaborator (starting at 1).
    /// None once the sequence no longer fits the key type.
    fn generate(sequence: u64) -> Option<Self>;

    fn parse_key(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl EntityKey for i32 {
    fn generate(sequence: u64) -> Option<Self> {
        i32::try_from(sequence).ok()
    }
}

impl EntityKey for i64 {
    fn generate(sequence: u64) -> Option<Self> {
        i64::try_from(sequence).ok()
    }
}

impl EntityKey for u64 {
    fn generate(sequence: u64) -> Option<Self> {
        Some(sequence)
    }
}

impl EntityKey for String {
    fn generate(sequence: u64) -> Option<Self> {
        Some(sequence.to_string())
    }
}

impl EntityKey for uuid::Uuid {
    fn generate(_sequence: u64) -> Option<Self> {
        Some(uuid::Uuid::new_v4())
    }
}

pub(crate) fn key_space_exhausted(sequence: u64) -> AppError {
    AppError::Conflict(format!("no key left for sequence {}", sequence))
}

/// Storage-shaped record owned by a repository. Serializable so adapters can store it as a document.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Key: EntityKey;

    /// None until the collaborator assigns one.
    fn id(&self) -> Option<&Self::Key>;

    fn set_id(&mut self, id: Self::Key);
}

/// Network-shaped projection of `E`. One DTO type maps to exactly one entity type per service.
pub trait EntityDto<E: Entity>: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn from_entity(entity: &E) -> Self;

    /// Build a whole new entity from this DTO. Fields the DTO leaves unset become their
    /// zero value: update is a full replace, not a merge.
    fn into_entity(self, id: Option<E::Key>) -> E;

    /// Field contracts keyed by wire field name.
    fn validation_rules() -> Vec<(&'static str, ValidationRule)> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_keys_follow_the_sequence() {
        assert_eq!(<i64 as EntityKey>::generate(7), Some(7));
        assert_eq!(<String as EntityKey>::generate(3).as_deref(), Some("3"));
    }

    #[test]
    fn narrow_keys_stop_instead_of_wrapping() {
        assert_eq!(<i32 as EntityKey>::generate(i32::MAX as u64), Some(i32::MAX));
        assert_eq!(<i32 as EntityKey>::generate(i32::MAX as u64 + 1), None);
        assert_eq!(<i64 as EntityKey>::generate(u64::MAX), None);
    }

    #[test]
    fn uuid_keys_are_random_and_parse_back() {
        let a = <uuid::Uuid as EntityKey>::generate(1).unwrap();
        let b = <uuid::Uuid as EntityKey>::generate(1).unwrap();
        assert_ne!(a, b);
        assert_eq!(uuid::Uuid::parse_key(&a.to_string()), Some(a));
        assert_eq!(uuid::Uuid::parse_key("not-a-uuid"), None);
    }
}
