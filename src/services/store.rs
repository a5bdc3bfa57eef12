//! The metadata store seam: a key/value store of [`MetadataRecord`]s keyed
//! by entity id within a named metadata set (e.g. `saml20-sp-remote`).

use crate::models::record::MetadataRecord;
use async_trait::async_trait;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("metadata set `{0}` is not a valid set name")]
    InvalidSetName(String),
    #[error("entity id cannot be empty")]
    EmptyEntityId,
    #[error("stored metadata `{entity_id}` is unreadable: {source}")]
    Unreadable {
        entity_id: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Simple request/response storage of metadata records.
///
/// No locking or transactions: every call stands alone.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch one record. A record that does not exist is `Ok(None)`; one
    /// that exists but cannot be parsed is [`StoreError::Unreadable`].
    async fn get(&self, entity_id: &str, set: &str) -> StoreResult<Option<MetadataRecord>>;

    /// All records of a set, ordered by entity id. Unreadable records are
    /// logged and left out.
    async fn list(&self, set: &str) -> StoreResult<Vec<MetadataRecord>>;

    /// Create or replace the record stored under `entity_id`.
    async fn save(&self, entity_id: &str, set: &str, record: &MetadataRecord) -> StoreResult<()>;

    /// Remove a record. Removing a missing record succeeds.
    async fn delete(&self, entity_id: &str, set: &str) -> StoreResult<()>;

    /// Readiness probe for the backing storage.
    async fn ping(&self) -> StoreResult<()>;
}

/// Reject set names that could escape the store's namespace.
pub fn ensure_set_name_safe(set: &str) -> StoreResult<()> {
    if set.is_empty()
        || set.contains("..")
        || set
            .chars()
            .any(|c| c.is_control() || c == '/' || c == '\\' || c == '\0')
    {
        return Err(StoreError::InvalidSetName(set.to_string()));
    }
    Ok(())
}

pub fn ensure_entity_id_present(entity_id: &str) -> StoreResult<()> {
    if entity_id.is_empty() {
        return Err(StoreError::EmptyEntityId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_regular_set_names() {
        assert!(ensure_set_name_safe("saml20-sp-remote").is_ok());
    }

    #[test]
    fn rejects_traversal_and_separators() {
        for name in ["", "..", "a/b", "a\\b", "sp\n"] {
            assert!(
                matches!(ensure_set_name_safe(name), Err(StoreError::InvalidSetName(_))),
                "{name:?} should be rejected"
            );
        }
    }
}
