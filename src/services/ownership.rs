//! Ownership rules: who may see and change a metadata record.

use crate::models::record::MetadataRecord;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("metadata has no owner, which means no one is granted access, not even you")]
    NoOwner,
    #[error("metadata has an owner that is not equal to your user id, hence you are not granted access")]
    WrongOwner,
}

/// Fail unless `user_id` is the recorded owner (exact string match).
///
/// A record without an owner is accessible to no one. Callers check again at
/// every read, delete and rename step instead of reusing an earlier result.
pub fn require_ownership(record: &MetadataRecord, user_id: &str) -> Result<(), AuthorizationError> {
    match record.owner.as_deref() {
        None => Err(AuthorizationError::NoOwner),
        Some(owner) if owner == user_id => Ok(()),
        Some(_) => Err(AuthorizationError::WrongOwner),
    }
}

/// Records split by whether the current user owns them.
#[derive(Debug, Default)]
pub struct OwnedListing {
    pub mine: Vec<MetadataRecord>,
    pub others: Vec<MetadataRecord>,
}

/// Ownerless records end up in `others`.
pub fn partition_by_owner(records: Vec<MetadataRecord>, user_id: &str) -> OwnedListing {
    let (mine, others) = records
        .into_iter()
        .partition(|record| record.owner.as_deref() == Some(user_id));
    OwnedListing { mine, others }
}
