use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lovebucket_model::{BucketKind, CopyID, DestinationID, MediaID, UserID};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Link between a source media item and one of its copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyLink {
    pub source_id: MediaID,
    pub copy_id: CopyID,
    pub destination_id: DestinationID,
    pub owner_id: UserID,
    pub kind: BucketKind,
    /// Storage name handed to the file copier.
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

/// Result of an insert against the uniqueness constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkInsert {
    Inserted,
    /// A link for the same `(source_id, destination_id)` or the same
    /// `copy_id` already exists; it is returned unchanged.
    Duplicate(CopyLink),
}

/// Persistence for copy links.
///
/// Implementations must make `insert` atomic with respect to the uniqueness
/// of `copy_id` and of `(source_id, destination_id)`; concurrent toggles
/// rely on it.
#[async_trait]
pub trait CopyLinkRepository: Send + Sync {
    async fn insert(&self, link: CopyLink) -> Result<LinkInsert>;

    async fn find_copy(
        &self,
        source_id: MediaID,
        destination_id: DestinationID,
    ) -> Result<Option<CopyLink>>;

    async fn find_by_copy(&self, copy_id: CopyID) -> Result<Option<CopyLink>>;

    async fn list_by_source(&self, source_id: MediaID) -> Result<Vec<CopyLink>>;

    async fn list_by_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<Vec<CopyLink>>;

    async fn delete_by_copy(&self, copy_id: CopyID) -> Result<bool>;

    async fn delete_by_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64>;

    async fn count_in_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64>;
}
