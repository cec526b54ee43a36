use async_trait::async_trait;
use lovebucket_model::{BucketKind, DestinationID, UserID};

use crate::error::Result;

/// Maps a user and a collection kind to the destination its copies live in.
///
/// At most one destination exists per `(user, kind)` and a destination
/// belongs to exactly one `(user, kind)`.
#[async_trait]
pub trait CollectionLocator: Send + Sync {
    async fn destination_for(
        &self,
        user_id: UserID,
        kind: BucketKind,
    ) -> Result<Option<DestinationID>>;

    async fn owner_of(
        &self,
        destination_id: DestinationID,
    ) -> Result<Option<(UserID, BucketKind)>>;

    /// Bind a destination. Returns false when `(user, kind)` is already bound.
    async fn assign(
        &self,
        user_id: UserID,
        kind: BucketKind,
        destination_id: DestinationID,
    ) -> Result<bool>;

    async fn destinations_of(
        &self,
        user_id: UserID,
    ) -> Result<Vec<(BucketKind, DestinationID)>>;

    /// Drop the binding for a destination. Returns false if it was unknown.
    async fn release(&self, destination_id: DestinationID) -> Result<bool>;
}
