use std::path::PathBuf;

use async_trait::async_trait;
use lovebucket_model::MediaID;
use uuid::Uuid;

use crate::error::Result;

/// Read-only view of the external media store.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    async fn is_valid_media(&self, id: MediaID) -> Result<bool>;

    async fn mime_type(&self, id: MediaID) -> Result<Option<String>>;

    /// Record the media item is attached to, if any. Copies are attached to
    /// the destination that holds them.
    async fn parent_of(&self, id: MediaID) -> Result<Option<Uuid>>;

    /// Location of the media item's file on disk.
    async fn file_path(&self, id: MediaID) -> Result<Option<PathBuf>>;
}
