//! Deduplicated per-destination copies of source media.
//!
//! The copy store is the only owner of [`CopyLink`] records. A copy's
//! identity is a pure function of `(source, owner, destination)` (see
//! [`naming`]), so a retried or racing copy always collides with the first
//! one instead of producing a second file.

pub mod local_files;
pub mod naming;

use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use lovebucket_model::{BucketKind, CopyID, DestinationID, MediaID, UserID};
use tracing::{debug, info, warn};

use crate::error::CopyError;
use crate::locks::DestinationLocks;
use crate::ports::{
    CopyLink, CopyLinkRepository, FileCopier, FileCopyError, LinkInsert,
    MediaCatalog,
};

pub use local_files::LocalFileCopier;
pub use naming::{CopyName, copy_name};

/// A resolved collection destination: where copies go and who owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Destination {
    pub id: DestinationID,
    pub owner_id: UserID,
    pub kind: BucketKind,
}

/// Copy creation and the cascade sweeps.
///
/// `copy_into`, `remove` and `remove_destination` expect the caller to hold
/// the destination lock. The per-source sweeps take the locks themselves.
#[derive(Clone)]
pub struct CopyStore {
    links: Arc<dyn CopyLinkRepository>,
    files: Arc<dyn FileCopier>,
    media: Arc<dyn MediaCatalog>,
    locks: Arc<DestinationLocks>,
}

impl fmt::Debug for CopyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyStore")
            .field("links", &type_name_of_val(self.links.as_ref()))
            .field("files", &type_name_of_val(self.files.as_ref()))
            .field("media", &type_name_of_val(self.media.as_ref()))
            .field("locked_destinations", &self.locks.len())
            .finish()
    }
}

impl CopyStore {
    pub fn new(
        links: Arc<dyn CopyLinkRepository>,
        files: Arc<dyn FileCopier>,
        media: Arc<dyn MediaCatalog>,
        locks: Arc<DestinationLocks>,
    ) -> Self {
        Self {
            links,
            files,
            media,
            locks,
        }
    }

    pub fn locks(&self) -> &Arc<DestinationLocks> {
        &self.locks
    }

    /// Copy `source_id` into `destination` and record the link.
    ///
    /// Fails closed: the link is only written after the file is in place,
    /// and the file is removed again if the link cannot be written.
    pub async fn copy_into(
        &self,
        source_id: MediaID,
        destination: &Destination,
    ) -> Result<CopyID, CopyError> {
        if self.is_copy(source_id).await? {
            return Err(CopyError::source_invalid(
                source_id,
                "item is already a copy",
            ));
        }

        if let Some(existing) =
            self.links.find_copy(source_id, destination.id).await?
        {
            return Err(CopyError::AlreadyExists {
                source_id,
                copy_id: existing.copy_id,
                destination_id: destination.id,
            });
        }

        let Some(source_path) = self.media.file_path(source_id).await? else {
            return Err(CopyError::source_invalid(
                source_id,
                "item has no stored file",
            ));
        };

        let name = copy_name(
            source_id,
            &source_path,
            destination.owner_id,
            destination.id,
        );

        match self.files.copy(&source_path, &name.file_name).await {
            Ok(_) => {}
            Err(FileCopyError::AlreadyExists(_)) => {
                // Another writer published this name first. If its link is
                // in place the copy is complete; a file without a link is a
                // stray and blocks the name.
                let existing =
                    self.links.find_copy(source_id, destination.id).await?;
                debug!(
                    %source_id,
                    destination_id = %destination.id,
                    linked = existing.is_some(),
                    "copy file already present"
                );
                return match existing {
                    Some(link) => Ok(link.copy_id),
                    None => Err(CopyError::AlreadyExists {
                        source_id,
                        copy_id: name.copy_id,
                        destination_id: destination.id,
                    }),
                };
            }
            Err(FileCopyError::MissingSource(path)) => {
                return Err(CopyError::source_invalid(
                    source_id,
                    format!("source file {path:?} is missing"),
                ));
            }
            Err(err) => return Err(CopyError::Io(err.to_string())),
        }

        let link = CopyLink {
            source_id,
            copy_id: name.copy_id,
            destination_id: destination.id,
            owner_id: destination.owner_id,
            kind: destination.kind,
            file_name: name.file_name.clone(),
            created_at: Utc::now(),
        };

        match self.links.insert(link).await {
            Ok(LinkInsert::Inserted) => Ok(name.copy_id),
            Ok(LinkInsert::Duplicate(existing)) => {
                if existing.file_name != name.file_name {
                    self.discard_file(&name.file_name).await;
                }
                Err(CopyError::AlreadyExists {
                    source_id,
                    copy_id: existing.copy_id,
                    destination_id: destination.id,
                })
            }
            Err(err) => {
                self.discard_file(&name.file_name).await;
                Err(CopyError::Io(err.to_string()))
            }
        }
    }

    pub async fn copy_of(
        &self,
        source_id: MediaID,
        destination_id: DestinationID,
    ) -> Result<Option<CopyID>, CopyError> {
        Ok(self
            .links
            .find_copy(source_id, destination_id)
            .await?
            .map(|link| link.copy_id))
    }

    pub async fn source_of(
        &self,
        copy_id: CopyID,
    ) -> Result<Option<MediaID>, CopyError> {
        Ok(self
            .links
            .find_by_copy(copy_id)
            .await?
            .map(|link| link.source_id))
    }

    pub async fn is_copy(&self, media_id: MediaID) -> Result<bool, CopyError> {
        Ok(self.source_of(CopyID::from(media_id)).await?.is_some())
    }

    /// Delete a copy and its link. Unknown copies are a no-op.
    ///
    /// The link survives when the file cannot be deleted so the removal can
    /// be retried.
    pub async fn remove(&self, copy_id: CopyID) -> Result<bool, CopyError> {
        let Some(link) = self.links.find_by_copy(copy_id).await? else {
            return Ok(false);
        };

        self.files
            .remove(&link.file_name)
            .await
            .map_err(|err| CopyError::Io(err.to_string()))?;

        Ok(self.links.delete_by_copy(copy_id).await?)
    }

    /// Drop the link of a copy whose file the media store already deleted.
    pub async fn forget_copy(&self, copy_id: CopyID) -> Result<bool, CopyError> {
        let Some(link) = self.links.find_by_copy(copy_id).await? else {
            return Ok(false);
        };
        let _guard = self.locks.lock(link.destination_id).await;
        Ok(self.links.delete_by_copy(copy_id).await?)
    }

    /// Remove every copy made from `source_id`, across all users.
    ///
    /// A copy that cannot be removed does not stop the sweep. When any fail,
    /// the result is [`CopyError::PartialSweep`] carrying the number removed
    /// and the first failure.
    pub async fn remove_all_copies_of(
        &self,
        source_id: MediaID,
    ) -> Result<usize, CopyError> {
        let links = self.links.list_by_source(source_id).await?;
        let mut removed = 0;
        let mut failed = 0;
        let mut first_error = None;
        for link in links {
            let _guard = self.locks.lock(link.destination_id).await;
            match self.remove(link.copy_id).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        %source_id,
                        copy_id = %link.copy_id,
                        destination_id = %link.destination_id,
                        "failed to remove copy of deleted source: {err}"
                    );
                    failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }
        info!(%source_id, removed, failed, "removed copies of deleted source");
        match first_error {
            None => Ok(removed),
            Some(first) => Err(CopyError::PartialSweep {
                removed,
                failed,
                first: Box::new(first),
            }),
        }
    }

    /// Drop every copy stored in a destination along with its links. The
    /// caller holds the destination lock.
    pub async fn remove_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64, CopyError> {
        let links = self.links.list_by_destination(destination_id).await?;
        for link in &links {
            if let Err(err) = self.files.remove(&link.file_name).await {
                warn!(
                    %destination_id,
                    copy_id = %link.copy_id,
                    "failed to delete copy file during destination sweep: {err}"
                );
            }
        }
        let removed = self.links.delete_by_destination(destination_id).await?;
        info!(%destination_id, removed, "swept destination");
        Ok(removed)
    }

    pub async fn count(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64, CopyError> {
        Ok(self.links.count_in_destination(destination_id).await?)
    }

    async fn discard_file(&self, file_name: &str) {
        if let Err(err) = self.files.remove(file_name).await {
            warn!(file_name, "failed to discard orphaned copy: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::infra::{InMemoryCopyLinkRepository, InMemoryMediaCatalog};

    /// File copier whose collisions and removal failures are set up per test.
    #[derive(Debug, Default)]
    struct ScriptedCopier {
        links: Arc<InMemoryCopyLinkRepository>,
        /// Recorded by a competing writer just before our publish fails.
        competing_link: Mutex<Option<CopyLink>>,
        stray_file: AtomicBool,
        failing_removals: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FileCopier for ScriptedCopier {
        async fn copy(
            &self,
            _source_path: &Path,
            dest_name: &str,
        ) -> Result<PathBuf, FileCopyError> {
            let competing = self.competing_link.lock().unwrap().take();
            if let Some(link) = competing {
                self.links.insert(link).await.unwrap();
                return Err(FileCopyError::AlreadyExists(dest_name.to_string()));
            }
            if self.stray_file.load(Ordering::SeqCst) {
                return Err(FileCopyError::AlreadyExists(dest_name.to_string()));
            }
            Ok(PathBuf::from(dest_name))
        }

        async fn remove(&self, dest_name: &str) -> Result<bool, FileCopyError> {
            let fails = self
                .failing_removals
                .lock()
                .unwrap()
                .iter()
                .any(|name| name == dest_name);
            if fails {
                return Err(FileCopyError::Io("device busy".to_string()));
            }
            Ok(true)
        }
    }

    struct Harness {
        links: Arc<InMemoryCopyLinkRepository>,
        files: Arc<ScriptedCopier>,
        store: CopyStore,
        source_id: MediaID,
        source_path: PathBuf,
    }

    async fn harness() -> Harness {
        let links = Arc::new(InMemoryCopyLinkRepository::new());
        let files = Arc::new(ScriptedCopier {
            links: Arc::clone(&links),
            ..ScriptedCopier::default()
        });
        let media = Arc::new(InMemoryMediaCatalog::new());
        let source_id = MediaID::new();
        let source_path = PathBuf::from(format!("/media/{source_id}.jpg"));
        media
            .register(source_id, "image/jpeg", source_path.clone())
            .await;
        let store = CopyStore::new(
            links.clone(),
            files.clone(),
            media,
            Arc::new(DestinationLocks::new()),
        );
        Harness {
            links,
            files,
            store,
            source_id,
            source_path,
        }
    }

    fn like_destination() -> Destination {
        Destination {
            id: DestinationID::new(),
            owner_id: UserID::new(),
            kind: BucketKind::Like,
        }
    }

    #[tokio::test]
    async fn collision_with_recorded_link_returns_that_copy() {
        let h = harness().await;
        let destination = like_destination();
        let name = copy_name(
            h.source_id,
            &h.source_path,
            destination.owner_id,
            destination.id,
        );
        *h.files.competing_link.lock().unwrap() = Some(CopyLink {
            source_id: h.source_id,
            copy_id: name.copy_id,
            destination_id: destination.id,
            owner_id: destination.owner_id,
            kind: destination.kind,
            file_name: name.file_name.clone(),
            created_at: Utc::now(),
        });

        let copy_id = h.store.copy_into(h.source_id, &destination).await.unwrap();
        assert_eq!(copy_id, name.copy_id);
        assert_eq!(h.links.len().await, 1);
    }

    #[tokio::test]
    async fn stray_file_without_link_blocks_the_copy() {
        let h = harness().await;
        h.files.stray_file.store(true, Ordering::SeqCst);

        let result = h.store.copy_into(h.source_id, &like_destination()).await;
        assert!(matches!(result, Err(CopyError::AlreadyExists { .. })));
        assert!(h.links.is_empty().await);
    }

    #[tokio::test]
    async fn source_sweep_continues_past_a_failed_removal() {
        let h = harness().await;
        let stuck = like_destination();
        let other = like_destination();
        h.store.copy_into(h.source_id, &stuck).await.unwrap();
        h.store.copy_into(h.source_id, &other).await.unwrap();

        let stuck_name =
            copy_name(h.source_id, &h.source_path, stuck.owner_id, stuck.id)
                .file_name;
        h.files.failing_removals.lock().unwrap().push(stuck_name);

        let result = h.store.remove_all_copies_of(h.source_id).await;
        assert!(
            matches!(
                result,
                Err(CopyError::PartialSweep {
                    removed: 1,
                    failed: 1,
                    ..
                })
            ),
            "result: {result:?}"
        );

        let left = h.links.all().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].destination_id, stuck.id);
    }
}
