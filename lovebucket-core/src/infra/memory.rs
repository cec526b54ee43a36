//! Process-local adapters. Used by tests and by embedders that keep their
//! collections in memory.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use lovebucket_model::{BucketKind, CopyID, DestinationID, MediaID, UserID};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::ports::{
    CollectionLocator, CopyLink, CopyLinkRepository, LinkInsert, MediaCatalog,
};

#[derive(Debug, Default)]
pub struct InMemoryCopyLinkRepository {
    links: RwLock<HashMap<CopyID, CopyLink>>,
}

impl InMemoryCopyLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<CopyLink> {
        self.links.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl CopyLinkRepository for InMemoryCopyLinkRepository {
    async fn insert(&self, link: CopyLink) -> Result<LinkInsert> {
        let mut links = self.links.write().await;
        if let Some(existing) = links.get(&link.copy_id) {
            return Ok(LinkInsert::Duplicate(existing.clone()));
        }
        if let Some(existing) = links.values().find(|existing| {
            existing.source_id == link.source_id
                && existing.destination_id == link.destination_id
        }) {
            return Ok(LinkInsert::Duplicate(existing.clone()));
        }
        links.insert(link.copy_id, link);
        Ok(LinkInsert::Inserted)
    }

    async fn find_copy(
        &self,
        source_id: MediaID,
        destination_id: DestinationID,
    ) -> Result<Option<CopyLink>> {
        Ok(self
            .links
            .read()
            .await
            .values()
            .find(|link| {
                link.source_id == source_id
                    && link.destination_id == destination_id
            })
            .cloned())
    }

    async fn find_by_copy(&self, copy_id: CopyID) -> Result<Option<CopyLink>> {
        Ok(self.links.read().await.get(&copy_id).cloned())
    }

    async fn list_by_source(&self, source_id: MediaID) -> Result<Vec<CopyLink>> {
        let mut links: Vec<CopyLink> = self
            .links
            .read()
            .await
            .values()
            .filter(|link| link.source_id == source_id)
            .cloned()
            .collect();
        links.sort_by_key(|link| link.created_at);
        Ok(links)
    }

    async fn list_by_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<Vec<CopyLink>> {
        let mut links: Vec<CopyLink> = self
            .links
            .read()
            .await
            .values()
            .filter(|link| link.destination_id == destination_id)
            .cloned()
            .collect();
        links.sort_by_key(|link| link.created_at);
        Ok(links)
    }

    async fn delete_by_copy(&self, copy_id: CopyID) -> Result<bool> {
        Ok(self.links.write().await.remove(&copy_id).is_some())
    }

    async fn delete_by_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64> {
        let mut links = self.links.write().await;
        let before = links.len();
        links.retain(|_, link| link.destination_id != destination_id);
        Ok((before - links.len()) as u64)
    }

    async fn count_in_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64> {
        Ok(self
            .links
            .read()
            .await
            .values()
            .filter(|link| link.destination_id == destination_id)
            .count() as u64)
    }
}

#[derive(Debug, Default)]
struct LocatorState {
    by_user: HashMap<(UserID, BucketKind), DestinationID>,
    by_destination: HashMap<DestinationID, (UserID, BucketKind)>,
}

#[derive(Debug, Default)]
pub struct InMemoryCollectionLocator {
    state: RwLock<LocatorState>,
}

impl InMemoryCollectionLocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CollectionLocator for InMemoryCollectionLocator {
    async fn destination_for(
        &self,
        user_id: UserID,
        kind: BucketKind,
    ) -> Result<Option<DestinationID>> {
        Ok(self.state.read().await.by_user.get(&(user_id, kind)).copied())
    }

    async fn owner_of(
        &self,
        destination_id: DestinationID,
    ) -> Result<Option<(UserID, BucketKind)>> {
        Ok(self
            .state
            .read()
            .await
            .by_destination
            .get(&destination_id)
            .copied())
    }

    async fn assign(
        &self,
        user_id: UserID,
        kind: BucketKind,
        destination_id: DestinationID,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.by_user.contains_key(&(user_id, kind))
            || state.by_destination.contains_key(&destination_id)
        {
            return Ok(false);
        }
        state.by_user.insert((user_id, kind), destination_id);
        state.by_destination.insert(destination_id, (user_id, kind));
        Ok(true)
    }

    async fn destinations_of(
        &self,
        user_id: UserID,
    ) -> Result<Vec<(BucketKind, DestinationID)>> {
        let state = self.state.read().await;
        let mut destinations: Vec<_> = state
            .by_user
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|((_, kind), destination)| (*kind, *destination))
            .collect();
        destinations.sort_by_key(|(kind, _)| kind.as_str());
        Ok(destinations)
    }

    async fn release(&self, destination_id: DestinationID) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(owner) = state.by_destination.remove(&destination_id) else {
            return Ok(false);
        };
        state.by_user.remove(&owner);
        Ok(true)
    }
}

#[derive(Debug, Clone)]
struct MediaEntry {
    mime_type: Option<String>,
    parent: Option<Uuid>,
    path: Option<PathBuf>,
}

/// Media store stand-in. Only registered items are valid media.
#[derive(Debug, Default)]
pub struct InMemoryMediaCatalog {
    entries: RwLock<HashMap<MediaID, MediaEntry>>,
}

impl InMemoryMediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(
        &self,
        id: MediaID,
        mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) {
        self.entries.write().await.insert(
            id,
            MediaEntry {
                mime_type: Some(mime_type.into()),
                parent: None,
                path: Some(path.into()),
            },
        );
    }

    /// Attach `id` to a parent record. Unknown ids are ignored.
    pub async fn set_parent(&self, id: MediaID, parent: Uuid) {
        if let Some(entry) = self.entries.write().await.get_mut(&id) {
            entry.parent = Some(parent);
        }
    }

    pub async fn unregister(&self, id: MediaID) -> bool {
        self.entries.write().await.remove(&id).is_some()
    }
}

#[async_trait]
impl MediaCatalog for InMemoryMediaCatalog {
    async fn is_valid_media(&self, id: MediaID) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(&id))
    }

    async fn mime_type(&self, id: MediaID) -> Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&id)
            .and_then(|entry| entry.mime_type.clone()))
    }

    async fn parent_of(&self, id: MediaID) -> Result<Option<Uuid>> {
        Ok(self.entries.read().await.get(&id).and_then(|entry| entry.parent))
    }

    async fn file_path(&self, id: MediaID) -> Result<Option<PathBuf>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&id)
            .and_then(|entry| entry.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn link(source_id: MediaID, destination_id: DestinationID) -> CopyLink {
        let owner_id = UserID::new();
        CopyLink {
            source_id,
            copy_id: CopyID::derive(source_id, owner_id, destination_id),
            destination_id,
            owner_id,
            kind: BucketKind::Like,
            file_name: format!("{owner_id}/{source_id}.png"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_second_link_for_same_destination() {
        let repo = InMemoryCopyLinkRepository::new();
        let source = MediaID::new();
        let destination = DestinationID::new();

        let first = link(source, destination);
        assert_eq!(
            repo.insert(first.clone()).await.unwrap(),
            LinkInsert::Inserted
        );

        // Different owner, so a different copy id, same pair.
        let second = link(source, destination);
        assert_eq!(
            repo.insert(second).await.unwrap(),
            LinkInsert::Duplicate(first)
        );
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn delete_by_destination_leaves_other_destinations() {
        let repo = InMemoryCopyLinkRepository::new();
        let source = MediaID::new();
        let like = DestinationID::new();
        let love = DestinationID::new();
        repo.insert(link(source, like)).await.unwrap();
        repo.insert(link(source, love)).await.unwrap();

        assert_eq!(repo.delete_by_destination(like).await.unwrap(), 1);
        assert_eq!(repo.count_in_destination(like).await.unwrap(), 0);
        assert_eq!(repo.count_in_destination(love).await.unwrap(), 1);
        assert_eq!(repo.list_by_source(source).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn locator_binds_one_destination_per_kind() {
        let locator = InMemoryCollectionLocator::new();
        let user = UserID::new();
        let destination = DestinationID::new();

        assert!(locator.assign(user, BucketKind::Like, destination).await.unwrap());
        assert!(
            !locator
                .assign(user, BucketKind::Like, DestinationID::new())
                .await
                .unwrap()
        );
        assert!(
            !locator
                .assign(UserID::new(), BucketKind::Love, destination)
                .await
                .unwrap()
        );
        assert_eq!(
            locator.owner_of(destination).await.unwrap(),
            Some((user, BucketKind::Like))
        );

        assert!(locator.release(destination).await.unwrap());
        assert!(!locator.release(destination).await.unwrap());
        assert_eq!(
            locator.destination_for(user, BucketKind::Like).await.unwrap(),
            None
        );
    }
}
