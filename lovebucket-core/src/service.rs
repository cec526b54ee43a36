//! Entry points the surrounding system calls: toggles, button rendering,
//! cascade hooks and collection provisioning.

use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use lovebucket_model::{
    BUCKET_KINDS, BucketKind, CopyID, DestinationID, MediaID, ToggleState,
    UserID,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::copy_store::CopyStore;
use crate::error::{LikeError, Result};
use crate::locks::DestinationLocks;
use crate::policy::{MediaRules, TogglePolicy};
use crate::ports::{
    CollectionLocator, CopyLinkRepository, FileCopier, MediaCatalog,
};
use crate::toggle::{ButtonState, ToggleEngine, ToggleOutcome};

/// One button the caller wants to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonQuery {
    pub media_id: MediaID,
    pub kind: BucketKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub users_seen: usize,
    pub destinations_created: usize,
}

pub struct LikeLoveService {
    locator: Arc<dyn CollectionLocator>,
    media: Arc<dyn MediaCatalog>,
    store: CopyStore,
    policy: TogglePolicy,
    rules: Arc<MediaRules>,
}

impl fmt::Debug for LikeLoveService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LikeLoveService")
            .field("locator", &type_name_of_val(self.locator.as_ref()))
            .field("media", &type_name_of_val(self.media.as_ref()))
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish()
    }
}

impl LikeLoveService {
    pub fn new(
        locator: Arc<dyn CollectionLocator>,
        media: Arc<dyn MediaCatalog>,
        links: Arc<dyn CopyLinkRepository>,
        files: Arc<dyn FileCopier>,
        policy: TogglePolicy,
    ) -> Self {
        let store = CopyStore::new(
            links,
            files,
            Arc::clone(&media),
            Arc::new(DestinationLocks::new()),
        );
        let rules = Arc::new(policy.media.clone());
        Self {
            locator,
            media,
            store,
            policy,
            rules,
        }
    }

    pub fn policy(&self) -> &TogglePolicy {
        &self.policy
    }

    pub fn store(&self) -> &CopyStore {
        &self.store
    }

    /// Bind the collection of `kind` for `user_id`.
    pub async fn collection(
        &self,
        user_id: UserID,
        kind: BucketKind,
    ) -> Result<Collection> {
        Collection::resolve(
            user_id,
            kind,
            Arc::clone(&self.locator),
            self.store.clone(),
            Arc::clone(&self.media),
            Arc::clone(&self.rules),
        )
        .await
    }

    /// Toggle engine for `user_id`. Fails with
    /// [`LikeError::FeatureDisabled`] when either collection is missing.
    pub async fn engine(&self, user_id: UserID) -> Result<ToggleEngine> {
        let like = self.collection(user_id, BucketKind::Like).await?;
        let love = self.collection(user_id, BucketKind::Love).await?;
        Ok(ToggleEngine::new(like, love)?.with_policy(&self.policy))
    }

    /// Map a copy back to the item it was made from. Other ids are returned
    /// unchanged.
    pub async fn canonical_source(&self, media_id: MediaID) -> Result<MediaID> {
        Ok(self
            .store
            .source_of(CopyID::from(media_id))
            .await?
            .unwrap_or(media_id))
    }

    pub async fn toggle_like(
        &self,
        user_id: UserID,
        media_id: MediaID,
    ) -> Result<ToggleOutcome> {
        self.toggle(user_id, media_id, BucketKind::Like).await
    }

    pub async fn toggle_love(
        &self,
        user_id: UserID,
        media_id: MediaID,
    ) -> Result<ToggleOutcome> {
        if self.policy.love_disabled {
            debug!(%user_id, %media_id, "love is disabled; ignoring toggle");
            return Ok(ToggleOutcome::NoOp);
        }
        self.toggle(user_id, media_id, BucketKind::Love).await
    }

    async fn toggle(
        &self,
        user_id: UserID,
        media_id: MediaID,
        action: BucketKind,
    ) -> Result<ToggleOutcome> {
        let engine = match self.engine(user_id).await {
            Ok(engine) => engine,
            Err(err @ LikeError::FeatureDisabled { .. }) => {
                warn!(%user_id, "toggle refused: {err}");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let source_id = match self.canonical_source(media_id).await {
            Ok(source_id) => source_id,
            Err(err) => {
                warn!(%user_id, %media_id, "failed to resolve source: {err}");
                return Ok(ToggleOutcome::NoOp);
            }
        };

        let _guards = self
            .store
            .locks()
            .lock_all(&[
                engine.like().destination_id(),
                engine.love().destination_id(),
            ])
            .await;

        // A destination cascade may have run while we waited for the locks.
        for collection in [engine.like(), engine.love()] {
            let current = self
                .locator
                .destination_for(user_id, collection.kind())
                .await?;
            if current != Some(collection.destination_id()) {
                warn!(
                    %user_id,
                    kind = %collection.kind(),
                    destination_id = %collection.destination_id(),
                    "collection was released during toggle"
                );
                return Err(LikeError::FeatureDisabled {
                    user_id,
                    kind: collection.kind(),
                });
            }
        }

        Ok(match action {
            BucketKind::Like => engine.toggle_like(source_id).await,
            BucketKind::Love => engine.toggle_love(source_id).await,
        })
    }

    /// Initial state of one button. Never mutates anything.
    pub async fn toggle_state(
        &self,
        user_id: UserID,
        media_id: MediaID,
        kind: BucketKind,
    ) -> Result<ToggleState> {
        let engine = match self.engine(user_id).await {
            Ok(engine) => engine,
            Err(LikeError::FeatureDisabled { .. }) => {
                return Ok(ToggleState::Disabled);
            }
            Err(err) => return Err(err),
        };
        if kind == BucketKind::Love && self.policy.love_disabled {
            return Ok(ToggleState::Static);
        }
        let source_id = self.canonical_source(media_id).await?;
        engine.toggle_state(source_id, kind).await
    }

    /// Initial state of many buttons for one viewer. Anonymous viewers get
    /// every button disabled.
    pub async fn toggle_states(
        &self,
        user_id: Option<UserID>,
        queries: &[ButtonQuery],
    ) -> Result<Vec<ButtonState>> {
        let engine = match user_id {
            Some(user_id) => match self.engine(user_id).await {
                Ok(engine) => Some(engine),
                Err(LikeError::FeatureDisabled { .. }) => None,
                Err(err) => return Err(err),
            },
            None => None,
        };

        let mut states = Vec::with_capacity(queries.len());
        for query in queries {
            let source_id = self.canonical_source(query.media_id).await?;
            let toggle_state = match &engine {
                None => ToggleState::Disabled,
                Some(_)
                    if query.kind == BucketKind::Love
                        && self.policy.love_disabled =>
                {
                    ToggleState::Static
                }
                Some(engine) => {
                    engine.toggle_state(source_id, query.kind).await?
                }
            };
            states.push(ButtonState {
                source_id,
                kind: query.kind,
                toggle_state,
            });
        }
        Ok(states)
    }

    /// Cascade for a deleted media item.
    ///
    /// A deleted copy only loses its link. A deleted source loses every
    /// copy made from it, in every user's collections.
    pub async fn on_source_deleted(&self, media_id: MediaID) -> Result<usize> {
        let copy_id = CopyID::from(media_id);
        if self.store.source_of(copy_id).await?.is_some() {
            let forgotten = self.store.forget_copy(copy_id).await?;
            debug!(%media_id, forgotten, "deleted media was a copy");
            return Ok(usize::from(forgotten));
        }
        Ok(self.store.remove_all_copies_of(media_id).await?)
    }

    /// Cascade for a deleted collection destination.
    ///
    /// The destination lock is held until the locator binding is gone, so a
    /// toggle queued behind the sweep sees the collection as missing.
    pub async fn on_destination_deleted(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64> {
        let _guard = self.store.locks().lock(destination_id).await;
        let removed = self.store.remove_destination(destination_id).await?;
        if !self.locator.release(destination_id).await? {
            debug!(%destination_id, "destination was not bound to a user");
        }
        Ok(removed)
    }

    /// Cascade for a deleted user: every destination they own goes away.
    pub async fn on_user_deleted(&self, user_id: UserID) -> Result<u64> {
        let mut removed = 0;
        for (kind, destination_id) in
            self.locator.destinations_of(user_id).await?
        {
            removed += self.on_destination_deleted(destination_id).await?;
            info!(%user_id, %kind, %destination_id, "dropped user collection");
        }
        Ok(removed)
    }

    /// Create whichever of the user's collections are missing. Returns how
    /// many were created.
    pub async fn provision_user(&self, user_id: UserID) -> Result<usize> {
        let mut created = 0;
        for kind in BUCKET_KINDS {
            if self.locator.destination_for(user_id, kind).await?.is_some() {
                continue;
            }
            let destination_id = DestinationID::new();
            if self.locator.assign(user_id, kind, destination_id).await? {
                info!(%user_id, %kind, %destination_id, "created collection");
                created += 1;
            }
        }
        Ok(created)
    }

    pub async fn provision_users<I>(&self, users: I) -> Result<ProvisionReport>
    where
        I: IntoIterator<Item = UserID>,
    {
        let mut report = ProvisionReport::default();
        for user_id in users {
            report.users_seen += 1;
            report.destinations_created += self.provision_user(user_id).await?;
        }
        info!(
            users_seen = report.users_seen,
            destinations_created = report.destinations_created,
            "provisioned collections"
        );
        Ok(report)
    }

    /// Hook for user registration.
    pub async fn on_user_created(&self, user_id: UserID) -> Result<usize> {
        if !self.policy.create_buckets_for_new_users {
            return Ok(0);
        }
        self.provision_user(user_id).await
    }
}
