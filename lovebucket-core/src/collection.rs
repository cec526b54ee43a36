use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use lovebucket_model::{BucketKind, CopyID, DestinationID, MediaID, UserID};
use tracing::{debug, warn};

use crate::copy_store::{CopyStore, Destination};
use crate::error::{CopyError, LikeError, Result};
use crate::policy::MediaRules;
use crate::ports::{CollectionLocator, MediaCatalog};

/// One user's LIKE or LOVE collection.
///
/// Membership is whatever copy links exist for the bound destination.
/// Mutations never return errors: a failed add or remove is reported as
/// "nothing changed" and logged.
#[derive(Clone)]
pub struct Collection {
    destination: Destination,
    store: CopyStore,
    media: Arc<dyn MediaCatalog>,
    locator: Arc<dyn CollectionLocator>,
    rules: Arc<MediaRules>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("destination", &self.destination)
            .field("store", &self.store)
            .field("media", &type_name_of_val(self.media.as_ref()))
            .field("locator", &type_name_of_val(self.locator.as_ref()))
            .field("rules", &self.rules)
            .finish()
    }
}

impl Collection {
    /// Bind the collection for `(user_id, kind)`.
    ///
    /// Fails with [`LikeError::FeatureDisabled`] when the user has no
    /// destination for `kind`; collections are never created lazily here.
    pub async fn resolve(
        user_id: UserID,
        kind: BucketKind,
        locator: Arc<dyn CollectionLocator>,
        store: CopyStore,
        media: Arc<dyn MediaCatalog>,
        rules: Arc<MediaRules>,
    ) -> Result<Self> {
        let Some(destination_id) =
            locator.destination_for(user_id, kind).await?
        else {
            return Err(LikeError::FeatureDisabled { user_id, kind });
        };

        Ok(Self {
            destination: Destination {
                id: destination_id,
                owner_id: user_id,
                kind,
            },
            store,
            media,
            locator,
            rules,
        })
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn destination_id(&self) -> DestinationID {
        self.destination.id
    }

    pub fn owner_id(&self) -> UserID {
        self.destination.owner_id
    }

    pub fn kind(&self) -> BucketKind {
        self.destination.kind
    }

    pub async fn has(&self, source_id: MediaID) -> Result<bool> {
        self.store
            .copy_of(source_id, self.destination.id)
            .await
            .map(|copy| copy.is_some())
            .map_err(|err| LikeError::Storage(err.to_string()))
    }

    /// Add a copy of `source_id`. Returns `None` when the item was rejected
    /// or nothing was stored, including when it is already a member.
    pub async fn add(&self, source_id: MediaID) -> Option<CopyID> {
        match self.accepts(source_id).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                warn!(
                    %source_id,
                    kind = %self.destination.kind,
                    "media validation failed: {err}"
                );
                return None;
            }
        }

        match self.store.copy_into(source_id, &self.destination).await {
            Ok(copy_id) => Some(copy_id),
            Err(CopyError::AlreadyExists { copy_id, .. }) => {
                debug!(
                    %source_id,
                    %copy_id,
                    kind = %self.destination.kind,
                    "item already in collection"
                );
                None
            }
            Err(err) => {
                warn!(
                    %source_id,
                    user_id = %self.destination.owner_id,
                    destination_id = %self.destination.id,
                    kind = %self.destination.kind,
                    "failed to add item to collection: {err}"
                );
                None
            }
        }
    }

    /// Remove the copy of `source_id`. Returns false when there was none.
    pub async fn remove(&self, source_id: MediaID) -> bool {
        let copy_id =
            match self.store.copy_of(source_id, self.destination.id).await {
                Ok(Some(copy_id)) => copy_id,
                Ok(None) => return false,
                Err(err) => {
                    warn!(
                        %source_id,
                        kind = %self.destination.kind,
                        "failed to look up copy: {err}"
                    );
                    return false;
                }
            };

        match self.store.remove(copy_id).await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(
                    %source_id,
                    %copy_id,
                    user_id = %self.destination.owner_id,
                    kind = %self.destination.kind,
                    "failed to remove item from collection: {err}"
                );
                false
            }
        }
    }

    pub async fn count(&self) -> Result<u64> {
        self.store
            .count(self.destination.id)
            .await
            .map_err(|err| LikeError::Storage(err.to_string()))
    }

    /// Only real media of an accepted type that is not itself held by a
    /// collection may be added.
    async fn accepts(&self, source_id: MediaID) -> Result<bool> {
        if !self.media.is_valid_media(source_id).await? {
            debug!(%source_id, "rejecting unknown media");
            return Ok(false);
        }

        let mime_type = self.media.mime_type(source_id).await?;
        if !mime_type
            .as_deref()
            .is_some_and(|mime| self.rules.accepts(mime))
        {
            debug!(%source_id, ?mime_type, "rejecting unsupported media type");
            return Ok(false);
        }

        if let Some(parent) = self.media.parent_of(source_id).await?
            && self
                .locator
                .owner_of(DestinationID(parent))
                .await?
                .is_some()
        {
            debug!(%source_id, "rejecting copy held by a collection");
            return Ok(false);
        }

        Ok(true)
    }
}
