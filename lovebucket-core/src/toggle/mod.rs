//! The like/love toggle state machine.
//!
//! State is never stored: every toggle reads membership from both
//! collections, looks up the transition in [`transitions`], and applies it.
//! Failures inside a toggle are absorbed into [`ToggleOutcome::NoOp`].

pub mod outcome;
pub mod transitions;

use lovebucket_model::{BucketKind, MediaID, MembershipState, ToggleState};
use tracing::{debug, warn};

use crate::collection::Collection;
use crate::error::{LikeError, Result};
use crate::policy::TogglePolicy;

pub use outcome::{ButtonState, ToggleOutcome};
pub use transitions::{Step, Transition, transition};

/// Owns one user's LIKE and LOVE collections and keeps every loved item
/// liked.
///
/// Callers are expected to hold the destination locks of both collections
/// for the duration of a toggle.
#[derive(Debug, Clone)]
pub struct ToggleEngine {
    like: Collection,
    love: Collection,
    max_allowed_likes: u32,
}

impl ToggleEngine {
    /// Pair two collections. Rejects pairs that are not the LIKE and LOVE
    /// collections of one user.
    pub fn new(like: Collection, love: Collection) -> Result<Self> {
        if like.kind() != BucketKind::Like {
            return Err(LikeError::InvalidBinding(format!(
                "expected a like collection, got {}",
                like.kind()
            )));
        }
        if love.kind() != BucketKind::Love {
            return Err(LikeError::InvalidBinding(format!(
                "expected a love collection, got {}",
                love.kind()
            )));
        }
        if like.owner_id() != love.owner_id() {
            return Err(LikeError::InvalidBinding(format!(
                "collections belong to different users ({} and {})",
                like.owner_id(),
                love.owner_id()
            )));
        }
        if like.destination_id() == love.destination_id() {
            return Err(LikeError::InvalidBinding(format!(
                "like and love share destination {}",
                like.destination_id()
            )));
        }

        Ok(Self {
            like,
            love,
            max_allowed_likes: 0,
        })
    }

    /// Cap the LIKE collection. `0` means unlimited.
    pub fn with_max_allowed_likes(mut self, max: u32) -> Self {
        self.max_allowed_likes = max;
        self
    }

    pub fn with_policy(self, policy: &TogglePolicy) -> Self {
        self.with_max_allowed_likes(policy.max_allowed_likes)
    }

    pub fn max_allowed_likes(&self) -> u32 {
        self.max_allowed_likes
    }

    pub fn like(&self) -> &Collection {
        &self.like
    }

    pub fn love(&self) -> &Collection {
        &self.love
    }

    fn collection(&self, kind: BucketKind) -> &Collection {
        match kind {
            BucketKind::Like => &self.like,
            BucketKind::Love => &self.love,
        }
    }

    pub async fn toggle_like(&self, source_id: MediaID) -> ToggleOutcome {
        self.toggle(BucketKind::Like, source_id).await
    }

    pub async fn toggle_love(&self, source_id: MediaID) -> ToggleOutcome {
        self.toggle(BucketKind::Love, source_id).await
    }

    /// Current membership without repairing anything.
    pub async fn membership(
        &self,
        source_id: MediaID,
    ) -> Result<(bool, bool)> {
        let liked = self.like.has(source_id).await?;
        let loved = self.love.has(source_id).await?;
        Ok((liked, loved))
    }

    /// Button state for `kind` as it should be drawn before any click.
    pub async fn toggle_state(
        &self,
        source_id: MediaID,
        kind: BucketKind,
    ) -> Result<ToggleState> {
        let (liked, loved) = self.membership(source_id).await?;
        Ok(match kind {
            BucketKind::Love if loved => ToggleState::Active,
            BucketKind::Like if liked && !loved => ToggleState::Active,
            _ => ToggleState::Static,
        })
    }

    async fn toggle(
        &self,
        action: BucketKind,
        source_id: MediaID,
    ) -> ToggleOutcome {
        let state = match self.current_state(source_id).await {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    %source_id,
                    user_id = %self.like.owner_id(),
                    "failed to read membership: {err}"
                );
                return ToggleOutcome::NoOp;
            }
        };

        let transition = transition(action, state);

        if transition.quota_gated && self.max_allowed_likes != 0 {
            let count = match self.like.count().await {
                Ok(count) => count,
                Err(err) => {
                    warn!(
                        user_id = %self.like.owner_id(),
                        "failed to count liked items: {err}"
                    );
                    return ToggleOutcome::NoOp;
                }
            };
            if count >= u64::from(self.max_allowed_likes) {
                debug!(
                    %source_id,
                    user_id = %self.like.owner_id(),
                    count,
                    max_allowed_likes = self.max_allowed_likes,
                    "like quota reached"
                );
                return ToggleOutcome::QuotaExceeded {
                    max_allowed_likes: self.max_allowed_likes,
                };
            }
        }

        if !self.apply(source_id, transition.steps).await {
            return ToggleOutcome::NoOp;
        }

        debug!(
            %source_id,
            user_id = %self.like.owner_id(),
            action = %action,
            from = ?state,
            to = ?transition.next,
            "toggled"
        );
        ToggleOutcome::changed(source_id, transition.report)
    }

    /// Read membership, repairing a loved-but-not-liked item first.
    async fn current_state(
        &self,
        source_id: MediaID,
    ) -> Result<MembershipState> {
        let (liked, loved) = self.membership(source_id).await?;
        match MembershipState::from_flags(liked, loved) {
            Some(state) => Ok(state),
            None => Ok(self.repair_loved_only(source_id).await),
        }
    }

    async fn repair_loved_only(&self, source_id: MediaID) -> MembershipState {
        warn!(
            %source_id,
            user_id = %self.like.owner_id(),
            "loved item is missing from the like collection; repairing"
        );
        if self.like.add(source_id).await.is_some() {
            return MembershipState::LikedAndLoved;
        }
        if self.love.remove(source_id).await {
            return MembershipState::None;
        }
        warn!(
            %source_id,
            user_id = %self.like.owner_id(),
            "repair failed; treating item as liked and loved"
        );
        MembershipState::LikedAndLoved
    }

    /// Run `steps` in order. When one fails, the ones already applied are
    /// undone so the item stays in the state it was read in.
    async fn apply(&self, source_id: MediaID, steps: &[Step]) -> bool {
        for (index, step) in steps.iter().enumerate() {
            if self.run(source_id, *step).await {
                continue;
            }

            if index > 0 {
                warn!(
                    %source_id,
                    user_id = %self.like.owner_id(),
                    failed_step = ?step,
                    "toggle step failed; rolling back"
                );
            }
            for done in steps[..index].iter().rev() {
                if !self.run(source_id, done.inverse()).await {
                    warn!(
                        %source_id,
                        step = ?done,
                        "failed to roll back toggle step"
                    );
                }
            }
            return false;
        }
        true
    }

    async fn run(&self, source_id: MediaID, step: Step) -> bool {
        match step {
            Step::Add(kind) => {
                self.collection(kind).add(source_id).await.is_some()
            }
            Step::Remove(kind) => self.collection(kind).remove(source_id).await,
        }
    }
}
