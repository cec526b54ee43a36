use std::sync::Arc;

use dashmap::DashMap;
use lovebucket_model::DestinationID;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed mutexes serializing membership changes per destination.
///
/// Unrelated destinations never contend. Multiple destinations are always
/// acquired in ascending id order, so two callers locking overlapping sets
/// cannot deadlock.
///
/// Entries are never evicted. Waiters queued on a deleted destination must
/// keep contending on the same mutex as later lockers.
#[derive(Debug, Default)]
pub struct DestinationLocks {
    inner: DashMap<DestinationID, Arc<Mutex<()>>>,
}

impl DestinationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(
        &self,
        destination_id: DestinationID,
    ) -> OwnedMutexGuard<()> {
        let entry = self
            .inner
            .entry(destination_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        entry.lock_owned().await
    }

    /// Lock every destination in `ids`. Duplicates are locked once.
    pub async fn lock_all(
        &self,
        ids: &[DestinationID],
    ) -> Vec<OwnedMutexGuard<()>> {
        let mut ordered = ids.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for id in ordered {
            guards.push(self.lock(id).await);
        }
        guards
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
