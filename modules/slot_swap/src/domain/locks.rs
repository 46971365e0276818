use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Table of async mutexes keyed by record id.
///
/// Entries are created on first use and dropped by [`KeyedLocks::release`]
/// once nobody holds or waits on them.
#[derive(Default)]
pub struct KeyedLocks {
    inner: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: Uuid) -> OwnedMutexGuard<()> {
        // Clone out of the map before awaiting so no shard lock is held.
        let mutex = self.inner.entry(key).or_default().value().clone();
        mutex.lock_owned().await
    }

    /// Forget the entry for `key` if it is idle.
    pub fn release(&self, key: &Uuid) {
        self.inner
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
