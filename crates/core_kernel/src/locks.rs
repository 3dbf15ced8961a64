//! Keyed async mutual exclusion
//!
//! Mutations against one hiring (quotation, payment reconciliation, claim
//! filing) and against one compliance (submit, review) must not interleave.
//! Repositories also reject stale versions, so the lock only keeps
//! in-process callers from racing each other into `Conflict` errors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Guard held for the duration of a serialized operation
pub type KeyGuard = OwnedMutexGuard<()>;

/// A registry of per-key async mutexes
///
/// Entries are held weakly so keys that are no longer in use are dropped on
/// the next acquisition of any key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<Uuid, Weak<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the key is free and returns a guard for it
    pub async fn lock(&self, key: impl Into<Uuid>) -> KeyGuard {
        let slot = self.slot(key.into());
        slot.lock_owned().await
    }

    /// Number of keys currently tracked
    pub fn tracked(&self) -> usize {
        match self.slots.lock() {
            Ok(slots) => slots.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn slot(&self, key: Uuid) -> Arc<AsyncMutex<()>> {
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.retain(|_, weak| weak.strong_count() > 0);

        if let Some(existing) = slots.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        let fresh = Arc::new(AsyncMutex::new(()));
        slots.insert(key, Arc::downgrade(&fresh));
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let key = Uuid::new_v4();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(key).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = KeyedLocks::new();
        {
            let _a = locks.lock(Uuid::new_v4()).await;
        }
        let _b = locks.lock(Uuid::new_v4()).await;
        assert_eq!(locks.tracked(), 1);
    }
}
