use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use mobsync_core::CanonicalId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-identifier async mutexes.
///
/// Synchronizations of the same identifier run one at a time within this
/// process; different identifiers never wait on each other. Entries nobody
/// holds or waits on are pruned on the next acquire.
#[derive(Debug, Default)]
pub struct IdentifierLocks {
    inner: Mutex<HashMap<CanonicalId, Arc<AsyncMutex<()>>>>,
}

impl IdentifierLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`. Released when the guard drops.
    pub async fn lock(&self, id: &CanonicalId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(id.clone()).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of identifiers currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn id(n: u8) -> CanonicalId {
        format!("00000000-0000-0000-0000-0000000000{n:02x}")
            .parse()
            .unwrap()
    }

    #[tokio::test]
    async fn same_identifier_waits() {
        let locks = IdentifierLocks::new();
        let guard = locks.lock(&id(1)).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(&id(1))).await;
        assert!(second.is_err(), "second lock should block while held");

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.lock(&id(1))).await;
        assert!(third.is_ok(), "lock should be free after release");
    }

    #[tokio::test]
    async fn different_identifiers_do_not_block() {
        let locks = IdentifierLocks::new();
        let _a = locks.lock(&id(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(&id(2))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = IdentifierLocks::new();
        drop(locks.lock(&id(1)).await);
        drop(locks.lock(&id(2)).await);
        let _held = locks.lock(&id(3)).await;
        assert_eq!(locks.len(), 1);
    }
}
