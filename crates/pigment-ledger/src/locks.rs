//! # Per-Key Locks
//!
//! Mutual exclusion scoped to a single record key.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  KeyedLocks (DashMap<key, Arc<Mutex<()>>>)                              │
//! │                                                                         │
//! │   "S1" ──► Mutex ◄── sale A holds, refund B waits                       │
//! │   "S2" ──► Mutex ◄── sale C holds (runs in parallel with A)             │
//! │                                                                         │
//! │  Entries are created on first use and removed when the last holder      │
//! │  or waiter lets go.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lock Order
//! Stock keys are always taken before commission keys, never the reverse.
//! Operations touch at most one key of each kind.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// A registry of async mutexes, one per key.
///
/// Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<LockMap>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        // Clone out of the map so the shard lock is not held across the await
        let mutex = self
            .inner
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        trace!(key = %key, "Acquired key lock");

        KeyGuard {
            key: key.to_string(),
            map: Arc::clone(&self.inner),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn active_keys(&self) -> usize {
        self.inner.len()
    }
}

/// Exclusive access to one key; released on drop.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    map: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody holds or waits
        self.map
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
