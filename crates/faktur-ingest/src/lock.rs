//! Per-key mutual exclusion for reconciliation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-`(sender, invoice_number)` async locks.
///
/// Serializes finalization of units that resolved to the same invoice key,
/// so the dedup check-then-write cannot race in-process. The storage-layer
/// partial unique index remains the backstop for multi-process deployments.
///
/// Entries are held weakly: a key's lock is dropped once no unit holds or
/// awaits it, so the registry does not grow with sender history.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<(String, String), Weak<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one `(sender, invoice_number)` key, waiting if
    /// another unit currently holds it.
    pub async fn acquire(&self, sender: &str, invoice_number: &str) -> OwnedMutexGuard<()> {
        let key = (sender.to_string(), invoice_number.to_string());

        let mutex = {
            let mut map = self
                .inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            // Opportunistically drop entries whose lock nobody holds.
            map.retain(|_, weak| weak.strong_count() > 0);

            match map.get(&key).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let fresh = Arc::new(AsyncMutex::new(()));
                    map.insert(key, Arc::downgrade(&fresh));
                    fresh
                }
            }
        };

        mutex.lock_owned().await
    }

    /// Number of live keys, for observability.
    pub fn len(&self) -> usize {
        let map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.values().filter(|weak| weak.strong_count() > 0).count()
    }

    /// Returns whether no key is currently locked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
