use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-key async mutexes serializing read-modify-write cycles.
///
/// The store has no transactions, so two writers updating the same key must
/// queue on the key's lock to avoid lost updates. Different keys never block
/// each other.
#[derive(Clone, Default)]
pub struct KeyLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Held while a key is being updated; released on drop.
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder is updating `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let entry = {
            // The map only holds lock handles; a poisoned guard is still usable.
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(key.to_string()).or_default())
        };
        KeyGuard {
            _guard: entry.lock_owned().await,
        }
    }
}
