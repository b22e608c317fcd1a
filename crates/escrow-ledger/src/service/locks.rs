//! Per-key serialization and in-flight reservations.

use crate::domain::Amount;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per key.
///
/// Calls on the same key queue behind each other; calls on different keys
/// never contend beyond the short map lookup. An entry lives only while some
/// caller holds or awaits it, so keys that are touched once (including keys
/// with nothing stored) do not accumulate.
#[derive(Debug)]
pub(crate) struct KeyLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Copy> KeyLocks<K> {
    pub(crate) fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let lock = Arc::clone(self.locks.lock().entry(key).or_default());
        let held = lock.lock_owned().await;
        KeyGuard {
            locks: self,
            key,
            held: Some(held),
        }
    }

    /// Number of keys currently held or awaited.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Exclusive access to one key; releasing it drops the map entry once no
/// other caller is queued on the same key.
#[derive(Debug)]
pub(crate) struct KeyGuard<'a, K: Eq + Hash + Copy> {
    locks: &'a KeyLocks<K>,
    key: K,
    held: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Copy> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        // Map lock first: a new caller cannot clone the entry between the
        // release and the count check.
        let mut locks = self.locks.locks.lock();
        drop(self.held.take());
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// Value removed from storage whose transfer has not returned yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Reservation {
    pub envelopes: usize,
    pub amount: Amount,
}

/// In-flight reservations per key.
#[derive(Debug)]
pub(crate) struct InFlight<K> {
    reservations: Mutex<HashMap<K, Reservation>>,
}

impl<K: Eq + Hash + Copy> InFlight<K> {
    pub(crate) fn new() -> Self {
        Self {
            reservations: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Reservation {
        self.reservations
            .lock()
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn reserve(&self, key: K, envelopes: usize, amount: Amount) {
        let mut reservations = self.reservations.lock();
        let entry = reservations.entry(key).or_default();
        entry.envelopes += envelopes;
        entry.amount = entry.amount.saturating_add(amount);
    }

    pub(crate) fn clear(&self, key: &K, envelopes: usize, amount: Amount) {
        let mut reservations = self.reservations.lock();
        if let Some(entry) = reservations.get_mut(key) {
            entry.envelopes = entry.envelopes.saturating_sub(envelopes);
            entry.amount = entry.amount.saturating_sub(amount);
            if *entry == Reservation::default() {
                reservations.remove(key);
            }
        }
    }
}
