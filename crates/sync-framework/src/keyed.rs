//! # Per-Key Mutation Queue
//!
//! Two mutations on the same identity key must not interleave: the second one
//! has to capture its snapshot from reconciled state, not from the first one's
//! speculative value. [`KeyedQueue`] gives every key a FIFO slot. A mutation
//! holds its [`KeySlot`] from snapshot capture until reconciliation; calls on
//! other keys are unaffected.
//!
//! Slots are created on demand and pruned once nobody holds or awaits them,
//! either when the last holder releases the slot or, for a waiter cancelled
//! after the release, the next time the queue is touched.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots<K> = Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>;

/// FIFO serialization of async work per key.
pub struct KeyedQueue<K> {
    slots: Slots<K>,
}

impl<K> KeyedQueue<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Waits until every earlier holder of `key` has released it.
    ///
    /// Waiters are served in arrival order (Tokio's mutex is fair).
    pub async fn acquire(&self, key: &K) -> KeySlot<K> {
        let lock = {
            let mut slots = self.slots.lock();
            prune_idle(&mut slots);
            Arc::clone(
                slots
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        let guard = lock.lock_owned().await;
        KeySlot {
            key: key.clone(),
            slots: Arc::clone(&self.slots),
            _guard: guard,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        let mut slots = self.slots.lock();
        prune_idle(&mut slots);
        slots.len()
    }
}

impl<K> Default for KeyedQueue<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// Entries only the map still owns.
fn prune_idle<K>(slots: &mut HashMap<K, Arc<AsyncMutex<()>>>) {
    slots.retain(|_, lock| Arc::strong_count(lock) > 1);
}

/// Exclusive hold on one key; released on drop.
pub struct KeySlot<K>
where
    K: Eq + Hash,
{
    key: K,
    slots: Slots<K>,
    _guard: OwnedMutexGuard<()>,
}

impl<K> Drop for KeySlot<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        // The map and our guard are the only owners: nobody else is waiting.
        let idle = slots
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 2);
        if idle {
            slots.remove(&self.key);
        }
    }
}
