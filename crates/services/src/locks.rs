//! Per-card lock registry.
//!
//! Card mutations are a read-modify-write sequence with no transaction
//! around it; two concurrent mutations of the same card would otherwise
//! race and lose one update. The registry hands out one async mutex per
//! card id. Entries are held weakly so an idle card costs nothing once its
//! last guard drops; dead entries are swept when the map grows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::Mutex as AsyncMutex;

/// Sweep threshold: dead entries are pruned when the map passes this size.
const SWEEP_AT: usize = 1024;

#[derive(Default)]
pub struct CardLocks {
    locks: Mutex<HashMap<i64, Weak<AsyncMutex<()>>>>,
}

impl CardLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex for `card_id`, creating it on first use. All
    /// holders of the same card id share one mutex instance.
    pub fn lock_for(&self, card_id: i64) -> Arc<AsyncMutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(existing) = locks.get(&card_id).and_then(Weak::upgrade) {
            return existing;
        }

        if locks.len() >= SWEEP_AT {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }

        let fresh = Arc::new(AsyncMutex::new(()));
        locks.insert(card_id, Arc::downgrade(&fresh));
        fresh
    }

    /// Number of live entries. Test aid.
    #[cfg(test)]
    fn live(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| {
                locks
                    .values()
                    .filter(|weak| weak.strong_count() > 0)
                    .count()
            })
            .unwrap_or(0)
    }
}
