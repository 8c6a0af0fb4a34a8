//! Per-key async locks for single-flight fetching
//!
//! Holding the guard for a key across "check cache, fetch, persist" means
//! concurrent first requests for the same key wait for the first one to
//! finish and then find the entry on disk. Requests for different keys never
//! contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::CacheKey;

type LockTable = HashMap<CacheKey, Arc<AsyncMutex<()>>>;

/// Table of async mutexes, one per cache key currently in use
///
/// Cloning is cheap and clones share the same table. Entries are removed
/// once the last holder or waiter for a key lets go, so the table only holds
/// keys with work in progress.
#[derive(Debug, Clone, Default)]
pub struct KeyLocks {
    table: Arc<Mutex<LockTable>>,
}

/// Exclusive access to one cache key; released on drop
#[derive(Debug)]
pub struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    entry: TableEntry,
}

/// One task's claim on a table entry, from the start of waiting until the
/// key is released
///
/// Dropping it, whether the task finished or was cancelled mid-wait, removes
/// the entry when no other task still refers to it.
#[derive(Debug)]
struct TableEntry {
    key: CacheKey,
    table: Arc<Mutex<LockTable>>,
    slot: Option<Arc<AsyncMutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other task holds `key`, then takes it
    pub async fn lock(&self, key: &CacheKey) -> KeyGuard {
        let slot = {
            let mut table = lock_table(&self.table);
            Arc::clone(table.entry(key.clone()).or_default())
        };
        let entry = TableEntry {
            key: key.clone(),
            table: Arc::clone(&self.table),
            slot: Some(Arc::clone(&slot)),
        };

        let guard = slot.lock_owned().await;

        KeyGuard {
            guard: Some(guard),
            entry,
        }
    }

    /// Number of keys currently held or waited on
    pub fn active_keys(&self) -> usize {
        lock_table(&self.table).len()
    }
}

impl KeyGuard {
    pub fn key(&self) -> &CacheKey {
        &self.entry.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Unlock before the entry is released so its count below only sees
        // the table's own reference and any waiters.
        self.guard.take();
    }
}

impl Drop for TableEntry {
    fn drop(&mut self) {
        let mut table = lock_table(&self.table);
        // Let go of our reference under the table lock so two tasks
        // releasing together cannot both see the other's reference.
        self.slot.take();
        if let Some(slot) = table.get(&self.key) {
            if Arc::strong_count(slot) == 1 {
                table.remove(&self.key);
            }
        }
    }
}

fn lock_table(table: &Mutex<LockTable>) -> MutexGuard<'_, LockTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}
