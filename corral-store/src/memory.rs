//! In-process entry store backed by a hash map.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use corral_core::{CacheEntry, StoreError};
use tokio::time::Instant;

use crate::{EntryStore, SetIfAbsent};

/// What a slot holds: a cache entry, or a raw coordination value such
/// as a lock nonce.
#[derive(Debug, Clone)]
enum Stored {
    Entry(CacheEntry),
    Raw(String),
}

#[derive(Debug, Clone)]
struct Slot {
    stored: Stored,
    /// Physical retention deadline; `None` means retained forever.
    deadline: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) => now < deadline,
            None => true,
        }
    }
}

/// Hash-map entry store with physical TTL support.
///
/// Retention deadlines run on the tokio clock, so tests on a paused
/// runtime can drive expiry deterministically. Expired slots are
/// dropped lazily on the next access to their key. Both conditional
/// operations hold the one interior mutex across their check and their
/// mutation, which makes them atomic with respect to every other
/// operation on the store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    slots: Mutex<HashMap<String, Slot>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots
            .lock()
            .map(|slots| slots.values().filter(|slot| slot.is_live(now)).count())
            .unwrap_or(0)
    }

    /// Whether the store holds no live slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_slots(&self) -> Result<MutexGuard<'_, HashMap<String, Slot>>, StoreError> {
        self.slots.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Drop the slot under `key` if its retention deadline has passed.
fn purge(slots: &mut HashMap<String, Slot>, key: &str, now: Instant) {
    let dead = slots.get(key).is_some_and(|slot| !slot.is_live(now));
    if dead {
        slots.remove(key);
    }
}

#[async_trait]
impl EntryStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let now = Instant::now();
        let mut slots = self.lock_slots()?;
        purge(&mut slots, key, now);
        match slots.get(key) {
            Some(Slot {
                stored: Stored::Entry(entry),
                ..
            }) => Ok(Some(entry.clone())),
            _ => Ok(None),
        }
    }

    async fn write(
        &self,
        key: &str,
        entry: CacheEntry,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut slots = self.lock_slots()?;
        slots.insert(
            key.to_string(),
            Slot {
                stored: Stored::Entry(entry),
                deadline: ttl.and_then(|ttl| now.checked_add(ttl)),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut slots = self.lock_slots()?;
        purge(&mut slots, key, now);
        Ok(slots.remove(key).is_some())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let mut slots = self.lock_slots()?;
        slots.clear();
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<SetIfAbsent, StoreError> {
        let now = Instant::now();
        let mut slots = self.lock_slots()?;
        purge(&mut slots, key, now);
        if slots.contains_key(key) {
            return Ok(SetIfAbsent::Occupied);
        }
        slots.insert(
            key.to_string(),
            Slot {
                stored: Stored::Raw(value.to_string()),
                deadline: now.checked_add(ttl),
            },
        );
        Ok(SetIfAbsent::Stored)
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut slots = self.lock_slots()?;
        purge(&mut slots, key, now);
        let matches = match slots.get(key) {
            Some(Slot {
                stored: Stored::Raw(current),
                ..
            }) => current == expected,
            _ => false,
        };
        if matches {
            slots.remove(key);
        }
        Ok(matches)
    }
}

// ============================================================================
// TESTS
// ============================================================================
