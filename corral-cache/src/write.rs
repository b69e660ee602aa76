//! Write path with race-grace retention padding.
//!
//! An entry carries two lifetimes. The logical one lives inside the
//! entry as `expires_at` and marks when readers should start treating
//! the value as stale. The physical one is the store-level retention
//! handed to the backend, padded by the race grace so a stale value
//! survives long enough to be served while a single caller
//! regenerates it. The grace is consumed here and nowhere else.

use std::time::Duration;

use chrono::Utc;
use corral_core::{CacheEntry, StoreError};
use corral_store::EntryStore;

/// Store-level retention for an entry with logical lifetime
/// `expires_in` under `grace`.
///
/// `None` means the entry never expires and gets unbounded retention;
/// the grace is irrelevant to it. A bounded lifetime is padded by the
/// grace, saturating instead of overflowing.
pub fn effective_ttl(expires_in: Option<Duration>, grace: Option<Duration>) -> Option<Duration> {
    expires_in.map(|ttl| ttl.saturating_add(grace.unwrap_or(Duration::ZERO)))
}

/// Write `value` under `key` with the logical lifetime stamped into
/// the entry and the grace-padded retention handed to the store.
pub async fn write_entry<S: EntryStore>(
    store: &S,
    key: &str,
    value: Vec<u8>,
    expires_in: Option<Duration>,
    grace: Option<Duration>,
) -> Result<(), StoreError> {
    let entry = match expires_in {
        Some(lifetime) => CacheEntry::expiring(value, Utc::now(), lifetime),
        None => CacheEntry::new(value),
    };
    store
        .write(key, entry, effective_ttl(expires_in, grace))
        .await
}

// ============================================================================
// TESTS
// ============================================================================
