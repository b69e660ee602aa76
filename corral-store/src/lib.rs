//! Corral Store - Entry Store Trait and In-Memory Implementation
//!
//! Defines the storage capability the coordination layer runs against.
//! Anything that can do a get/write/delete plus two atomic conditional
//! operations can back the cache; the in-memory implementation here
//! serves tests and single-process deployments.

use std::time::Duration;

use async_trait::async_trait;
use corral_core::{CacheEntry, StoreError};

pub mod memory;

pub use memory::InMemoryStore;

/// Outcome of a conditional store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetIfAbsent {
    /// The key was vacant and now holds the value.
    Stored,
    /// The key already held a live value.
    Occupied,
    /// The store accepted the request but could not say whether the
    /// value landed.
    Indeterminate,
}

/// Storage capability consumed by the coordination layer.
///
/// Implementations are shared across many concurrent tasks and must be
/// internally synchronized. The two conditional operations are the
/// protocol's only synchronization points and must be race-free: a
/// networked store typically implements them with a conditional write
/// primitive and a server-side check-and-delete script.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Read the entry under `key`. Physically expired entries read as
    /// absent.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Write `entry` under `key`, physically retained for `ttl`
    /// (forever when `None`).
    async fn write(
        &self,
        key: &str,
        entry: CacheEntry,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError>;

    /// Remove the entry under `key`. Returns whether something live
    /// was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove everything.
    async fn clear_all(&self) -> Result<(), StoreError>;

    /// Atomically store raw `value` under `key` only if the key is
    /// vacant, retained for `ttl`.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<SetIfAbsent, StoreError>;

    /// Atomically remove `key` only while it holds exactly `expected`.
    /// Returns whether a removal happened.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, StoreError>;
}
