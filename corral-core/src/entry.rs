//! Cached value representation with logical expiry.
//!
//! An entry's logical deadline lives here, inside the value object; how
//! long the store physically retains the bytes is a separate concern
//! decided on the write path. The gap between the two is what makes a
//! stale copy readable while one caller regenerates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable cached value plus its logical expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached bytes.
    pub value: Vec<u8>,
    /// Logical deadline; `None` means the entry never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Create an entry that never expires.
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Create an entry expiring at a known instant.
    pub fn expiring_at(value: Vec<u8>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            expires_at: Some(expires_at),
        }
    }

    /// Create an entry that expires `lifetime` after `now`.
    pub fn expiring(value: Vec<u8>, now: DateTime<Utc>, lifetime: Duration) -> Self {
        let delta = chrono::Duration::from_std(lifetime).unwrap_or(chrono::Duration::MAX);
        let expires_at = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::expiring_at(value, expires_at)
    }

    /// Check if the entry is logically expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Time until logical expiry. `None` when already expired or when
    /// the entry has no expiry.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let expires_at = self.expires_at?;
        if now >= expires_at {
            None
        } else {
            (expires_at - now).to_std().ok()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
