//! Lock identities for regeneration coordination.
//!
//! A regeneration lock lives in the shared store under a key derived
//! from the cache key it guards, holding an unguessable nonce. Whoever
//! can present the stored nonce owns the lock; nobody else can release
//! it. Acquisition over a fallible store has a third outcome besides
//! won and lost: the store may simply not answer, in which case the
//! caller proceeds as a winner without a nonce.

use std::fmt;
use uuid::Uuid;

// ============================================================================
// LOCK KEY
// ============================================================================

/// Store key under which a regeneration lock lives.
///
/// Derived deterministically from the cache key it guards; the reserved
/// prefix keeps lock records out of the cached-entry keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    const PREFIX: &'static str = "lock:";

    /// Derive the lock key guarding `cache_key`.
    pub fn for_entry(cache_key: &str) -> Self {
        Self(format!("{}{}", Self::PREFIX, cache_key))
    }

    /// The full store key, prefix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// LOCK TOKEN
// ============================================================================

/// Nonce proving ownership of one lock acquisition.
///
/// Tokens are only ever minted here, from OS randomness; holding one
/// means the conditional store write genuinely succeeded. Ambiguous
/// acquisitions carry no token and therefore can never be released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    /// Mint a fresh random nonce.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// The nonce text as stored under the lock key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// LOCK ATTEMPT
// ============================================================================

/// Outcome of one attempt to take a regeneration lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    /// The lock was taken; the token releases it.
    Won(LockToken),
    /// The store could not say whether the write landed. The caller
    /// proceeds as a winner but holds no token, leaving the lock (if
    /// one exists) to expire on its own.
    WonAmbiguous,
    /// Another holder owns the lock.
    Lost,
}

impl LockAttempt {
    /// Whether the caller should proceed with regeneration.
    pub fn is_win(&self) -> bool {
        !matches!(self, LockAttempt::Lost)
    }

    /// Extract the genuine token, if this was an unambiguous win.
    pub fn into_token(self) -> Option<LockToken> {
        match self {
            LockAttempt::Won(token) => Some(token),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: lock key derivation is a pure prefix, preserving
        /// the cache key verbatim.
        #[test]
        fn prop_lock_key_preserves_cache_key(cache_key in ".{0,64}") {
            let lock_key = LockKey::for_entry(&cache_key);
            prop_assert!(lock_key.as_str().starts_with("lock:"));
            prop_assert_eq!(&lock_key.as_str()["lock:".len()..], cache_key.as_str());
        }

        /// Property: consecutive mints never collide.
        #[test]
        fn prop_mint_never_repeats(_dummy in any::<u8>()) {
            let a = LockToken::mint();
            let b = LockToken::mint();
            prop_assert_ne!(a, b);
        }
    }
}
