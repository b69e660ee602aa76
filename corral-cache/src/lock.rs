//! Best-effort distributed locking over the shared store.
//!
//! The regeneration lock bounds duplicate work; it is not a
//! correctness guarantee. Acquisition therefore never fails outright:
//! when the store cannot answer, the caller is told it won ambiguously
//! and proceeds, and the stored nonce (if any) expires on its own.

use std::sync::Arc;
use std::time::Duration;

use corral_core::{LockAttempt, LockError, LockKey, LockToken};
use corral_store::{EntryStore, SetIfAbsent};

/// Takes and releases per-key regeneration locks in the shared store.
#[derive(Debug)]
pub struct LockManager<S> {
    store: Arc<S>,
    lock_timeout: Duration,
}

impl<S: EntryStore> LockManager<S> {
    /// Create a manager whose locks self-expire after `lock_timeout`.
    pub fn new(store: Arc<S>, lock_timeout: Duration) -> Self {
        Self {
            store,
            lock_timeout,
        }
    }

    /// Try to take the lock under `lock_key`.
    ///
    /// A fresh nonce is minted per attempt and stored with the
    /// configured timeout as its own expiry, so a crashed holder
    /// cannot starve waiters beyond that window. A store that cannot
    /// answer yields [`LockAttempt::WonAmbiguous`]: the caller
    /// proceeds without a token rather than deadlocking on a store
    /// outage.
    pub async fn acquire(&self, lock_key: &LockKey) -> LockAttempt {
        let token = LockToken::mint();
        match self
            .store
            .set_if_absent(lock_key.as_str(), token.as_str(), self.lock_timeout)
            .await
        {
            Ok(SetIfAbsent::Stored) => LockAttempt::Won(token),
            Ok(SetIfAbsent::Occupied) => LockAttempt::Lost,
            Ok(SetIfAbsent::Indeterminate) => {
                tracing::warn!(
                    lock_key = %lock_key,
                    "Lock acquisition indeterminate, proceeding without token"
                );
                LockAttempt::WonAmbiguous
            }
            Err(error) => {
                tracing::warn!(
                    lock_key = %lock_key,
                    error = %error,
                    "Store unreachable during lock acquisition, proceeding without token"
                );
                LockAttempt::WonAmbiguous
            }
        }
    }

    /// Give the lock back, provided `nonce` still owns it.
    ///
    /// An empty nonce is rejected before the store is consulted. A
    /// non-matching stored value is a silent no-op: the lock already
    /// expired and may have been re-won, and deleting it would steal
    /// it from the new holder.
    pub async fn release(&self, lock_key: &LockKey, nonce: &str) -> Result<(), LockError> {
        if nonce.is_empty() {
            return Err(LockError::EmptyNonce);
        }
        self.store
            .delete_if_equals(lock_key.as_str(), nonce)
            .await?;
        Ok(())
    }
}

impl<S> Clone for LockManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            lock_timeout: self.lock_timeout,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
