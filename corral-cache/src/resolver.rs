//! Expiry resolution: serve, regenerate, or wait.
//!
//! The resolver owns *who may regenerate* and what everyone else does
//! meanwhile. It never produces a value itself; winners get an
//! [`Authorization`] and hand it to the regeneration guard.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use corral_core::{CacheConfig, CacheEntry, LockAttempt, LockKey, LockToken, StoreError};
use corral_store::EntryStore;

use crate::lock::LockManager;

/// Permission to regenerate one key.
///
/// Carries the lock identity to release afterwards (absent for
/// ambiguous wins) and the stale entry captured as a fallback. Handed
/// out only by the resolver; consumed by value by the guard so it
/// cannot outlive the attempt it belongs to.
#[derive(Debug)]
pub struct Authorization {
    pub(crate) lock_key: LockKey,
    pub(crate) token: Option<LockToken>,
    pub(crate) stale: Option<CacheEntry>,
}

impl Authorization {
    /// Whether the acquisition was genuine rather than ambiguous.
    pub fn holds_token(&self) -> bool {
        self.token.is_some()
    }

    /// The stale entry available as a fallback, if one was captured.
    pub fn stale_entry(&self) -> Option<&CacheEntry> {
        self.stale.as_ref()
    }
}

/// What a read should do next.
#[derive(Debug)]
pub enum Resolution {
    /// A usable entry; serve it as-is.
    Serve(CacheEntry),
    /// The caller holds regeneration duty for this key.
    Regenerate(Authorization),
    /// Coordination is disabled; the caller applies its ordinary
    /// expiry policy to whatever the store held.
    Uncoordinated(Option<CacheEntry>),
}

/// Decides, per read, between serving, regenerating, and waiting.
pub struct ExpiryResolver<S> {
    store: Arc<S>,
    locks: LockManager<S>,
    retry_backoff: Duration,
    enabled: bool,
}

impl<S: EntryStore> ExpiryResolver<S> {
    /// Build a resolver over `store` with `config`'s timing knobs.
    pub fn new(store: Arc<S>, config: &CacheConfig) -> Self {
        Self {
            locks: LockManager::new(Arc::clone(&store), config.lock_timeout),
            store,
            retry_backoff: config.lock_retry_backoff,
            enabled: config.race_handling_enabled(),
        }
    }

    /// Decide what a read of `key` should do, given the entry the
    /// store currently holds.
    ///
    /// Fresh entries are served. Expired entries race once for the
    /// regeneration lock; losers serve the stale copy. Absent entries
    /// poll until a rival publishes a value or the lock is won; every
    /// round of that loop awaits, so a caller's own deadline or drop
    /// cancels the wait at any point. With coordination disabled this
    /// is a verbatim passthrough.
    pub async fn resolve(
        &self,
        key: &str,
        current: Option<CacheEntry>,
    ) -> Result<Resolution, StoreError> {
        if !self.enabled {
            return Ok(Resolution::Uncoordinated(current));
        }
        let lock_key = LockKey::for_entry(key);
        match current {
            Some(entry) if !entry.is_expired(Utc::now()) => Ok(Resolution::Serve(entry)),
            Some(stale) => Ok(self.race_for_stale(lock_key, stale).await),
            None => self.wait_for_value(key, lock_key).await,
        }
    }

    /// Expired entry: one shot at the lock, stale for the losers.
    async fn race_for_stale(&self, lock_key: LockKey, stale: CacheEntry) -> Resolution {
        match self.locks.acquire(&lock_key).await {
            LockAttempt::Won(token) => Resolution::Regenerate(Authorization {
                lock_key,
                token: Some(token),
                stale: Some(stale),
            }),
            LockAttempt::WonAmbiguous => Resolution::Regenerate(Authorization {
                lock_key,
                token: None,
                stale: Some(stale),
            }),
            LockAttempt::Lost => {
                tracing::debug!(lock_key = %lock_key, "Lost regeneration race, serving stale");
                Resolution::Serve(stale)
            }
        }
    }

    /// No entry at all: poll until the rival's value appears or the
    /// lock falls to us. Bounded by the rival lock's self-expiry.
    async fn wait_for_value(&self, key: &str, lock_key: LockKey) -> Result<Resolution, StoreError> {
        loop {
            match self.locks.acquire(&lock_key).await {
                LockAttempt::Won(token) => {
                    return Ok(Resolution::Regenerate(Authorization {
                        lock_key,
                        token: Some(token),
                        stale: None,
                    }))
                }
                LockAttempt::WonAmbiguous => {
                    return Ok(Resolution::Regenerate(Authorization {
                        lock_key,
                        token: None,
                        stale: None,
                    }))
                }
                LockAttempt::Lost => {
                    tracing::trace!(key, "Waiting for rival regeneration");
                    tokio::time::sleep(self.retry_backoff).await;
                    if let Some(entry) = self.store.get(key).await? {
                        return Ok(Resolution::Serve(entry));
                    }
                }
            }
        }
    }
}

impl<S> Clone for ExpiryResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: self.locks.clone(),
            retry_backoff: self.retry_backoff,
            enabled: self.enabled,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use corral_store::InMemoryStore;

    fn coordinating_config() -> CacheConfig {
        CacheConfig::new().with_race_condition_grace(Duration::from_secs(30))
    }

    fn fresh_entry(value: &[u8]) -> CacheEntry {
        CacheEntry::expiring_at(value.to_vec(), Utc::now() + ChronoDuration::seconds(60))
    }

    fn expired_entry(value: &[u8]) -> CacheEntry {
        CacheEntry::expiring_at(value.to_vec(), Utc::now() - ChronoDuration::seconds(1))
    }

    #[tokio::test]
    async fn test_disabled_passthrough() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = ExpiryResolver::new(Arc::clone(&store), &CacheConfig::default());

        let entry = expired_entry(b"v");
        match resolver.resolve("k", Some(entry.clone())).await.unwrap() {
            Resolution::Uncoordinated(Some(passed)) => assert_eq!(passed, entry),
            other => panic!("expected passthrough, got {:?}", other),
        }
        match resolver.resolve("k", None).await.unwrap() {
            Resolution::Uncoordinated(None) => {}
            other => panic!("expected passthrough, got {:?}", other),
        }

        // No locking happened, so the lock key is still free.
        assert_eq!(
            store
                .set_if_absent("lock:k", "probe", Duration::from_secs(1))
                .await
                .unwrap(),
            corral_store::SetIfAbsent::Stored
        );
    }

    #[tokio::test]
    async fn test_fresh_entry_served_without_locking() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = ExpiryResolver::new(Arc::clone(&store), &coordinating_config());

        let entry = fresh_entry(b"v");
        match resolver.resolve("k", Some(entry.clone())).await.unwrap() {
            Resolution::Serve(served) => assert_eq!(served, entry),
            other => panic!("expected serve, got {:?}", other),
        }
        assert_eq!(
            store
                .set_if_absent("lock:k", "probe", Duration::from_secs(1))
                .await
                .unwrap(),
            corral_store::SetIfAbsent::Stored
        );
    }

    #[tokio::test]
    async fn test_expired_entry_winner_gets_stale_fallback() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = ExpiryResolver::new(Arc::clone(&store), &coordinating_config());

        let entry = expired_entry(b"old");
        match resolver.resolve("k", Some(entry.clone())).await.unwrap() {
            Resolution::Regenerate(authorization) => {
                assert!(authorization.holds_token());
                assert_eq!(authorization.stale_entry(), Some(&entry));
            }
            other => panic!("expected regenerate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_entry_loser_serves_stale() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_if_absent("lock:k", "rival", Duration::from_secs(5))
            .await
            .unwrap();
        let resolver = ExpiryResolver::new(Arc::clone(&store), &coordinating_config());

        let entry = expired_entry(b"old");
        match resolver.resolve("k", Some(entry.clone())).await.unwrap() {
            Resolution::Serve(served) => assert_eq!(served, entry),
            other => panic!("expected stale serve, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cold_miss_winner_has_no_fallback() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = ExpiryResolver::new(Arc::clone(&store), &coordinating_config());

        match resolver.resolve("k", None).await.unwrap() {
            Resolution::Regenerate(authorization) => {
                assert!(authorization.holds_token());
                assert!(authorization.stale_entry().is_none());
            }
            other => panic!("expected regenerate, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_serves_value_published_by_rival() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_if_absent("lock:k", "rival", Duration::from_secs(5))
            .await
            .unwrap();
        let resolver = ExpiryResolver::new(Arc::clone(&store), &coordinating_config());

        let waiter = {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve("k", None).await })
        };

        // Let the waiter go through at least one lost round first.
        tokio::time::sleep(Duration::from_millis(150)).await;
        store
            .write("k", fresh_entry(b"rival-value"), None)
            .await
            .unwrap();

        match waiter.await.unwrap().unwrap() {
            Resolution::Serve(entry) => assert_eq!(entry.value, b"rival-value"),
            other => panic!("expected rival value, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_wins_after_rival_lock_expires() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_if_absent("lock:k", "crashed-rival", Duration::from_secs(5))
            .await
            .unwrap();
        let resolver = ExpiryResolver::new(Arc::clone(&store), &coordinating_config());

        match resolver.resolve("k", None).await.unwrap() {
            Resolution::Regenerate(authorization) => assert!(authorization.holds_token()),
            other => panic!("expected regenerate, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_cancellable_by_external_deadline() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set_if_absent("lock:k", "rival", Duration::from_secs(60))
            .await
            .unwrap();
        let resolver = ExpiryResolver::new(Arc::clone(&store), &coordinating_config());

        let result =
            tokio::time::timeout(Duration::from_millis(350), resolver.resolve("k", None)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ambiguous_win_carries_no_token() {
        use async_trait::async_trait;
        use corral_core::StoreError;
        use corral_store::SetIfAbsent;

        struct DownStore;

        #[async_trait]
        impl EntryStore for DownStore {
            async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, StoreError> {
                Ok(None)
            }
            async fn write(
                &self,
                _key: &str,
                _entry: CacheEntry,
                _ttl: Option<Duration>,
            ) -> Result<(), StoreError> {
                Ok(())
            }
            async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
                Ok(false)
            }
            async fn clear_all(&self) -> Result<(), StoreError> {
                Ok(())
            }
            async fn set_if_absent(
                &self,
                _key: &str,
                _value: &str,
                _ttl: Duration,
            ) -> Result<SetIfAbsent, StoreError> {
                Err(StoreError::Unavailable {
                    reason: "scripted outage".to_string(),
                })
            }
            async fn delete_if_equals(
                &self,
                _key: &str,
                _expected: &str,
            ) -> Result<bool, StoreError> {
                Ok(false)
            }
        }

        let resolver = ExpiryResolver::new(Arc::new(DownStore), &coordinating_config());

        match resolver
            .resolve("k", Some(expired_entry(b"old")))
            .await
            .unwrap()
        {
            Resolution::Regenerate(authorization) => {
                assert!(!authorization.holds_token());
                assert!(authorization.stale_entry().is_some());
            }
            other => panic!("expected ambiguous regenerate, got {:?}", other),
        }
    }
}
