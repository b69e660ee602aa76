//! Regeneration execution with stale fallback.
//!
//! The guard wraps the caller's value-producing step. Success writes
//! the fresh value through the grace-adjusted retention path; failure
//! falls back to the captured stale entry when one exists, reporting
//! the swallowed error to the sink. The lock release sits on the one
//! exit path every outcome flows through.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use corral_core::{CacheConfig, ErrorSink, StoreError};
use corral_store::EntryStore;
use thiserror::Error;

use crate::lock::LockManager;
use crate::resolver::Authorization;
use crate::write;

/// Failure of a coordinated regeneration.
#[derive(Debug, Error)]
pub enum RegenerationError<E> {
    /// The value-producing step failed.
    #[error("Value production failed: {0}")]
    Produce(#[source] E),

    /// The fresh value could not be written back.
    #[error("Fresh value write failed: {0}")]
    Store(#[from] StoreError),
}

/// Runs authorized regenerations: produce, write through, stale on
/// failure, release.
pub struct RegenerationGuard<S> {
    store: Arc<S>,
    locks: LockManager<S>,
    grace: Option<Duration>,
    sink: Arc<dyn ErrorSink>,
}

impl<S: EntryStore> RegenerationGuard<S> {
    /// Build a guard over `store`, reporting swallowed failures to
    /// `sink`.
    pub fn new(store: Arc<S>, sink: Arc<dyn ErrorSink>, config: &CacheConfig) -> Self {
        Self {
            locks: LockManager::new(Arc::clone(&store), config.lock_timeout),
            store,
            grace: config.race_condition_grace,
            sink,
        }
    }

    /// Produce a fresh value for `key` under `authorization`.
    ///
    /// On success the value is written with the grace-padded retention
    /// and returned. On failure of the produce step or the write, the
    /// captured stale entry (if any) is served instead and the failure
    /// goes to the error sink exactly once; a cold miss propagates the
    /// failure unchanged. The lock is release-attempted exactly once
    /// on every path, but only when the authorization holds a genuine
    /// token. An ambiguous win has no nonce and its lock record, if
    /// one exists, is left to expire on its own.
    pub async fn run<F, Fut, E>(
        &self,
        key: &str,
        authorization: Authorization,
        expires_in: Option<Duration>,
        produce: F,
    ) -> Result<Vec<u8>, RegenerationError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let Authorization {
            lock_key,
            token,
            stale,
        } = authorization;

        let produced = self.produce_and_write(key, expires_in, produce).await;

        if let Some(token) = token {
            if let Err(error) = self.locks.release(&lock_key, token.as_str()).await {
                tracing::warn!(
                    lock_key = %lock_key,
                    error = %error,
                    "Failed to release regeneration lock"
                );
            }
        }

        match produced {
            Ok(value) => Ok(value),
            Err(error) => match stale {
                Some(entry) => {
                    self.sink.report(&error);
                    tracing::warn!(key, error = %error, "Regeneration failed, serving stale entry");
                    Ok(entry.value)
                }
                None => Err(error),
            },
        }
    }

    async fn produce_and_write<F, Fut, E>(
        &self,
        key: &str,
        expires_in: Option<Duration>,
        produce: F,
    ) -> Result<Vec<u8>, RegenerationError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, E>>,
    {
        let value = produce().await.map_err(RegenerationError::Produce)?;
        write::write_entry(self.store.as_ref(), key, value.clone(), expires_in, self.grace).await?;
        Ok(value)
    }
}

impl<S> Clone for RegenerationGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: self.locks.clone(),
            grace: self.grace,
            sink: Arc::clone(&self.sink),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
