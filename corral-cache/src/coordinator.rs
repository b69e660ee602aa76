//! Composed protocol surface.
//!
//! One coordinator owns a resolver, a regeneration guard, and a
//! broadcaster over a shared store. It exposes the protocol operations
//! an external fetch pipeline drives; deciding *when* to produce a
//! value stays with that pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use corral_core::{CacheConfig, ConfigError, ErrorSink, StoreError};
use corral_events::InvalidationPublisher;
use corral_store::EntryStore;

use crate::broadcast::InvalidationBroadcaster;
use crate::regen::{RegenerationError, RegenerationGuard};
use crate::resolver::{Authorization, ExpiryResolver, Resolution};
use crate::write;

/// Outcome of a delete as far as this node can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// The local store held the key and dropped it.
    Deleted,
    /// The local store never held the key.
    Missing,
    /// Remote regions were notified; their state is unknowable from
    /// here, so no single honest answer exists.
    Unknown,
}

/// Facade over the regeneration-coordination protocol.
pub struct CacheCoordinator<S, P> {
    store: Arc<S>,
    resolver: ExpiryResolver<S>,
    guard: RegenerationGuard<S>,
    broadcaster: InvalidationBroadcaster<P>,
    config: CacheConfig,
}

impl<S: EntryStore, P: InvalidationPublisher> CacheCoordinator<S, P> {
    /// Build a coordinator over `store` and `publisher`, validating
    /// `config` up front.
    pub fn new(
        store: Arc<S>,
        publisher: Arc<P>,
        sink: Arc<dyn ErrorSink>,
        config: CacheConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            resolver: ExpiryResolver::new(Arc::clone(&store), &config),
            guard: RegenerationGuard::new(Arc::clone(&store), sink, &config),
            broadcaster: InvalidationBroadcaster::new(publisher, &config),
            store,
            config,
        })
    }

    /// The validated configuration this coordinator runs under.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read `key` and decide what the caller should do next.
    pub async fn resolve(&self, key: &str) -> Result<Resolution, StoreError> {
        let current = self.store.get(key).await?;
        self.resolver.resolve(key, current).await
    }

    /// Produce a fresh value for `key` under a previously granted
    /// authorization.
    pub async fn regenerate<F, Fut, E>(
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
        self.guard.run(key, authorization, expires_in, produce).await
    }

    /// Write `value` under `key` with grace-padded retention.
    pub async fn write(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_in: Option<Duration>,
    ) -> Result<(), StoreError> {
        write::write_entry(
            self.store.as_ref(),
            key,
            value,
            expires_in,
            self.config.race_condition_grace,
        )
        .await
    }

    /// Delete `key` locally, then notify remote regions.
    ///
    /// With broadcasting enabled the outcome is [`Deletion::Unknown`]
    /// regardless of what the local store said, since remote copies may
    /// or may not have existed. Without broadcasting the local answer
    /// is the whole truth.
    pub async fn delete(&self, key: &str) -> Result<Deletion, StoreError> {
        let removed = self.store.delete(key).await?;
        if self.broadcaster.is_enabled() {
            self.broadcaster.after_delete(key).await;
            Ok(Deletion::Unknown)
        } else if removed {
            Ok(Deletion::Deleted)
        } else {
            Ok(Deletion::Missing)
        }
    }

    /// Clear the local store, then broadcast a flush.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear_all().await?;
        self.broadcaster.after_clear().await;
        Ok(())
    }
}

impl<S, P> Clone for CacheCoordinator<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: self.resolver.clone(),
            guard: self.guard.clone(),
            broadcaster: self.broadcaster.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
