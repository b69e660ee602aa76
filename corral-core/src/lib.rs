//! Corral Core - Shared types for cache regeneration coordination
//!
//! Defines the vocabulary used across the corral crates: cache entries
//! with logical expiry, lock identities, the error taxonomy, the error
//! reporting sink, and configuration.

pub mod config;
pub mod entry;
pub mod error;
pub mod sink;
pub mod token;

pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use error::{ConfigError, CorralError, CorralResult, LockError, PublishError, StoreError};
pub use sink::{ErrorSink, NullSink};
pub use token::{LockAttempt, LockKey, LockToken};
