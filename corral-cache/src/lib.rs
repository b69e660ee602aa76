//! Corral Cache - Regeneration Coordination over a Shared Store
//!
//! Implements stale-while-revalidate with distributed locking: when an
//! entry expires, exactly one caller regenerates it while rivals keep
//! serving the stale copy, and local invalidations fan out to remote
//! regions over an event bus.

pub mod broadcast;
pub mod coordinator;
pub mod lock;
pub mod regen;
pub mod resolver;
pub mod sink;
pub mod write;

pub use broadcast::InvalidationBroadcaster;
pub use coordinator::{CacheCoordinator, Deletion};
pub use lock::LockManager;
pub use regen::{RegenerationError, RegenerationGuard};
pub use resolver::{Authorization, ExpiryResolver, Resolution};
pub use sink::LoggingSink;
pub use write::{effective_ttl, write_entry};

// Re-export the shared types callers need to drive the protocol
pub use corral_core::{
    CacheConfig, CacheEntry, ConfigError, CorralError, CorralResult, ErrorSink, LockAttempt,
    LockError, LockKey, LockToken, NullSink, PublishError, StoreError,
};

// Re-export the store and event seams for implementors and tests
pub use corral_events::{
    InvalidationEvent, InvalidationPublisher, RecordingPublisher, FLUSH_PAYLOAD,
};
pub use corral_store::{EntryStore, InMemoryStore, SetIfAbsent};
