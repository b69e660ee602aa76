//! Error types for corral operations

use thiserror::Error;

/// Shared store transport and integrity errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Store operation {operation} failed: {reason}")]
    OperationFailed { operation: String, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Regeneration lock errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("Lock release requires a non-empty nonce")]
    EmptyNonce,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Invalidation broadcast errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("Publish to topic {topic} failed: {reason}")]
    Failed { topic: String, reason: String },

    #[error("Event bus disconnected: {reason}")]
    Disconnected { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all corral errors.
#[derive(Debug, Clone, Error)]
pub enum CorralError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for corral operations.
pub type CorralResult<T> = Result<T, CorralError>;

// =============================================================================
// TESTS
// =============================================================================
