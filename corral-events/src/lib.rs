//! Corral Events - Invalidation fan-out types
//!
//! Cross-region invalidation rides an external event bus: after a
//! local delete or clear, one notice per target region tells remote
//! cache nodes to drop their own copies. This crate defines the notice
//! shape and the publish capability; delivery, subscription, and
//! regional routing belong to the bus implementation.

use async_trait::async_trait;
use corral_core::PublishError;
use serde::{Deserialize, Serialize};

pub mod memory;

pub use memory::RecordingPublisher;

/// Payload signalling a full-store flush rather than a single key.
pub const FLUSH_PAYLOAD: &str = "FLUSHDB";

/// One cross-region invalidation notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Event bus topic the notice is published under.
    pub topic: String,
    /// Cache key to drop, or [`FLUSH_PAYLOAD`] for a full flush.
    pub key: String,
    /// Target region; `None` addresses the bus default region.
    pub region: Option<String>,
}

impl InvalidationEvent {
    /// Notice that a single key was deleted.
    pub fn delete(
        topic: impl Into<String>,
        key: impl Into<String>,
        region: Option<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            region,
        }
    }

    /// Notice that the whole cache was cleared.
    pub fn flush(topic: impl Into<String>, region: Option<String>) -> Self {
        Self {
            topic: topic.into(),
            key: FLUSH_PAYLOAD.to_string(),
            region,
        }
    }

    /// Whether this notice asks for a full flush.
    pub fn is_flush(&self) -> bool {
        self.key == FLUSH_PAYLOAD
    }
}

/// Event bus capability for invalidation notices.
///
/// Fire-and-forget from the cache's perspective: no delivery
/// acknowledgment is required, and the caller decides what a failed
/// publish means.
#[async_trait]
pub trait InvalidationPublisher: Send + Sync {
    /// Deliver one notice.
    async fn publish(&self, event: &InvalidationEvent) -> Result<(), PublishError>;
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_event_carries_key_and_region() {
        let event = InvalidationEvent::delete("cache", "users/42", Some("us-east".to_string()));
        assert_eq!(event.topic, "cache");
        assert_eq!(event.key, "users/42");
        assert_eq!(event.region.as_deref(), Some("us-east"));
        assert!(!event.is_flush());
    }

    #[test]
    fn test_flush_event_uses_designated_payload() {
        let event = InvalidationEvent::flush("cache", None);
        assert_eq!(event.key, FLUSH_PAYLOAD);
        assert_eq!(event.region, None);
        assert!(event.is_flush());
    }

    #[test]
    fn test_event_wire_shape() {
        let event = InvalidationEvent::delete("cache", "k", Some("eu-west".to_string()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "topic": "cache",
                "key": "k",
                "region": "eu-west",
            })
        );

        let back: InvalidationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_unqualified_event_serializes_null_region() {
        let event = InvalidationEvent::flush("cache", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["region"], serde_json::Value::Null);
    }
}
