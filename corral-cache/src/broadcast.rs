//! Cross-region invalidation fan-out.
//!
//! After a local delete or clear succeeds, one notice per configured
//! region goes out on the event bus. Delivery is best effort: a failed
//! publish is logged and the remaining regions are still attempted,
//! since remote copies self-expire even when a notice is lost.

use std::sync::Arc;

use corral_core::CacheConfig;
use corral_events::{InvalidationEvent, InvalidationPublisher};

/// Fans invalidation notices out to every configured region.
pub struct InvalidationBroadcaster<P> {
    publisher: Arc<P>,
    topic: Option<String>,
    regions: Vec<String>,
}

impl<P: InvalidationPublisher> InvalidationBroadcaster<P> {
    /// Build a broadcaster over `publisher` with the topic and regions
    /// from `config`.
    pub fn new(publisher: Arc<P>, config: &CacheConfig) -> Self {
        Self {
            publisher,
            topic: config.broadcast_topic.clone(),
            regions: config.broadcast_regions.clone(),
        }
    }

    /// Whether broadcasting is configured at all.
    pub fn is_enabled(&self) -> bool {
        self.topic.is_some()
    }

    /// Announce that `key` was deleted locally. Returns how many
    /// notices were delivered.
    pub async fn after_delete(&self, key: &str) -> usize {
        self.fan_out(|topic, region| InvalidationEvent::delete(topic, key, region))
            .await
    }

    /// Announce that the whole cache was cleared locally. Returns how
    /// many notices were delivered.
    pub async fn after_clear(&self) -> usize {
        self.fan_out(|topic, region| InvalidationEvent::flush(topic, region))
            .await
    }

    async fn fan_out<F>(&self, event_for: F) -> usize
    where
        F: Fn(&str, Option<String>) -> InvalidationEvent,
    {
        let topic = match &self.topic {
            Some(topic) => topic,
            None => return 0,
        };

        let targets: Vec<Option<String>> = if self.regions.is_empty() {
            vec![None]
        } else {
            self.regions.iter().cloned().map(Some).collect()
        };

        let mut delivered = 0;
        for region in targets {
            let event = event_for(topic, region);
            match self.publisher.publish(&event).await {
                Ok(()) => delivered += 1,
                Err(error) => {
                    tracing::warn!(
                        topic = %topic,
                        region = event.region.as_deref().unwrap_or("default"),
                        error = %error,
                        "Failed to publish invalidation notice"
                    );
                }
            }
        }
        delivered
    }
}

impl<P> Clone for InvalidationBroadcaster<P> {
    fn clone(&self) -> Self {
        Self {
            publisher: Arc::clone(&self.publisher),
            topic: self.topic.clone(),
            regions: self.regions.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
