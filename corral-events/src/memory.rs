//! Publisher double that records instead of delivering.

use std::sync::Mutex;

use async_trait::async_trait;
use corral_core::PublishError;

use crate::{InvalidationEvent, InvalidationPublisher};

/// Captures published notices in memory.
///
/// Tests assert fan-out against the recorded list; scripted failures
/// exercise best-effort publish paths. Also serves single-process
/// deployments that only want local invalidation bookkeeping.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<InvalidationEvent>>,
    failures_remaining: Mutex<u32>,
}

impl RecordingPublisher {
    /// Create a publisher with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` publishes before recording resumes.
    pub fn fail_next(&self, count: u32) {
        *self.failures_remaining.lock().unwrap() = count;
    }

    /// Snapshot of everything published so far, in publish order.
    pub fn events(&self) -> Vec<InvalidationEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of notices recorded so far.
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl InvalidationPublisher for RecordingPublisher {
    async fn publish(&self, event: &InvalidationEvent) -> Result<(), PublishError> {
        {
            let mut failures = self.failures_remaining.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(PublishError::Failed {
                    topic: event.topic.clone(),
                    reason: "scripted failure".to_string(),
                });
            }
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
