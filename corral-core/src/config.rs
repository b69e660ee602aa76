//! Configuration for cache coordination behavior.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for regeneration coordination and invalidation fan-out.
///
/// Coordination is off until a race-condition grace period is set;
/// broadcast is off until a topic is set. Everything else has a
/// serviceable default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a regeneration lock lives in the store before expiring
    /// on its own. Bounds how long a crashed regenerator can block
    /// waiters.
    pub lock_timeout: Duration,
    /// Pause between polls while waiting for a rival regeneration to
    /// publish a value.
    pub lock_retry_backoff: Duration,
    /// Extra physical retention past logical expiry, keeping a stale
    /// copy readable during regeneration. Setting this enables the
    /// whole coordination protocol.
    pub race_condition_grace: Option<Duration>,
    /// Event topic for cross-region invalidation. Unset disables
    /// broadcasting entirely.
    pub broadcast_topic: Option<String>,
    /// Regions invalidation events fan out to. Empty means a single
    /// unqualified event.
    pub broadcast_regions: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            lock_retry_backoff: Duration::from_millis(100),
            race_condition_grace: None,
            broadcast_topic: None,
            broadcast_regions: Vec::new(),
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lock self-expiry timeout.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the wait-loop poll backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.lock_retry_backoff = backoff;
        self
    }

    /// Set the race-condition grace period, enabling coordination.
    pub fn with_race_condition_grace(mut self, grace: Duration) -> Self {
        self.race_condition_grace = Some(grace);
        self
    }

    /// Set the broadcast topic, enabling invalidation fan-out.
    pub fn with_broadcast_topic(mut self, topic: impl Into<String>) -> Self {
        self.broadcast_topic = Some(topic.into());
        self
    }

    /// Set the regions invalidation events fan out to.
    pub fn with_broadcast_regions(mut self, regions: Vec<String>) -> Self {
        self.broadcast_regions = regions;
        self
    }

    /// Whether expired reads go through the locking protocol.
    pub fn race_handling_enabled(&self) -> bool {
        self.race_condition_grace.is_some()
    }

    /// Whether local deletes and clears fan out to other regions.
    pub fn broadcast_enabled(&self) -> bool {
        self.broadcast_topic.is_some()
    }

    /// Validate field values, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "lock_timeout".to_string(),
                value: format!("{:?}", self.lock_timeout),
                reason: "must be positive".to_string(),
            });
        }

        if self.lock_retry_backoff.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "lock_retry_backoff".to_string(),
                value: format!("{:?}", self.lock_retry_backoff),
                reason: "must be positive".to_string(),
            });
        }

        if let Some(grace) = self.race_condition_grace {
            if grace.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: "race_condition_grace".to_string(),
                    value: format!("{:?}", grace),
                    reason: "must be positive when set".to_string(),
                });
            }
        }

        if let Some(topic) = &self.broadcast_topic {
            if topic.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "broadcast_topic".to_string(),
                    value: topic.clone(),
                    reason: "must not be blank".to_string(),
                });
            }
        }

        if let Some(region) = self.broadcast_regions.iter().find(|r| r.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "broadcast_regions".to_string(),
                value: region.clone(),
                reason: "regions must not be blank".to_string(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.lock_retry_backoff, Duration::from_millis(100));
        assert_eq!(config.race_condition_grace, None);
        assert_eq!(config.broadcast_topic, None);
        assert!(config.broadcast_regions.is_empty());
        assert!(!config.race_handling_enabled());
        assert!(!config.broadcast_enabled());
    }

    #[test]
    fn test_builder_chain() {
        let config = CacheConfig::new()
            .with_lock_timeout(Duration::from_secs(10))
            .with_retry_backoff(Duration::from_millis(50))
            .with_race_condition_grace(Duration::from_secs(30))
            .with_broadcast_topic("cache-invalidations")
            .with_broadcast_regions(vec!["us-east".to_string(), "us-west".to_string()]);

        assert_eq!(config.lock_timeout, Duration::from_secs(10));
        assert_eq!(config.lock_retry_backoff, Duration::from_millis(50));
        assert_eq!(config.race_condition_grace, Some(Duration::from_secs(30)));
        assert_eq!(config.broadcast_topic.as_deref(), Some("cache-invalidations"));
        assert_eq!(config.broadcast_regions.len(), 2);
        assert!(config.race_handling_enabled());
        assert!(config.broadcast_enabled());
    }

    #[test]
    fn test_default_config_validates() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_lock_timeout() {
        let config = CacheConfig::new().with_lock_timeout(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "lock_timeout"));
    }

    #[test]
    fn test_validate_rejects_zero_backoff() {
        let config = CacheConfig::new().with_retry_backoff(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "lock_retry_backoff")
        );
    }

    #[test]
    fn test_validate_rejects_zero_grace() {
        let config = CacheConfig::new().with_race_condition_grace(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "race_condition_grace")
        );
    }

    #[test]
    fn test_validate_rejects_blank_topic() {
        let config = CacheConfig::new().with_broadcast_topic("   ");
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "broadcast_topic")
        );
    }

    #[test]
    fn test_validate_rejects_blank_region() {
        let config = CacheConfig::new()
            .with_broadcast_topic("cache-invalidations")
            .with_broadcast_regions(vec!["us-east".to_string(), "".to_string()]);
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "broadcast_regions")
        );
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = CacheConfig::new()
            .with_race_condition_grace(Duration::from_secs(30))
            .with_broadcast_topic("cache-invalidations")
            .with_broadcast_regions(vec!["us-east".to_string()]);

        let json = serde_json::to_string(&config).unwrap();
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
