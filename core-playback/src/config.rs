//! Player configuration.

use std::time::Duration;

/// Configuration for a playback controller and its sample cache.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Maximum number of resident samples in the cache (default: 10)
    pub cache_capacity: usize,

    /// Treat lifecycle protocol violations as fatal (default: false).
    /// When set, an operation invoked from an illegal state panics instead
    /// of returning `InvalidState`. Intended for diagnostic builds.
    pub strict_mode: bool,

    /// Master volume applied while ducked (default: 0.1)
    pub duck_volume: f32,

    /// Deadline for synchronous and asynchronous prepare (default: 5s)
    pub prepare_timeout: Duration,

    /// Buffer size of the controller's event channel (default: 32)
    pub event_buffer: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10,
            strict_mode: false,
            duck_volume: 0.1,
            prepare_timeout: Duration::from_secs(5),
            event_buffer: 32,
        }
    }
}

impl PlayerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sample cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Enable or disable strict protocol handling.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Set the ducked master volume.
    pub fn with_duck_volume(mut self, volume: f32) -> Self {
        self.duck_volume = volume;
        self
    }

    /// Set the prepare deadline.
    pub fn with_prepare_timeout(mut self, timeout: Duration) -> Self {
        self.prepare_timeout = timeout;
        self
    }

    /// Set the event channel buffer size.
    pub fn with_event_buffer(mut self, buffer: usize) -> Self {
        self.event_buffer = buffer;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.duck_volume) {
            return Err("duck_volume must be within [0.0, 1.0]".to_string());
        }

        if self.prepare_timeout.is_zero() {
            return Err("prepare_timeout must be non-zero".to_string());
        }

        if self.event_buffer == 0 {
            return Err("event_buffer must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.cache_capacity, 10);
        assert!(!config.strict_mode);
        assert_eq!(config.duck_volume, 0.1);
        assert_eq!(config.prepare_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PlayerConfig::new()
            .with_cache_capacity(2)
            .with_strict_mode(true)
            .with_duck_volume(0.25)
            .with_prepare_timeout(Duration::from_millis(100));

        assert_eq!(config.cache_capacity, 2);
        assert!(config.strict_mode);
        assert_eq!(config.duck_volume, 0.25);
        assert_eq!(config.prepare_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_config_validation() {
        assert!(PlayerConfig::default().validate().is_ok());

        let zero_capacity = PlayerConfig::default().with_cache_capacity(0);
        assert!(zero_capacity.validate().is_err());

        let bad_duck = PlayerConfig::default().with_duck_volume(1.5);
        assert!(bad_duck.validate().is_err());

        let zero_timeout = PlayerConfig::default().with_prepare_timeout(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());

        let zero_buffer = PlayerConfig::default().with_event_buffer(0);
        assert!(zero_buffer.validate().is_err());
    }
}
