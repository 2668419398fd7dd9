//! Batch processor configuration loaded from environment variables.

use std::time::Duration;

/// Processor settings with sensible defaults.
///
/// Reads from environment variables:
/// - `STATS_BATCH_SIZE` — max outbox rows per batch (default: `100`)
/// - `STATS_POLL_INTERVAL_MS` — delay between batches (default: `1000`)
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub batch_size: usize,
    pub poll_interval: Duration,
}

impl ProcessorConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: std::env::var("STATS_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.batch_size),
            poll_interval: std::env::var("STATS_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_millis(1000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = ProcessorConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
    }
}
