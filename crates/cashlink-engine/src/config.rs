//! Link engine configuration.

use cashlink_core::constants::{
    DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_EVENT_BUFFER, DEFAULT_POLL_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one device link.
///
/// # Example
///
/// ```
/// use cashlink_engine::LinkConfig;
/// use std::time::Duration;
///
/// let config = LinkConfig {
///     poll_interval: Duration::from_millis(100),
///     ..LinkConfig::default()
/// };
/// assert_eq!(config.debounce, Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Interval between idle status polls.
    pub poll_interval: Duration,

    /// Delay before polling resumes after a command completes. Exists
    /// because the transport callback can fire asynchronously close to a
    /// tick boundary; polling straight away could race a reply still in
    /// transit.
    pub debounce: Duration,

    /// Default per-command reply deadline, counted from the moment the
    /// command is written. `submit_with_timeout` overrides it per call.
    pub command_timeout: Duration,

    /// Buffer depth of each unsolicited-event subscription.
    pub event_buffer: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            debounce: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            command_timeout: Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(200));
        assert_eq!(config.debounce, config.poll_interval);
        assert_eq!(config.command_timeout, Duration::from_millis(1000));
        assert_eq!(config.event_buffer, 32);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: LinkConfig =
            serde_json::from_str(r#"{"poll_interval":{"secs":0,"nanos":500000000}}"#).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.command_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = LinkConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: LinkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.poll_interval, config.poll_interval);
        assert_eq!(back.event_buffer, config.event_buffer);
    }
}
