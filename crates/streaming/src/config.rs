use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the focus sync channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Relay WebSocket endpoint.
    pub url: String,

    /// Minimum interval between outbound focus updates (ms).
    pub min_send_interval_ms: u64,

    /// First reconnect delay (ms); doubles per failure.
    pub retry_initial_ms: u64,

    /// Reconnect delay cap (ms).
    pub retry_max_ms: u64,

    /// Consecutive failed connects before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,

    /// Queued control events before new ones are dropped.
    pub control_queue: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:9300/ws".to_string(),
            min_send_interval_ms: 33,
            retry_initial_ms: 250,
            retry_max_ms: 10_000,
            max_attempts: None,
            control_queue: 64,
        }
    }
}

impl SyncConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn min_send_interval(&self) -> Duration {
        Duration::from_millis(self.min_send_interval_ms)
    }

    pub fn retry_initial(&self) -> Duration {
        Duration::from_millis(self.retry_initial_ms)
    }

    pub fn retry_max(&self) -> Duration {
        Duration::from_millis(self.retry_max_ms)
    }
}
