use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the slot_swap module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotSwapConfig {
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    /// Outbound buffer per realtime connection, in events.
    #[serde(default = "default_realtime_buffer")]
    pub realtime_buffer: usize,
    /// Pending requests older than this are rejected automatically.
    #[serde(default, with = "humantime_serde")]
    pub pending_ttl: Option<Duration>,
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for SlotSwapConfig {
    fn default() -> Self {
        Self {
            max_title_length: default_max_title_length(),
            realtime_buffer: default_realtime_buffer(),
            pending_ttl: None,
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl SlotSwapConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_title_length: self.max_title_length,
            pending_ttl: self.pending_ttl,
            sweep_interval: self.sweep_interval,
        }
    }
}

fn default_max_title_length() -> usize {
    200
}

fn default_realtime_buffer() -> usize {
    64
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(30)
}
