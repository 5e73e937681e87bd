use serde::{Deserialize, Serialize};
use std::time::Duration;
use sync_framework::SyncSettings;
use tracing::warn;

/// Prefix for every environment variable the directory reads.
pub const ENV_PREFIX: &str = "EXPERT_SYNC_";

/// Wiring configuration for a [`DirectorySystem`](super::DirectorySystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub sync: SyncSettings,
    /// Artificial latency of every store request.
    pub store_latency_ms: u64,
    /// Capacity of each store's request queue.
    pub buffer_size: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            sync: SyncSettings::default(),
            store_latency_ms: 0,
            buffer_size: 32,
        }
    }
}

impl SystemConfig {
    /// Reads `EXPERT_SYNC_*` variables on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self {
            sync: SyncSettings::from_env(ENV_PREFIX),
            ..Self::default()
        };
        let key = format!("{ENV_PREFIX}STORE_LATENCY_MS");
        if let Ok(raw) = std::env::var(&key) {
            match raw.trim().parse() {
                Ok(ms) => config.store_latency_ms = ms,
                Err(_) => warn!(%key, %raw, "Ignoring unparseable setting"),
            }
        }
        config
    }

    pub fn store_latency(&self) -> Duration {
        Duration::from_millis(self.store_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_sync_settings_deserialize() {
        let config: SystemConfig =
            serde_json::from_str(r#"{ "store_latency_ms": 40, "sync": { "reveal_delay_ms": 10 } }"#).unwrap();
        assert_eq!(config.store_latency(), Duration::from_millis(40));
        assert_eq!(config.sync.reveal_delay_ms, 10);
        assert_eq!(config.buffer_size, 32);
    }
}
