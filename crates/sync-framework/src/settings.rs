//! Plain-data settings shared by the loader and the collection.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Tunables that can come from a config file or the environment.
///
/// Callbacks and messages are not settings; they stay on the per-component
/// option builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Minimum latency before a loading indicator may appear.
    pub reveal_delay_ms: u64,
    /// Lifetime of emitted notifications; `0` keeps them until dismissed.
    pub notification_duration_ms: u64,
    /// Whether load failures emit an error notification.
    pub notify_load_errors: bool,
    /// Whether collection mutations on the same key wait for each other.
    pub serialize_per_key: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            reveal_delay_ms: 300,
            notification_duration_ms: 5000,
            notify_load_errors: true,
            serialize_per_key: true,
        }
    }
}

impl SyncSettings {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    /// Defaults overridden by `{prefix}REVEAL_DELAY_MS`,
    /// `{prefix}NOTIFICATION_DURATION_MS`, `{prefix}NOTIFY_LOAD_ERRORS` and
    /// `{prefix}SERIALIZE_PER_KEY`. Unparseable values are logged and ignored.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        override_with(&lookup, prefix, "REVEAL_DELAY_MS", &mut settings.reveal_delay_ms);
        override_with(
            &lookup,
            prefix,
            "NOTIFICATION_DURATION_MS",
            &mut settings.notification_duration_ms,
        );
        override_with(&lookup, prefix, "NOTIFY_LOAD_ERRORS", &mut settings.notify_load_errors);
        override_with(&lookup, prefix, "SERIALIZE_PER_KEY", &mut settings.serialize_per_key);
        settings
    }
}

fn override_with<V>(lookup: &impl Fn(&str) -> Option<String>, prefix: &str, name: &str, slot: &mut V)
where
    V: std::str::FromStr,
{
    let key = format!("{prefix}{name}");
    if let Some(raw) = lookup(&key) {
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!(%key, %raw, "Ignoring unparseable setting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let settings = SyncSettings::default();
        assert_eq!(settings.reveal_delay(), Duration::from_millis(300));
        assert_eq!(settings.notification_duration(), Duration::from_millis(5000));
        assert!(settings.notify_load_errors);
        assert!(settings.serialize_per_key);
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let settings: SyncSettings =
            serde_json::from_str(r#"{ "reveal_delay_ms": 150, "serialize_per_key": false }"#).unwrap();
        assert_eq!(settings.reveal_delay_ms, 150);
        assert!(!settings.serialize_per_key);
        assert_eq!(settings.notification_duration_ms, 5000);
    }

    #[test]
    fn env_overrides_skip_bad_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("APP_REVEAL_DELAY_MS", "120"),
            ("APP_NOTIFY_LOAD_ERRORS", "false"),
            ("APP_NOTIFICATION_DURATION_MS", "soon"),
        ]);
        let settings = SyncSettings::from_lookup("APP_", |name| env.get(name).map(|v| v.to_string()));
        assert_eq!(settings.reveal_delay_ms, 120);
        assert!(!settings.notify_load_errors);
        assert_eq!(settings.notification_duration_ms, 5000);
    }
}
