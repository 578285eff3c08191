//! User settings for SplitIt
//!
//! Manages the local owner identity, snapshot retention, and the retry and
//! timeout policy applied to every ledger store call.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::SplitItPaths;
use crate::error::SplitError;

/// Snapshot retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRetention {
    /// Number of most recent snapshots to keep
    pub max_snapshots: u32,
}

impl Default for SnapshotRetention {
    fn default() -> Self {
        Self { max_snapshots: 5 }
    }
}

/// Retry policy for transient store failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per store call, including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    /// Per-call timeout; an elapsed call counts as a transient failure
    pub call_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
            call_timeout_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait after a failed attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms =
            self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(backoff_ms as u64).min(Duration::from_millis(self.max_backoff_ms))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// User settings for SplitIt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Participant key of the local user, recorded as snapshot owner
    #[serde(default)]
    pub owner: String,

    /// Currency assigned to new groups when none is given
    #[serde(default = "default_currency")]
    pub default_currency: String,

    #[serde(default)]
    pub snapshot_retention: SnapshotRetention,

    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Shared preferences stored alongside the ledger and exported in snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSettings {
    #[serde(default)]
    pub user_preferences: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub app_config: BTreeMap<String, serde_json::Value>,
}

impl LedgerSettings {
    /// Add keys from `other` that are missing here; existing keys win
    pub fn merge_missing(&mut self, other: &LedgerSettings) {
        for (key, value) in &other.user_preferences {
            self.user_preferences
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        for (key, value) in &other.app_config {
            self.app_config
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            owner: String::new(),
            default_currency: default_currency(),
            snapshot_retention: SnapshotRetention::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &SplitItPaths) -> Result<Self, SplitError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| SplitError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| SplitError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &SplitItPaths) -> Result<(), SplitError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SplitError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| SplitError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.snapshot_retention.max_snapshots, 5);
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.default_currency, "USD");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SplitItPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.owner = "ana@example.com".into();
        settings.snapshot_retention.max_snapshots = 2;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.owner, "ana@example.com");
        assert_eq!(loaded.snapshot_retention.max_snapshots, 2);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"owner":"bo@example.com"}"#).unwrap();
        assert_eq!(settings.owner, "bo@example.com");
        assert_eq!(settings.retry.initial_backoff_ms, 1000);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            initial_backoff_ms: 100,
            max_backoff_ms: 300,
            ..Default::default()
        };
        assert_eq!(policy.backoff_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(300));
    }

    #[test]
    fn test_merge_missing_keeps_local_values() {
        let mut local = LedgerSettings::default();
        local
            .user_preferences
            .insert("currency".into(), serde_json::json!("EUR"));

        let mut incoming = LedgerSettings::default();
        incoming
            .user_preferences
            .insert("currency".into(), serde_json::json!("USD"));
        incoming
            .app_config
            .insert("initialized".into(), serde_json::json!(true));

        local.merge_missing(&incoming);
        assert_eq!(local.user_preferences["currency"], serde_json::json!("EUR"));
        assert_eq!(local.app_config["initialized"], serde_json::json!(true));
    }
}
