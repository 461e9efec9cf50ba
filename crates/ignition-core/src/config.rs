//! Runtime configuration for the store.
//!
//! Gameplay rules live in `ignition_logic::constants`; this struct only
//! holds knobs that differ between deployments and tests.

use std::path::Path;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ignition_logic::clock::day_offset;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for quest/event rolls and generated ids.
    pub seed: u64,
    /// Seconds between scheduled decay ticks.
    pub tick_interval_secs: u64,
    /// Seconds a notification stays visible.
    pub notification_ttl_secs: u64,
    /// Notifications kept at once; the oldest is dropped first.
    pub max_notifications: usize,
    /// Completion history older than this is pruned on persist.
    pub history_retention_days: i64,
    /// Offset used to decide what "today" is.
    pub utc_offset_minutes: i32,
    /// Enter hibernation after `idle_hours` without activity.
    pub auto_hibernate_when_idle: bool,
    pub idle_hours: f64,
    /// Slow decay by 20% while the completion pattern is in flux, and pay
    /// a small bonus for completions that break it.
    pub flux_stabilizer: bool,
    /// Quiet period before an outbound sync runs.
    pub sync_debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_interval_secs: 60,
            notification_ttl_secs: 5,
            max_notifications: 5,
            history_retention_days: 90,
            utc_offset_minutes: 0,
            auto_hibernate_when_idle: true,
            idle_hours: 48.0,
            flux_stabilizer: false,
            sync_debounce_ms: 2000,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn day_offset(&self) -> FixedOffset {
        day_offset(self.utc_offset_minutes)
    }

    pub fn tick_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.tick_interval_secs.max(1) as i64)
    }

    pub fn notification_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.notification_ttl_secs as i64)
    }

    pub fn sync_debounce(&self) -> Duration {
        Duration::from_millis(self.sync_debounce_ms)
    }
}
