//! Replication configuration
//!
//! Flush cadence, per-message limits and the wire version. Counts are
//! clamped to the hard caps of the wire format on every path, including
//! deserialization.

use crate::error::{Error, Result};
use levelsync_actions::{BatchLimits, DATA_VERSION, MAX_ACTIONS_PER_MESSAGE, MAX_COLLECTIONS_PER_MESSAGE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for action replication
///
/// # Example
///
/// ```
/// use levelsync_netcode::ReplicationConfig;
///
/// let config = ReplicationConfig::from_ron_str("(flush_interval_secs: 0.5, max_actions_per_message: 500)").unwrap();
/// assert_eq!(config.flush_interval_secs(), 0.5);
/// // Clamped to the wire format's cap
/// assert_eq!(config.max_actions_per_message(), 96);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Seconds between flushes of the pending queue
    flush_interval_secs: f32,
    /// Actions per message, `1..=96`
    max_actions_per_message: usize,
    /// Collections per message, `1..=255`
    max_collections_per_message: usize,
    /// Wire version written into and expected from every message
    data_version: u16,
    /// Default filter for `logging::init` when `RUST_LOG` is unset
    log_level: String,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 1.0,
            max_actions_per_message: MAX_ACTIONS_PER_MESSAGE,
            max_collections_per_message: MAX_COLLECTIONS_PER_MESSAGE,
            data_version: DATA_VERSION,
            log_level: "info".to_string(),
        }
    }
}

impl ReplicationConfig {
    /// Parse a RON document; missing fields take their defaults
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: ReplicationConfig =
            ron::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Load a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Render as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Config(e.to_string()))
    }

    fn normalized(mut self) -> Self {
        self.set_flush_interval(self.flush_interval_secs);
        self.set_max_actions_per_message(self.max_actions_per_message);
        self.set_max_collections_per_message(self.max_collections_per_message);
        self
    }

    /// Builder: flush interval in seconds
    pub fn with_flush_interval(mut self, secs: f32) -> Self {
        self.set_flush_interval(secs);
        self
    }

    /// Builder: actions per message
    pub fn with_max_actions_per_message(mut self, n: usize) -> Self {
        self.set_max_actions_per_message(n);
        self
    }

    /// Builder: collections per message
    pub fn with_max_collections_per_message(mut self, n: usize) -> Self {
        self.set_max_collections_per_message(n);
        self
    }

    pub fn with_data_version(mut self, version: u16) -> Self {
        self.data_version = version;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the flush interval; negative and non-finite values become zero
    pub fn set_flush_interval(&mut self, secs: f32) {
        self.flush_interval_secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    }

    /// Set actions per message, clamped to `[1, 96]`
    pub fn set_max_actions_per_message(&mut self, n: usize) {
        self.max_actions_per_message = n.clamp(1, MAX_ACTIONS_PER_MESSAGE);
    }

    /// Set collections per message, clamped to `[1, 255]`
    pub fn set_max_collections_per_message(&mut self, n: usize) {
        self.max_collections_per_message = n.clamp(1, MAX_COLLECTIONS_PER_MESSAGE);
    }

    pub fn flush_interval_secs(&self) -> f32 {
        self.flush_interval_secs
    }

    pub fn max_actions_per_message(&self) -> usize {
        self.max_actions_per_message
    }

    pub fn max_collections_per_message(&self) -> usize {
        self.max_collections_per_message
    }

    pub fn data_version(&self) -> u16 {
        self.data_version
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Limits handed to the batch codec
    pub fn limits(&self) -> BatchLimits {
        BatchLimits::new(
            self.max_actions_per_message,
            self.max_collections_per_message,
            self.data_version,
        )
    }
}
