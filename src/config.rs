//! Service configuration.
//!
//! Timeouts for backend probes and counts, plus logging settings.

use crate::core::Result;
use crate::monitoring::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Bounds on backend round-trips.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Health probe timeout (ms)
    pub probe_timeout_ms: u64,
    /// Count query timeout (ms)
    pub count_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5_000,
            count_timeout_ms: 10_000,
        }
    }
}

impl ProbeConfig {
    /// Health probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Count query timeout.
    pub fn count_timeout(&self) -> Duration {
        Duration::from_millis(self.count_timeout_ms)
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Probe and count bounds
    pub probe: ProbeConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Parse from a JSON document. Missing sections take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}
