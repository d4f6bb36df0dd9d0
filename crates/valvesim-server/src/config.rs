//! Simulator configuration.
//!
//! A JSON file with serde defaults, so a minimal config is just the
//! mapping path:
//!
//! ```json
//! {
//!   "mapping_path": "SPSData/Mapping_Ventiltester.xml",
//!   "tick_interval_ms": 1000,
//!   "server_name": "ValveSim Simulation Server"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Simulator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Mapping file the address space is built from.
    pub mapping_path: PathBuf,

    /// Milliseconds between update passes.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Display name of the simulated device.
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_server_name() -> String {
    "ValveSim Simulation Server".to_string()
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mapping_path: PathBuf::from("Mapping.xml"),
            tick_interval_ms: default_tick_interval_ms(),
            server_name: default_server_name(),
        }
    }
}

impl SimConfig {
    /// Load a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
