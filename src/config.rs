use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::nav::ZvdConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse configuration")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration of a session. Every field has a default, so a
/// missing file or an empty table is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InsConfig {
    /// Frames buffered between the serial reader and the engine.
    pub channel_capacity: usize,
    /// Presentation refresh period in milliseconds.
    pub display_refresh_ms: u64,
    /// Without a new frame for this long, the display reports no data.
    pub stale_after_ms: u64,
    /// Serial read timeout in milliseconds.
    pub serial_timeout_ms: u64,
    pub zvd: ZvdConfig,
}

impl Default for InsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            display_refresh_ms: 100,
            stale_after_ms: 1000,
            serial_timeout_ms: 1000,
            zvd: ZvdConfig::default(),
        }
    }
}

impl InsConfig {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }
}
