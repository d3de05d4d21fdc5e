//! Client configuration
//!
//! Everything the session needs is fixed at construction time. Values come
//! from defaults, an optional JSON file and command-line overrides, in that
//! order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid stage {0} (expected 0-3)")]
    Stage(u8),
}

/// Race stage reported by the launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    WarmUp,
    Qualifying,
    Race,
    #[default]
    Unknown,
}

impl TryFrom<u8> for Stage {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::WarmUp),
            1 => Ok(Self::Qualifying),
            2 => Ok(Self::Race),
            3 => Ok(Self::Unknown),
            other => Err(ConfigError::Stage(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Simulator host name or address
    pub host: String,

    /// Simulator UDP port
    pub port: u16,

    /// Bot id sent in the identification request
    pub bot_id: String,

    /// Episodes to run before shutting down (0 = until the server says so)
    pub max_episodes: u32,

    /// Ticks per episode before the client asks to end it (0 = unbounded)
    pub max_steps: u64,

    /// Track name, informational only
    pub track: Option<String>,

    pub stage: Stage,

    /// Drive with the trained model instead of live input
    pub autonomous: bool,

    pub model_path: PathBuf,

    pub scaler_path: PathBuf,

    /// Receive timeout in milliseconds; a timeout is a retry, not an error
    pub recv_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3001,
            bot_id: "SCR".to_string(),
            max_episodes: 1,
            max_steps: 0,
            track: None,
            stage: Stage::Unknown,
            autonomous: false,
            model_path: PathBuf::from("torcs_mlp_model.json"),
            scaler_path: PathBuf::from("input_scaler.json"),
            recv_timeout_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/scrc-client/config.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scrc-client").join("config.json"))
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
