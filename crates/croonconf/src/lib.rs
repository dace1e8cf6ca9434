//! Minimal configuration loading for the croon bridge.
//!
//! One small crate imported by every binary, with the sections both sides
//! of the bridge need:
//!
//! - `[udp]`: where magpie listens for host datagrams and where it ships
//!   flushed payloads;
//! - `[bridge]` + `[capture]`: the coordinator's HTTP endpoint and its
//!   poll schedule;
//! - `[session]`: the fixed parameters stamped onto flushed captures;
//! - `[telemetry]`: log filtering.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/croon/config.toml` (system)
//! 2. `~/.config/croon/config.toml` (user)
//! 3. `./croon.toml` (local override)
//! 4. Environment variables (`CROON_*`)
//!
//! # Example Config
//!
//! ```toml
//! [udp]
//! listen_port = 7400
//! bridge_host = "127.0.0.1"
//! bridge_port = 7401
//!
//! [bridge]
//! base_url = "http://127.0.0.1:8000"
//! request_timeout_ms = 5000
//!
//! [capture]
//! poll_interval_ms = 1000
//! attempt_budget = 8
//!
//! [session]
//! bpm = 120.0
//! mood = "happy"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;

pub use loader::{discover_config_files, discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// UDP transport settings for the magpie runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpConfig {
    /// Port host datagrams arrive on.
    #[serde(default = "UdpConfig::default_listen_port")]
    pub listen_port: u16,

    /// Where flushed payloads are sent, fire-and-forget.
    #[serde(default = "UdpConfig::default_bridge_host")]
    pub bridge_host: String,
    #[serde(default = "UdpConfig::default_bridge_port")]
    pub bridge_port: u16,
}

impl UdpConfig {
    fn default_listen_port() -> u16 {
        7400
    }
    fn default_bridge_host() -> String {
        "127.0.0.1".to_string()
    }
    fn default_bridge_port() -> u16 {
        7401
    }
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            listen_port: Self::default_listen_port(),
            bridge_host: Self::default_bridge_host(),
            bridge_port: Self::default_bridge_port(),
        }
    }
}

/// The bridge intermediary's HTTP surface, as seen by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "BridgeConfig::default_base_url")]
    pub base_url: String,

    /// Per-request timeout; the poll *budget* bounds total wait, not this.
    #[serde(default = "BridgeConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BridgeConfig {
    fn default_base_url() -> String {
        "http://127.0.0.1:8000".to_string()
    }
    fn default_request_timeout_ms() -> u64 {
        5000
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Capture poll schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "CaptureConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "CaptureConfig::default_attempt_budget")]
    pub attempt_budget: u32,
}

impl CaptureConfig {
    fn default_poll_interval_ms() -> u64 {
        1000
    }
    fn default_attempt_budget() -> u32 {
        8
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: Self::default_poll_interval_ms(),
            attempt_budget: Self::default_attempt_budget(),
        }
    }
}

/// Session parameters stamped onto flushed captures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_bpm")]
    pub bpm: f64,
    #[serde(default = "SessionConfig::default_mood")]
    pub mood: String,
    #[serde(default = "SessionConfig::default_length_value")]
    pub length_value: f64,
    #[serde(default = "SessionConfig::default_length_unit")]
    pub length_unit: String,
    #[serde(default = "SessionConfig::default_adventureness")]
    pub adventureness: f64,
}

impl SessionConfig {
    fn default_bpm() -> f64 {
        120.0
    }
    fn default_mood() -> String {
        "happy".to_string()
    }
    fn default_length_value() -> f64 {
        4.0
    }
    fn default_length_unit() -> String {
        "bar".to_string()
    }
    fn default_adventureness() -> f64 {
        35.0
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bpm: Self::default_bpm(),
            mood: Self::default_mood(),
            length_value: Self::default_length_value(),
            length_unit: Self::default_length_unit(),
            adventureness: Self::default_adventureness(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// EnvFilter directive string, e.g. "info" or "magpie=debug".
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// Complete croon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CroonConfig {
    #[serde(default)]
    pub udp: UdpConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl CroonConfig {
    /// Load from standard locations with env overrides applied.
    pub fn load() -> Result<(Self, ConfigSources), ConfigError> {
        Self::load_with_override(None)
    }

    /// Load, letting a CLI-supplied path replace the local override file.
    pub fn load_with_override(
        cli_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let files = discover_config_files_with_override(cli_path);

        let mut merged = toml::Table::new();
        for path in &files {
            let table = loader::read_table(path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path.clone());
        }

        let mut config: CroonConfig =
            toml::Value::Table(merged)
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Parse {
                    path: files.last().cloned().unwrap_or_default(),
                    message: e.to_string(),
                })?;

        loader::apply_env_overrides(&mut config, &mut sources);
        Ok((config, sources))
    }
}
