//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, CroonConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    // System config
    let system = PathBuf::from("/etc/croon/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("croon/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    // Local override (current directory)
    let local = PathBuf::from("croon.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a file as a raw TOML table.
pub(crate) fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Merge `overlay` into `base`; overlay values win, tables merge key-wise.
pub(crate) fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub(crate) fn apply_env_overrides(config: &mut CroonConfig, sources: &mut ConfigSources) {
    if let Ok(v) = env::var("CROON_LISTEN_PORT") {
        if let Ok(port) = v.parse() {
            config.udp.listen_port = port;
            sources.env_overrides.push("CROON_LISTEN_PORT".to_string());
        }
    }
    if let Ok(v) = env::var("CROON_BRIDGE_HOST") {
        config.udp.bridge_host = v;
        sources.env_overrides.push("CROON_BRIDGE_HOST".to_string());
    }
    if let Ok(v) = env::var("CROON_BRIDGE_PORT") {
        if let Ok(port) = v.parse() {
            config.udp.bridge_port = port;
            sources.env_overrides.push("CROON_BRIDGE_PORT".to_string());
        }
    }
    if let Ok(v) = env::var("CROON_BRIDGE_URL") {
        config.bridge.base_url = v;
        sources.env_overrides.push("CROON_BRIDGE_URL".to_string());
    }
    if let Ok(v) = env::var("CROON_POLL_INTERVAL_MS") {
        if let Ok(ms) = v.parse() {
            config.capture.poll_interval_ms = ms;
            sources
                .env_overrides
                .push("CROON_POLL_INTERVAL_MS".to_string());
        }
    }
    if let Ok(v) = env::var("CROON_ATTEMPT_BUDGET") {
        if let Ok(n) = v.parse() {
            config.capture.attempt_budget = n;
            sources.env_overrides.push("CROON_ATTEMPT_BUDGET".to_string());
        }
    }
    if let Ok(v) = env::var("CROON_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("CROON_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Ok(v) = env::var("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(contents: &str) -> CroonConfig {
        let table: toml::Table = contents.parse().unwrap();
        toml::Value::Table(table).try_into().unwrap()
    }

    #[test]
    fn parse_minimal_toml() {
        let config = parse(
            r#"
[udp]
listen_port = 9400
"#,
        );
        assert_eq!(config.udp.listen_port, 9400);
        // Other values should be defaults
        assert_eq!(config.udp.bridge_port, 7401);
        assert_eq!(config.capture.attempt_budget, 8);
    }

    #[test]
    fn parse_full_toml() {
        let config = parse(
            r#"
[udp]
listen_port = 9400
bridge_host = "10.0.0.5"
bridge_port = 9401

[bridge]
base_url = "http://backend:8000"
request_timeout_ms = 2500

[capture]
poll_interval_ms = 500
attempt_budget = 4

[session]
bpm = 96.0
mood = "wistful"
length_value = 8.0
length_unit = "step"
adventureness = 60.0

[telemetry]
log_level = "debug"
"#,
        );

        assert_eq!(config.udp.listen_port, 9400);
        assert_eq!(config.udp.bridge_host, "10.0.0.5");
        assert_eq!(config.bridge.base_url, "http://backend:8000");
        assert_eq!(config.bridge.request_timeout_ms, 2500);
        assert_eq!(config.capture.poll_interval_ms, 500);
        assert_eq!(config.capture.attempt_budget, 4);
        assert_eq!(config.session.bpm, 96.0);
        assert_eq!(config.session.mood, "wistful");
        assert_eq!(config.session.length_unit, "step");
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn later_file_wins_per_key() {
        let mut base: toml::Table = r#"
[udp]
listen_port = 9400
bridge_port = 9401
"#
        .parse()
        .unwrap();
        let overlay: toml::Table = r#"
[udp]
listen_port = 9500
"#
        .parse()
        .unwrap();

        merge_tables(&mut base, overlay);
        let config: CroonConfig = toml::Value::Table(base).try_into().unwrap();
        assert_eq!(config.udp.listen_port, 9500);
        // Untouched key from the base file survives
        assert_eq!(config.udp.bridge_port, 9401);
    }

    #[test]
    fn cli_override_replaces_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\nattempt_budget = 3").unwrap();

        let files = discover_config_files_with_override(Some(file.path()));
        assert_eq!(files.last().unwrap(), file.path());

        let table = read_table(file.path()).unwrap();
        let config: CroonConfig = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(config.capture.attempt_budget, 3);
    }

    #[test]
    fn discover_does_not_panic() {
        let _files = discover_config_files();
    }
}
