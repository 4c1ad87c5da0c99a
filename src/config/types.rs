//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::limits::LimitsConfig;
use super::oper::OperBlock;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Mode and queue limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Channel behaviour.
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Modules loaded at startup.
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Operator blocks.
    #[serde(default)]
    pub oper: Vec<OperBlock>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find an oper block by name.
    pub fn find_oper(&self, name: &str) -> Option<&OperBlock> {
        self.oper.iter().find(|o| o.name == name)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "irc.straylight.net").
    pub name: String,
    /// Network name (e.g., "Straylight").
    pub network: String,
    /// Server ID for TS6 (3 characters).
    pub sid: String,
    /// Server description.
    #[serde(default = "default_description")]
    pub description: String,
    /// Prometheus metrics HTTP port. Disabled when absent.
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "irc.example.net".to_string(),
            network: "ExampleNet".to_string(),
            sid: "001".to_string(),
            description: default_description(),
            metrics_port: None,
        }
    }
}

fn default_description() -> String {
    "slircd-core".to_string()
}

/// Plaintext client listener.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6667))
}

/// Channel behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    /// Register the halfop (`+h`, `%`) prefix mode.
    #[serde(default = "default_true")]
    pub halfop: bool,
    /// Simple modes applied to newly created channels.
    #[serde(default = "default_channel_modes")]
    pub default_modes: String,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            halfop: true,
            default_modes: default_channel_modes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_channel_modes() -> String {
    "nt".to_string()
}

/// Extension modules loaded at startup, in order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModulesConfig {
    #[serde(default)]
    pub load: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration. `RUST_LOG` overrides `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_minimal_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
name = "irc.test"
network = "TestNet"
sid = "0AB"

[limits]
max_modes = 4
list_caps = {{ b = 2 }}

[modules]
load = ["ban_exception", "no_ctcp"]

[[oper]]
name = "root"
password = "hunter2"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.name, "irc.test");
        assert_eq!(config.server.description, "slircd-core");
        assert_eq!(config.limits.max_modes, 4);
        assert_eq!(config.limits.list_cap('b'), 2);
        assert_eq!(config.limits.list_cap('e'), config.limits.max_list_entries);
        assert_eq!(config.modules.load, vec!["ban_exception", "no_ctcp"]);
        assert!(config.find_oper("root").is_some());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.listen.address, default_listen_address());
        assert!(config.channels.halfop);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load("/nonexistent/slircd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nname=").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }
}
