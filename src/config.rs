//! Configuration loading and management.
//!
//! The config value is loaded once at startup and passed into the
//! connection constructor; there is no process-global settings store.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server to connect to.
    pub server: ServerConfig,
    /// Identity registered on connect.
    pub identity: IdentityConfig,
    /// Channels joined after the welcome numeric.
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Database configuration.
    pub database: Option<DatabaseConfig>,
    /// Chat command settings.
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Services authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Hostname or address (e.g., "irc.libera.chat").
    pub host: String,
    /// Port (e.g., 6667).
    pub port: u16,
    /// Connection password, sent as PASS before registration if set.
    pub password: Option<String>,
}

/// Identity sent during registration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Nickname.
    pub nick: String,
    /// Username (ident); defaults to the nickname when omitted.
    pub username: Option<String>,
    /// Real name / GECOS.
    pub realname: String,
}

impl IdentityConfig {
    /// Username to register with, falling back to the nick.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nick)
    }
}

/// Autojoin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsConfig {
    /// Channels to join once registration completes.
    #[serde(default)]
    pub autojoin: Vec<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or ":memory:".
    pub path: String,
}

/// Chat command settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    /// Prefix that marks a chat command (e.g., "!").
    #[serde(default = "default_command_prefix")]
    pub prefix: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: default_command_prefix(),
        }
    }
}

fn default_command_prefix() -> String {
    "!".to_string()
}

/// Services authentication settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Services nick queried for identification status.
    #[serde(default = "default_auth_service")]
    pub service: String,
    /// Minimum STATUS level accepted as identified.
    #[serde(default = "default_required_level")]
    pub required_level: u8,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            service: default_auth_service(),
            required_level: default_required_level(),
        }
    }
}

fn default_auth_service() -> String {
    "NickServ".to_string()
}

fn default_required_level() -> u8 {
    3
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
