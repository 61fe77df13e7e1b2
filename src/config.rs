//! Configuration management for RAX Chat Server
//!
//! Built-in defaults are layered under an optional `config.toml` and
//! `RAX_CHAT_*` environment overrides.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address the listener binds to
    pub bind_address: String,

    /// TCP port for client connections
    pub port: u16,

    // ═══ LIMITS ═══
    /// Maximum simultaneously registered clients
    /// Environment: RAX_CHAT_MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum inbound line length in bytes, newline excluded
    pub max_message_length: usize,

    /// Maximum nickname length in bytes
    pub max_nickname_length: usize,

    /// Lines that may wait in one client's outbound queue before new ones are dropped
    pub outbound_queue_depth: usize,

    // ═══ AUDIT ═══
    /// Append-only audit log file
    pub audit_log_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8888,
            max_clients: 50,
            max_message_length: 2047,
            max_nickname_length: 31,
            outbound_queue_depth: 256,
            audit_log_path: "chat_server.log".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from defaults, `config.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("max_message_length", defaults.max_message_length as i64)?
            .set_default("max_nickname_length", defaults.max_nickname_length as i64)?
            .set_default("outbound_queue_depth", defaults.outbound_queue_depth as i64)?
            .set_default("audit_log_path", defaults.audit_log_path)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("RAX_CHAT").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_message_length == 0 {
            return Err(ConfigError::Message(
                "max_message_length must be greater than 0".into(),
            ));
        }

        if self.max_nickname_length == 0 {
            return Err(ConfigError::Message(
                "max_nickname_length must be greater than 0".into(),
            ));
        }

        if self.outbound_queue_depth == 0 {
            return Err(ConfigError::Message(
                "outbound_queue_depth must be greater than 0".into(),
            ));
        }

        if self.audit_log_path.trim().is_empty() {
            return Err(ConfigError::Message(
                "audit_log_path cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
