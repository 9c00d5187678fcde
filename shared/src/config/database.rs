//! Revocation store database settings

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// MySQL pool settings for the durable revocation store
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// `mysql://` connection URL
    pub url: String,

    pub max_connections: u32,

    /// Connections kept open while idle
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub connect_timeout: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout: u64,

    /// Maximum lifetime of a connection in seconds
    pub max_lifetime: u64,

    /// Statements slower than this (milliseconds) are logged at warn
    #[serde(default = "default_slow_query_threshold")]
    pub slow_query_threshold: u64,

    /// Apply the embedded schema migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("mysql://localhost:3306/charityworks"),
            max_connections: 10,
            min_connections: default_min_connections(),
            connect_timeout: 5,
            idle_timeout: 600,
            max_lifetime: 1800,
            slow_query_threshold: default_slow_query_threshold(),
            run_migrations: default_run_migrations(),
        }
    }
}

impl DatabaseConfig {
    /// Reads `DATABASE_*` variables, falling back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout: env_parse("DATABASE_CONNECT_TIMEOUT", defaults.connect_timeout),
            run_migrations: env_parse("DATABASE_RUN_MIGRATIONS", defaults.run_migrations),
            ..defaults
        }
    }

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("mysql://") {
            return Err(ConfigError::invalid(
                "DATABASE_URL",
                "the revocation store requires a mysql:// URL",
            ));
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ConfigError::invalid(
                "DATABASE_MAX_CONNECTIONS",
                format!(
                    "need 0 < min ({}) <= max ({})",
                    self.min_connections, self.max_connections
                ),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_min_connections() -> u32 {
    1
}

fn default_slow_query_threshold() -> u64 {
    200
}

fn default_run_migrations() -> bool {
    true
}
