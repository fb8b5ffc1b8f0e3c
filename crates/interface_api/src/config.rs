//! API configuration
//!
//! Loaded from `API_*` environment variables (a `.env` file is read first by
//! the server binary). Every field has a default, so an empty environment
//! yields a working local setup.

use std::time::Duration;

use infra_db::DatabaseConfig;
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub db_max_connections: u32,
    /// Minimum pooled database connections
    pub db_min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub db_connect_timeout_secs: u64,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
    /// Events buffered per invoice event subscriber
    pub event_bus_capacity: usize,
    /// Log level
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/invoicing".to_string(),
            db_max_connections: 10,
            db_min_connections: 2,
            db_connect_timeout_secs: 30,
            run_migrations: true,
            event_bus_capacity: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the connection pool settings
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();

        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.database_config().url, "postgres://localhost/invoicing");
        assert!(config.run_migrations);
    }

    #[test]
    fn test_database_config_carries_pool_sizes() {
        let config = ApiConfig {
            db_max_connections: 25,
            db_min_connections: 5,
            db_connect_timeout_secs: 3,
            ..ApiConfig::default()
        };

        let db = config.database_config();
        assert_eq!(db.max_connections, 25);
        assert_eq!(db.min_connections, 5);
        assert_eq!(db.connect_timeout, Duration::from_secs(3));
    }
}
