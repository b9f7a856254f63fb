//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Storage backend used for books, borrow records and accounts
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_hours: i64,
    /// Administrator created at startup when both are set
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    ///
    /// Precedence (lowest first): built-in defaults, `config/default`,
    /// `config/{RUN_MODE}`, `LIBRARY__*` variables, then `DATABASE_URL`,
    /// `JWT_SECRET` and `PORT`.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let port = env::var("PORT").ok().and_then(|p| p.parse::<i64>().ok());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // e.g. LIBRARY__SERVER__PORT=8080
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .set_override_option("server.port", port)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/library".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-secret-in-production".to_string(),
            access_token_minutes: 60,
            refresh_token_hours: 24,
            admin_username: None,
            admin_password: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "library_lending=debug,tower_http=debug".to_string(),
        }
    }
}
