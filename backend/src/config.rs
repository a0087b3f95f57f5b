//! Configuration management for the Vet Clinic Management Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with VET_ prefix
//!
//! Loaded once in `main` and handed to handlers through `AppState`.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session cookie configuration
    pub session: SessionConfig,

    /// Clinic branding shown by the portals
    pub clinic: ClinicConfig,

    /// Purchase store location
    pub purchases: PurchaseStoreConfig,

    /// Invoice mirror target
    pub mirror: MirrorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Secret key for signing session tokens
    pub secret: String,

    /// Session lifetime in seconds
    pub expiry_seconds: i64,

    /// Name of the session cookie
    pub cookie_name: String,

    /// Mark the cookie `Secure` (HTTPS only)
    pub secure_cookie: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClinicConfig {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PurchaseStoreConfig {
    /// Directory holding the persisted purchase documents
    pub data_dir: String,

    /// Fixed key the purchase list is stored under
    pub storage_key: String,
}

/// Which invoice store purchases are mirrored into
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MirrorBackend {
    Postgres,
    Rest,
    Disabled,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MirrorConfig {
    pub backend: MirrorBackend,

    /// Base URL of the REST invoice API (backend = "rest")
    pub rest_url: Option<String>,

    /// API key sent to the REST invoice API
    pub api_key: Option<String>,

    /// Request timeout for the REST invoice API
    pub timeout_seconds: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("VET_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("session.expiry_seconds", 8 * 60 * 60)?
            .set_default("session.cookie_name", "auth-token")?
            .set_default("session.secure_cookie", false)?
            .set_default("clinic.name", "Veterinary Clinic")?
            .set_default("purchases.data_dir", "data")?
            .set_default("purchases.storage_key", "vet_purchases")?
            .set_default("mirror.backend", "postgres")?
            .set_default("mirror.timeout_seconds", 10)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (VET_ prefix)
            .add_source(
                Environment::with_prefix("VET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
