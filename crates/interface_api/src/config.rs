//! API configuration
//!
//! Loaded from `API_*` environment variables. Nested sections use a double
//! underscore, e.g. `API_ENGINE__REQUOTE_LIMIT=5` or
//! `API_DATABASE__URL=postgres://...`.

use serde::Deserialize;

use core_kernel::EngineSettings;
use infra_db::DatabaseConfig;

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
    /// Shared secret the payment gateway sends in `X-Webhook-Secret`
    pub webhook_secret: Option<String>,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    pub database: DatabaseConfig,
    pub engine: EngineSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            webhook_secret: None,
            log_level: "info".to_string(),
            database: DatabaseConfig::default(),
            engine: EngineSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    ///
    /// # Errors
    ///
    /// Fails on values that do not parse or engine settings that no service
    /// can honour
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config: ApiConfig = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config
            .engine
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(config)
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
