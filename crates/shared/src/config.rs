//! Application configuration management.
//!
//! Sources are layered, later ones winning:
//! 1. `config/default.{toml,json,...}`
//! 2. `config/{RUN_MODE}` (defaults to `development`)
//! 3. Environment variables prefixed `UNIDATA`, nested with `__`
//!    (e.g. `UNIDATA__SERVER__PORT=9090`).

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "UNIDATA";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body in bytes (multipart uploads included).
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    25 * 1024 * 1024
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "unidata=debug,tower_http=debug".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        layered()?.try_deserialize()
    }
}

/// Loads a single top-level section (e.g. `storage`) from the same layered
/// sources as [`AppConfig::load`].
///
/// # Errors
///
/// Returns an error if the section is missing or does not match `T`.
pub fn load_section<T: DeserializeOwned>(key: &str) -> Result<T, config::ConfigError> {
    layered()?.get(key)
}

fn layered() -> Result<config::Config, config::ConfigError> {
    // A missing .env file is not an error.
    dotenvy::dotenv().ok();

    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
}
