//! Configuration loading and constants.
//!
//! Loads application configuration from an optional TOML file, then applies
//! environment overrides (`APP_ENV`, `PORT`, `MONGO_URI`, `MONGO_DATABASE`,
//! `MYSQL_URL`, `REDIS_URL`). Every section has defaults so the service starts
//! with no file at all. `AppConfig` is the root configuration struct.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "trailhead=debug,tower_http=debug";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default JSON body limit, matching common body-parser defaults (100 KiB)
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 100 * 1024;

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_PORT: &str = "PORT";
pub const ENV_MONGO_URI: &str = "MONGO_URI";
pub const ENV_MONGO_DATABASE: &str = "MONGO_DATABASE";
pub const ENV_MYSQL_URL: &str = "MYSQL_URL";
pub const ENV_REDIS_URL: &str = "REDIS_URL";

/// Deployment environment the service runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Error details are exposed in responses
    #[default]
    Development,
    /// Content-Security-Policy is left to the proxy, error details are hidden
    Production,
    /// Store connections are skipped
    Testing,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Testing => "testing",
        }
    }

    /// Whether error responses may carry the underlying message.
    pub fn exposes_error_details(self) -> bool {
        self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "testing" => Ok(Environment::Testing),
            other => Err(ConfigError::Validation(format!(
                "Unknown environment '{}', expected development, production or testing",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Document store
    #[serde(default)]
    pub mongo: MongoConfig,
    /// Relational store
    #[serde(default)]
    pub mysql: MySqlConfig,
    /// Cache
    #[serde(default)]
    pub redis: RedisConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
    /// Maximum accepted request body size in bytes
    #[serde(default = "HttpServerConfig::default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            body_limit_bytes: Self::default_body_limit(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_body_limit() -> usize {
        DEFAULT_BODY_LIMIT_BYTES
    }
}

/// Security header settings
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Send a Content-Security-Policy header (always off in production)
    #[serde(default = "SecurityConfig::default_csp")]
    pub content_security_policy: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            content_security_policy: Self::default_csp(),
        }
    }
}

impl SecurityConfig {
    fn default_csp() -> bool {
        true
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    #[serde(default = "MongoConfig::default_uri")]
    pub uri: String,
    #[serde(default = "MongoConfig::default_database")]
    pub database: String,
    #[serde(default = "MongoConfig::default_app_name")]
    pub app_name: String,
    /// How long to wait for a usable server before a command fails
    #[serde(default = "MongoConfig::default_server_selection_timeout")]
    pub server_selection_timeout_seconds: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            database: Self::default_database(),
            app_name: Self::default_app_name(),
            server_selection_timeout_seconds: Self::default_server_selection_timeout(),
        }
    }
}

impl MongoConfig {
    fn default_uri() -> String {
        "mongodb://localhost:27017".to_string()
    }
    fn default_database() -> String {
        "trailhead".to_string()
    }
    fn default_app_name() -> String {
        "trailhead".to_string()
    }
    fn default_server_selection_timeout() -> u64 {
        10
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MySqlConfig {
    #[serde(default = "MySqlConfig::default_url")]
    pub url: String,
    #[serde(default = "MySqlConfig::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "MySqlConfig::default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            max_connections: Self::default_max_connections(),
            acquire_timeout_seconds: Self::default_acquire_timeout(),
        }
    }
}

impl MySqlConfig {
    fn default_url() -> String {
        "mysql://root@localhost:3306/trailhead".to_string()
    }
    fn default_max_connections() -> u32 {
        5
    }
    fn default_acquire_timeout() -> u64 {
        10
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "RedisConfig::default_url")]
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl RedisConfig {
    fn default_url() -> String {
        "redis://127.0.0.1:6379".to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Loads configuration from `path`, or from the default path when none
    /// is given, then applies process environment overrides.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies overrides from `lookup`, typically the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup(ENV_APP_ENV) {
            self.environment = env.parse()?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.http.port = port.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("{} must be a port number, got '{}'", ENV_PORT, port))
            })?;
        }
        if let Some(uri) = lookup(ENV_MONGO_URI) {
            self.mongo.uri = uri;
        }
        if let Some(database) = lookup(ENV_MONGO_DATABASE) {
            self.mongo.database = database;
        }
        if let Some(url) = lookup(ENV_MYSQL_URL) {
            self.mysql.url = url;
        }
        if let Some(url) = lookup(ENV_REDIS_URL) {
            self.redis.url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mongo.database.trim().is_empty() {
            return Err(ConfigError::Validation(
                "mongo.database must not be empty".to_string(),
            ));
        }
        if self.mysql.max_connections == 0 {
            return Err(ConfigError::Validation(
                "mysql.max_connections must be at least 1".to_string(),
            ));
        }
        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Whether the Content-Security-Policy header is sent.
    pub fn csp_enabled(&self) -> bool {
        self.security.content_security_policy && self.environment != Environment::Production
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
