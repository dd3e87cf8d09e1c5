//! Configuration for the WatchEarn backend.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Secret used when none is configured. Startup logs a warning if it is still in use.
pub const DEFAULT_JWT_SECRET: &str = "change-this-secret";

/// Upper bound for `auth.token_ttl_days`.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Main configuration structure for the backend.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON document holding users and approvals.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// The only address that registers with the admin role.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_password_memory_kib")]
    pub password_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            admin_email: default_admin_email(),
            token_ttl_days: default_token_ttl_days(),
            password_memory_kib: default_password_memory_kib(),
            password_iterations: default_password_iterations(),
        }
    }
}

/// Deployment variant switches.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Gate signups, logins and plan purchases behind admin approvals.
    #[serde(default)]
    pub require_approval: bool,
    /// Return a bearer token from login. When off, `/plan` accepts `email` in the body.
    #[serde(default = "default_true")]
    pub issue_tokens: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_approval: false,
            issue_tokens: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins.
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_store_path() -> String {
    "data/db.json".to_string()
}
fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}
fn default_admin_email() -> String {
    "admin@watchearn.com".to_string()
}
fn default_token_ttl_days() -> i64 {
    7
}
fn default_password_memory_kib() -> u32 {
    19456
}
fn default_password_iterations() -> u32 {
    2
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (WATCHEARN__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config: Config = ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("WATCHEARN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must not be empty".to_string()));
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.auth.token_ttl_days) {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_days must be between 1 and {}",
                MAX_TOKEN_TTL_DAYS
            )));
        }
        if !self.auth.admin_email.contains('@') {
            return Err(ConfigError::Message(format!(
                "auth.admin_email is not an email address: {}",
                self.auth.admin_email
            )));
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}
