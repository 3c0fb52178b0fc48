//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with ROBOSUST_, sections split by `__`)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the admin bootstrap password should be kept in environment
//! variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    pub cookie_secure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            cookie_secure: false,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Overridden by DATABASE_URL when set.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://robosust.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Session timeout in minutes (default: 24 hours)
    pub session_timeout_minutes: u32,
    /// How often expired sessions are pruned, in seconds
    pub session_prune_interval_seconds: u64,
    /// Minimum length for admin passwords
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_timeout_minutes: 1440,
            session_prune_interval_seconds: 300,
            min_password_length: 8,
        }
    }
}

/// Content limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in MB
    pub max_upload_size_mb: u32,
    /// Maximum JSON request body in KB
    pub max_json_payload_kb: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 16,
            max_json_payload_kb: 1024,
        }
    }
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb as usize * 1024 * 1024
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Local storage path
    pub local_path: String,
    /// URL prefix uploads are served from
    pub public_url_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: "uploads".to_string(),
            public_url_prefix: "/uploads".to_string(),
        }
    }
}

/// Administrator created on first start when the admins table is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    /// Empty means generate a random password and log it once.
    /// Should be in env var ROBOSUST_ADMIN__PASSWORD
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: String::new(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g. ROBOSUST_SERVER__BIND_ADDRESS, ROBOSUST_ADMIN__PASSWORD
            .add_source(
                Environment::with_prefix("ROBOSUST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: server.bind_address = {}",
        config.server.bind_address
    );
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Get security configuration
pub fn security() -> SecurityConfig {
    get_config().security
}

/// Get limits configuration
pub fn limits() -> LimitsConfig {
    get_config().limits
}
