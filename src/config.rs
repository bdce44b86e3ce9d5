use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::FeedLimits;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub appwrite: AppwriteSettings,
    pub collection: CollectionSettings,
    pub identity: IdentitySettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub events: String,
    pub users: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    /// RS256 public key of the identity provider, PEM encoded
    pub jwt_public_key_pem: Option<String>,
    /// HS256 shared secret, used when no public key is set
    pub jwt_secret: Option<String>,
    pub issuer: Option<String>,
    /// Expected `aud` claim; the claim is not checked when unset
    pub audience: Option<String>,
    pub cache_size: Option<u64>,
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedSettings {
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Serve events from a JSON file instead of Appwrite
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_featured_limit")]
    pub featured: usize,
    #[serde(default = "default_popular_limit")]
    pub popular: usize,
    #[serde(default = "default_by_location_limit")]
    pub by_location: usize,
    #[serde(default = "default_by_category_limit")]
    pub by_category: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            featured: default_featured_limit(),
            popular: default_popular_limit(),
            by_location: default_by_location_limit(),
            by_category: default_by_category_limit(),
        }
    }
}

impl From<&LimitsConfig> for FeedLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            featured: config.featured,
            popular: config.popular,
            by_location: config.by_location,
            by_category: config.by_category,
        }
    }
}

fn default_featured_limit() -> usize { 3 }
fn default_popular_limit() -> usize { 6 }
fn default_by_location_limit() -> usize { 4 }
fn default_by_category_limit() -> usize { 12 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SPOTT_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SPOTT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SPOTT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SPOTT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn feed_limits(&self) -> FeedLimits {
        FeedLimits::from(&self.feed.limits)
    }
}

/// Apply the conventional unprefixed variables used by the hosting platform
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("APPWRITE_ENDPOINT", "appwrite.endpoint"),
        ("APPWRITE_API_KEY", "appwrite.api_key"),
        ("APPWRITE_PROJECT_ID", "appwrite.project_id"),
        ("APPWRITE_DATABASE_ID", "appwrite.database_id"),
        ("JWT_ISSUER", "identity.issuer"),
        ("JWT_AUDIENCE", "identity.audience"),
        ("JWT_PUBLIC_KEY", "identity.jwt_public_key_pem"),
        ("JWT_SECRET", "identity.jwt_secret"),
    ];

    let mut builder = Config::builder().add_source(settings);

    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
