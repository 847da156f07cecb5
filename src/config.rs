use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use crate::core::MatchPolicy;
use crate::services::AppwriteCollections;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub appwrite: Option<AppwriteSettings>,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Appwrite,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// JSON seed for the memory backend
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    #[serde(default)]
    pub collections: CollectionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_drivers_collection")]
    pub drivers: String,
    #[serde(default = "default_locations_collection")]
    pub driver_locations: String,
    #[serde(default = "default_notifications_collection")]
    pub notifications: String,
    #[serde(default = "default_notified_drivers_collection")]
    pub notified_drivers: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            drivers: default_drivers_collection(),
            driver_locations: default_locations_collection(),
            notifications: default_notifications_collection(),
            notified_drivers: default_notified_drivers_collection(),
        }
    }
}

impl From<CollectionSettings> for AppwriteCollections {
    fn from(c: CollectionSettings) -> Self {
        AppwriteCollections {
            drivers: c.drivers,
            driver_locations: c.driver_locations,
            notifications: c.notifications,
            notified_drivers: c.notified_drivers,
        }
    }
}

fn default_drivers_collection() -> String { "drivers".to_string() }
fn default_locations_collection() -> String { "driverLocations".to_string() }
fn default_notifications_collection() -> String { "notifications".to_string() }
fn default_notified_drivers_collection() -> String { "notifiedDrivers".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
    #[serde(default = "default_avg_speed_kmh")]
    pub avg_speed_kmh: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub bounding_box_prefilter: bool,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            freshness_window_secs: default_freshness_window_secs(),
            avg_speed_kmh: default_avg_speed_kmh(),
            request_timeout_secs: default_request_timeout_secs(),
            bounding_box_prefilter: false,
        }
    }
}

impl MatchingSettings {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            default_radius_km: self.default_radius_km,
            default_limit: self.default_limit.max(1),
            max_limit: self.max_limit.max(1),
            freshness_window_ms: i64::try_from(self.freshness_window_secs.saturating_mul(1000))
                .unwrap_or(i64::MAX),
            avg_speed_kmh: self.avg_speed_kmh,
            bounding_box_prefilter: self.bounding_box_prefilter,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn default_radius_km() -> f64 { 10.0 }
fn default_limit() -> usize { 5 }
fn default_max_limit() -> usize { 50 }
fn default_freshness_window_secs() -> u64 { 300 }
fn default_avg_speed_kmh() -> f64 { 30.0 }
fn default_request_timeout_secs() -> u64 { 10 }

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
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with YABONSE_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., YABONSE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("YABONSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("YABONSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the unprefixed Appwrite variables used by the other Yabonse services
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("APPWRITE_ENDPOINT", "appwrite.endpoint"),
        ("APPWRITE_API_KEY", "appwrite.api_key"),
        ("APPWRITE_PROJECT_ID", "appwrite.project_id"),
        ("APPWRITE_DATABASE_ID", "appwrite.database_id"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
