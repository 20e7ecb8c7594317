//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::scrape;
use crate::ConfigError;

/// Runtime environment enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Acquisition engine configuration
    #[serde(default)]
    pub scraper: ScraperSettings,

    /// Reference vocabulary sources
    #[serde(default)]
    pub vocabulary: VocabularySettings,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scraper = &self.scraper;

        if !scraper.listing_url.starts_with("http") {
            return Err(ConfigError::InvalidValue {
                field: "scraper.listing_url".to_string(),
                message: format!("Must be an http(s) URL, got '{}'", scraper.listing_url),
            });
        }

        if scraper.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraper.max_attempts".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if scraper.max_attempts > 10 {
            return Err(ConfigError::InvalidValue {
                field: "scraper.max_attempts".to_string(),
                message: format!(
                    "Retry cap of {} would hammer the external site (maximum 10)",
                    scraper.max_attempts
                ),
            });
        }

        if scraper.wait_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraper.wait_timeout_secs".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if scraper.window_width == 0 || scraper.window_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraper.window_size".to_string(),
                message: "Viewport dimensions must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Acquisition engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperSettings {
    /// External price-listing endpoint
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Run the browser headless (disable only for local debugging)
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Explicit wait timeout in seconds for readiness and element polls
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Settle buffer after page readiness, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Maximum attempts for retried automation steps
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed browser viewport
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Fixed user agent presented to the listing site
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_listing_url() -> String {
    scrape::LISTING_URL.to_string()
}
fn default_wait_timeout() -> u64 {
    scrape::WAIT_TIMEOUT_SECS
}
fn default_settle_ms() -> u64 {
    scrape::SETTLE_BUFFER_MS
}
fn default_max_attempts() -> u32 {
    scrape::MAX_RETRY_ATTEMPTS
}
fn default_window_width() -> u32 {
    1920
}
fn default_window_height() -> u32 {
    1080
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            headless: true,
            wait_timeout_secs: default_wait_timeout(),
            settle_ms: default_settle_ms(),
            max_attempts: default_max_attempts(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: default_user_agent(),
        }
    }
}

/// Reference vocabulary sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularySettings {
    /// CSV with `Name`/`Code` columns for commodities
    #[serde(default = "default_commodity_file")]
    pub commodity_file: String,

    /// CSV with `District Name`/`District Code` columns
    #[serde(default = "default_district_file")]
    pub district_file: String,
}

fn default_commodity_file() -> String {
    "data/commodity_mappings.csv".to_string()
}
fn default_district_file() -> String {
    "data/up_districts.csv".to_string()
}

impl Default for VocabularySettings {
    fn default() -> Self {
        Self {
            commodity_file: default_commodity_file(),
            district_file: default_district_file(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (`MANDI_AGENT__` prefix)
/// 2. `config/{env}.yaml` (if env specified)
/// 3. `config/default.yaml`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("MANDI_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
