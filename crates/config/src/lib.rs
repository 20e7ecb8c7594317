//! Configuration management for the mandi price agent
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`MANDI_AGENT__` prefix)
//!
//! Reference vocabularies (commodity and district name→code tables) load
//! from CSV files named in the settings; a missing source leaves the table
//! empty rather than failing startup.

pub mod constants;
pub mod settings;
pub mod vocabulary;

pub use settings::{
    load_settings, ObservabilityConfig, RuntimeEnvironment, ScraperSettings, Settings,
    VocabularySettings,
};
pub use vocabulary::{city_keywords, commodity_display_name, district_city_name, Vocabulary};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
