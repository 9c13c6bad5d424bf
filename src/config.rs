//! Configuration management for the citycast application
//!
//! Handles loading configuration from files and environment variables, and
//! carries the named operational defaults (forecast window, weather TTL,
//! upstream timeout and retry budget) so they are constructed in one place
//! instead of being scattered through the services.

use crate::CitycastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the citycast application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitycastConfig {
    /// Upstream provider configuration
    pub upstream: UpstreamConfig,
    /// Cache and persistence configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Upstream Open-Meteo configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Base URL of the forecast API
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Transient-failure retries per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Cache and persistence configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Weather rows older than this are stale and force a refetch
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_minutes: u32,
    /// Forecast window requested when none is specified
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
    /// Cached city results below min(limit, this floor) trigger an upstream search
    #[serde(default = "default_min_city_results")]
    pub min_city_results: usize,
    /// Store directory location
    #[serde(default = "default_store_location")]
    pub store_location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_weather_ttl() -> u32 {
    30
}

fn default_forecast_days() -> u32 {
    7
}

fn default_min_city_results() -> usize {
    5
}

fn default_store_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("citycast"))
        .unwrap_or_else(|| PathBuf::from(".citycast-cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for CitycastConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig {
                geocoding_url: default_geocoding_url(),
                forecast_url: default_forecast_url(),
                timeout_seconds: default_timeout(),
                max_retries: default_max_retries(),
            },
            cache: CacheConfig {
                weather_ttl_minutes: default_weather_ttl(),
                forecast_days: default_forecast_days(),
                min_city_results: default_min_city_results(),
                store_location: default_store_location(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}

impl CitycastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with CITYCAST_ prefix
        builder = builder.add_source(
            Environment::with_prefix("CITYCAST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: CitycastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("citycast").join("config.toml"))
    }

    /// Store directory as a path
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.cache.store_location)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.upstream.timeout_seconds == 0 || self.upstream.timeout_seconds > 300 {
            return Err(
                CitycastError::config("Upstream timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.upstream.max_retries > 10 {
            return Err(CitycastError::config("Upstream max retries cannot exceed 10").into());
        }

        if self.cache.weather_ttl_minutes == 0 || self.cache.weather_ttl_minutes > 10_080 {
            return Err(CitycastError::config(
                "Weather TTL must be between 1 minute and 10080 minutes (1 week)",
            )
            .into());
        }

        if self.cache.forecast_days == 0 || self.cache.forecast_days > 16 {
            return Err(CitycastError::config(
                "Forecast window must be between 1 and 16 days (provider limit)",
            )
            .into());
        }

        if self.cache.min_city_results > 100 {
            return Err(CitycastError::config("Minimum city results cannot exceed 100").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CitycastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CitycastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [&self.upstream.geocoding_url, &self.upstream.forecast_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CitycastError::config(
                    "Upstream base URLs must be valid HTTP or HTTPS URLs",
                )
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CitycastConfig::default();
        assert_eq!(config.upstream.forecast_url, "https://api.open-meteo.com");
        assert_eq!(
            config.upstream.geocoding_url,
            "https://geocoding-api.open-meteo.com"
        );
        assert_eq!(config.upstream.timeout_seconds, 10);
        assert_eq!(config.upstream.max_retries, 2);
        assert_eq!(config.cache.weather_ttl_minutes, 30);
        assert_eq!(config.cache.forecast_days, 7);
        assert_eq!(config.cache.min_city_results, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(CitycastConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = CitycastConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = CitycastConfig::default();
        config.upstream.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("between 1 and 300 seconds"));

        let mut config = CitycastConfig::default();
        config.cache.forecast_days = 30;
        assert!(config.validate().is_err());

        let mut config = CitycastConfig::default();
        config.cache.weather_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = CitycastConfig::default();
        config.upstream.forecast_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_path_generation() {
        let path = CitycastConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("citycast"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
