//! Citycast - weather-aware city activity recommendations
//!
//! This library combines cached Open-Meteo geocoding data, per-city daily
//! forecasts, and a deterministic scoring engine into ranked activity
//! recommendations ("what should I do today in city X, given the weather?").

pub mod cache;
pub mod cities;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod open_meteo;
pub mod recommend;
pub mod scoring;
pub mod store;

// Re-export core types for public API
pub use cache::{CacheSource, FreshnessRequirement};
pub use cities::{CitySearch, CityService};
pub use config::CitycastConfig;
pub use error::CitycastError;
pub use forecast::WeatherService;
pub use models::{City, WeatherObservation};
pub use open_meteo::{CityRecord, ForecastProvider, GeocodingProvider, OpenMeteoClient};
pub use recommend::{RecommendationService, Recommendations};
pub use scoring::{Activity, ActivityRecommendation, GeographyClass, RecommendationLevel};
pub use store::Store;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CitycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
