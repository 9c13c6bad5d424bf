//! Daily weather observation model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Sunrise/sunset pair in the provider's local-time ISO format.
///
/// Kept only when the provider reports both events for the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: String,
    pub sunset: String,
}

/// One day of forecast weather for one city.
///
/// Identity is (`city_id`, `date`); the store enforces uniqueness by
/// insert-or-replace, so a refresh rewrites the whole row. Optional fields
/// were absent from the upstream response, which is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub city_id: i64,
    pub date: NaiveDate,
    /// Daily maximum temperature in degrees Celsius
    pub max_temp: f64,
    /// Daily minimum temperature in degrees Celsius
    pub min_temp: f64,
    /// WMO-style condition code
    pub weather_code: i32,
    /// Precipitation sum in mm
    pub precipitation: f64,
    pub rain_sum: Option<f64>,
    pub showers_sum: Option<f64>,
    /// Snowfall sum in cm
    pub snowfall_sum: Option<f64>,
    /// Daily maximum wind speed in km/h
    pub wind_speed: f64,
    /// Dominant wind direction in degrees
    pub wind_direction: Option<f64>,
    pub wind_gusts: Option<f64>,
    pub uv_index: Option<f64>,
    pub sunrise_sunset: Option<SunTimes>,
    /// Sunshine duration in seconds
    pub sunshine_duration: Option<f64>,
    /// When this row was last written; drives cache freshness
    pub last_refreshed_at: DateTime<Utc>,
}

impl WeatherObservation {
    /// Midpoint of the daily temperature range, the scoring engine's input
    #[must_use]
    pub fn average_temp(&self) -> f64 {
        (self.max_temp + self.min_temp) / 2.0
    }
}
