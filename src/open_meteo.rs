//! Open-Meteo upstream client
//!
//! Implements the geocoding and forecast provider seams over the public
//! Open-Meteo APIs. Transport failures and 5xx responses become
//! `UpstreamUnavailable` (retried transparently by the middleware for
//! transient cases); 4xx responses become `UpstreamRejected` and are never
//! retried or masked downstream.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::Result;
use crate::config::UpstreamConfig;
use crate::error::CitycastError;
use crate::models::{SunTimes, WeatherObservation};

/// Daily series requested from the forecast API.
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,weathercode,precipitation_sum,\
rain_sum,showers_sum,snowfall_sum,windspeed_10m_max,winddirection_10m_dominant,windgusts_10m_max,\
uv_index_max,sunrise,sunset,sunshine_duration";

/// Upstream geocoding provider seam.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Search cities by name, optionally filtered by ISO country code.
    async fn search(
        &self,
        name: &str,
        limit: usize,
        country_code: Option<&str>,
    ) -> Result<Vec<CityRecord>>;
}

/// Upstream weather provider seam.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch one multi-day daily forecast payload for a coordinate.
    async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
        timezone: &str,
    ) -> Result<DailyForecastPayload>;
}

/// Raw geocoding match as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CityRecord {
    /// Provider-assigned stable id
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub feature_code: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub admin1: Option<String>,
    pub admin2: Option<String>,
    pub admin3: Option<String>,
    pub admin4: Option<String>,
    pub timezone: Option<String>,
    pub population: Option<i64>,
    #[serde(default)]
    pub postcodes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<CityRecord>>,
}

/// One multi-day daily forecast, arrays positionally aligned by date index.
///
/// A missing series means the field is absent for every day, not zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyForecastPayload {
    #[serde(default)]
    pub time: Vec<String>,
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
    pub weathercode: Option<Vec<Option<i32>>>,
    pub precipitation_sum: Option<Vec<Option<f64>>>,
    pub rain_sum: Option<Vec<Option<f64>>>,
    pub showers_sum: Option<Vec<Option<f64>>>,
    pub snowfall_sum: Option<Vec<Option<f64>>>,
    pub windspeed_10m_max: Option<Vec<Option<f64>>>,
    pub winddirection_10m_dominant: Option<Vec<Option<f64>>>,
    pub windgusts_10m_max: Option<Vec<Option<f64>>>,
    pub uv_index_max: Option<Vec<Option<f64>>>,
    pub sunrise: Option<Vec<Option<String>>>,
    pub sunset: Option<Vec<Option<String>>>,
    pub sunshine_duration: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyForecastPayload>,
}

/// Error body returned by Open-Meteo on rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: Option<String>,
}

fn value_at(series: &Option<Vec<Option<f64>>>, idx: usize) -> Option<f64> {
    series.as_ref().and_then(|v| v.get(idx).copied().flatten())
}

fn code_at(series: &Option<Vec<Option<i32>>>, idx: usize) -> Option<i32> {
    series.as_ref().and_then(|v| v.get(idx).copied().flatten())
}

fn text_at(series: &Option<Vec<Option<String>>>, idx: usize) -> Option<String> {
    series.as_ref().and_then(|v| v.get(idx).cloned().flatten())
}

impl DailyForecastPayload {
    /// Number of days carried by the payload.
    #[must_use]
    pub fn day_count(&self) -> usize {
        self.time.len()
    }

    /// Build the observation row for day `idx`.
    ///
    /// A day missing any required series (temperatures, code, precipitation,
    /// wind speed) fails individually so callers can skip it without
    /// discarding the rest of the payload.
    pub fn observation_at(
        &self,
        idx: usize,
        city_id: i64,
        refreshed_at: DateTime<Utc>,
    ) -> Result<WeatherObservation> {
        let malformed = |field: &str| {
            CitycastError::unavailable(
                format!("forecast payload for city {city_id}"),
                format!("day {idx}: missing {field}"),
            )
        };

        let raw_date = self.time.get(idx).ok_or_else(|| malformed("time"))?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            CitycastError::unavailable(
                format!("forecast payload for city {city_id}"),
                format!("day {idx}: unparseable date '{raw_date}'"),
            )
        })?;

        // Sunrise and sunset are only kept as a pair
        let sunrise_sunset = match (text_at(&self.sunrise, idx), text_at(&self.sunset, idx)) {
            (Some(sunrise), Some(sunset)) => Some(SunTimes { sunrise, sunset }),
            _ => None,
        };

        Ok(WeatherObservation {
            city_id,
            date,
            max_temp: value_at(&self.temperature_2m_max, idx)
                .ok_or_else(|| malformed("temperature_2m_max"))?,
            min_temp: value_at(&self.temperature_2m_min, idx)
                .ok_or_else(|| malformed("temperature_2m_min"))?,
            weather_code: code_at(&self.weathercode, idx).ok_or_else(|| malformed("weathercode"))?,
            precipitation: value_at(&self.precipitation_sum, idx)
                .ok_or_else(|| malformed("precipitation_sum"))?,
            rain_sum: value_at(&self.rain_sum, idx),
            showers_sum: value_at(&self.showers_sum, idx),
            snowfall_sum: value_at(&self.snowfall_sum, idx),
            wind_speed: value_at(&self.windspeed_10m_max, idx)
                .ok_or_else(|| malformed("windspeed_10m_max"))?,
            wind_direction: value_at(&self.winddirection_10m_dominant, idx),
            wind_gusts: value_at(&self.windgusts_10m_max, idx),
            uv_index: value_at(&self.uv_index_max, idx),
            sunrise_sunset,
            sunshine_duration: value_at(&self.sunshine_duration, idx),
            last_refreshed_at: refreshed_at,
        })
    }
}

/// HTTP client for the Open-Meteo geocoding and forecast APIs.
pub struct OpenMeteoClient {
    http: ClientWithMiddleware,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    /// Build a client with the configured timeout and transient-retry budget.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let base = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("citycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CitycastError::config(format!("failed to build HTTP client: {err}")))?;
        let http = ClientBuilder::new(base)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query_label: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| CitycastError::unavailable(query_label, err.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let reason = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.reason)
                .unwrap_or_else(|| format!("status {status}"));
            return Err(CitycastError::rejected(query_label, reason));
        }
        if !status.is_success() {
            return Err(CitycastError::unavailable(
                query_label,
                format!("status {status}"),
            ));
        }

        response.json::<T>().await.map_err(|err| {
            CitycastError::unavailable(query_label, format!("invalid response payload: {err}"))
        })
    }
}

#[async_trait]
impl GeocodingProvider for OpenMeteoClient {
    async fn search(
        &self,
        name: &str,
        limit: usize,
        country_code: Option<&str>,
    ) -> Result<Vec<CityRecord>> {
        let mut url = format!(
            "{}/v1/search?name={}&count={limit}&language=en&format=json",
            self.geocoding_url,
            urlencoding::encode(name)
        );
        if let Some(cc) = country_code {
            url.push_str(&format!("&country_code={}", urlencoding::encode(cc)));
        }

        let label = format!("city search '{name}'");
        let response: GeocodingResponse = self.get_json(&url, &label).await?;
        let results = response.results.unwrap_or_default();
        debug!(query = name, count = results.len(), "geocoding search succeeded");
        Ok(results)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
        timezone: &str,
    ) -> Result<DailyForecastPayload> {
        let url = format!(
            "{}/v1/forecast?latitude={latitude}&longitude={longitude}&daily={DAILY_FIELDS}\
&timezone={}&forecast_days={days}",
            self.forecast_url,
            urlencoding::encode(timezone)
        );

        let label = format!("forecast ({latitude}, {longitude})");
        let response: ForecastResponse = self.get_json(&url, &label).await?;
        let daily = response.daily.unwrap_or_default();
        debug!(latitude, longitude, days = daily.day_count(), "forecast fetch succeeded");
        Ok(daily)
    }
}
