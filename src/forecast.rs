//! Per-city daily forecast service
//!
//! Weather rows age out: a row refreshed more than the TTL ago is stale, and
//! one stale row anywhere in the requested window forces a full refetch. The
//! upstream multi-day payload is unpacked into per-date rows before the
//! row-by-row upsert.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::Result;
use crate::cache::{self, CacheSource, FreshnessRequirement};
use crate::models::{City, WeatherObservation};
use crate::open_meteo::ForecastProvider;
use crate::store::Store;

/// One forecast-window request for a city.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub city: City,
    pub days: u32,
}

/// Whether a row is still inside its freshness window.
///
/// Strict comparison: a row refreshed exactly `ttl` ago is already stale.
#[must_use]
pub fn observation_is_fresh(
    observation: &WeatherObservation,
    now: DateTime<Utc>,
    ttl: Duration,
) -> bool {
    observation.last_refreshed_at > now - ttl
}

/// Service for fetching and caching per-city daily forecasts.
pub struct WeatherService {
    store: Arc<Store>,
    provider: Arc<dyn ForecastProvider>,
    ttl: Duration,
}

impl WeatherService {
    #[must_use]
    pub fn new(store: Arc<Store>, provider: Arc<dyn ForecastProvider>, ttl_minutes: u32) -> Self {
        Self {
            store,
            provider,
            ttl: Duration::minutes(i64::from(ttl_minutes)),
        }
    }

    /// Forecast window for a city, served from cache when every row is fresh.
    pub async fn forecast(&self, city: &City, days: u32) -> Result<Vec<WeatherObservation>> {
        debug!(city_id = city.id, days, "resolving forecast window");
        let request = ForecastRequest {
            city: city.clone(),
            days,
        };
        cache::resolve(self, &request).await
    }

    /// The single observation for (`city_id`, `date`), if cached.
    pub async fn observation_for_date(
        &self,
        city_id: i64,
        date: NaiveDate,
    ) -> Result<Option<WeatherObservation>> {
        self.store.observation_for_date(city_id, date).await
    }

    // Window anchored at today, end inclusive.
    fn window(days: u32) -> (NaiveDate, NaiveDate) {
        let start = Utc::now().date_naive();
        (start, start + Duration::days(i64::from(days)))
    }
}

#[async_trait]
impl CacheSource for WeatherService {
    type Query = ForecastRequest;
    type Fetched = WeatherObservation;
    type Entity = WeatherObservation;

    async fn read_cached(&self, query: &ForecastRequest) -> Result<Vec<WeatherObservation>> {
        let (start, end) = Self::window(query.days);
        self.store
            .observations_in_range(query.city.id, start, end)
            .await
    }

    fn is_fresh(&self, entity: &WeatherObservation) -> bool {
        observation_is_fresh(entity, Utc::now(), self.ttl)
    }

    // One stale row invalidates the whole window
    fn requirement(&self, _query: &ForecastRequest) -> FreshnessRequirement {
        FreshnessRequirement::All
    }

    async fn fetch_upstream(&self, query: &ForecastRequest) -> Result<Vec<WeatherObservation>> {
        let payload = self
            .provider
            .daily_forecast(
                query.city.latitude,
                query.city.longitude,
                query.days,
                &query.city.timezone,
            )
            .await?;

        let refreshed_at = Utc::now();
        let mut rows = Vec::with_capacity(payload.day_count());
        for idx in 0..payload.day_count() {
            match payload.observation_at(idx, query.city.id, refreshed_at) {
                Ok(row) => rows.push(row),
                Err(err) => {
                    warn!(city_id = query.city.id, day = idx, %err, "skipping malformed forecast day");
                }
            }
        }
        if rows.is_empty() {
            warn!(city_id = query.city.id, "no daily weather data received");
        }
        Ok(rows)
    }

    async fn upsert(&self, observation: WeatherObservation) -> Result<WeatherObservation> {
        self.store.upsert_observation(observation).await
    }

    fn describe(&self, query: &ForecastRequest) -> String {
        format!("forecast for city {} over {} days", query.city.id, query.days)
    }
}
