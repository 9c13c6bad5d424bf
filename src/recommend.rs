//! Recommendation orchestrator
//!
//! Ties the city lookup, the forecast cache, and the scoring engine together
//! for one (city, date) request.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::Result;
use crate::cities::CityService;
use crate::error::CitycastError;
use crate::forecast::WeatherService;
use crate::models::City;
use crate::scoring::{self, ActivityRecommendation};

/// Ranked activity recommendations for one city and date.
#[derive(Debug, Clone)]
pub struct Recommendations {
    pub city: City,
    pub date: NaiveDate,
    /// Sorted by score descending; ties keep the activity declaration order
    pub activities: Vec<ActivityRecommendation>,
}

/// Service producing ranked activity recommendations.
pub struct RecommendationService {
    cities: Arc<CityService>,
    weather: Arc<WeatherService>,
    default_forecast_days: u32,
}

impl RecommendationService {
    #[must_use]
    pub fn new(
        cities: Arc<CityService>,
        weather: Arc<WeatherService>,
        default_forecast_days: u32,
    ) -> Self {
        Self {
            cities,
            weather,
            default_forecast_days,
        }
    }

    /// Rank activities for a city and date, fetching the forecast on demand.
    pub async fn recommend(&self, city_id: i64, date: NaiveDate) -> Result<Recommendations> {
        let city = self.cities.city_by_id(city_id).await?;

        let observation = match self.weather.observation_for_date(city_id, date).await? {
            Some(observation) => observation,
            None => {
                // The on-demand fetch covers the default window anchored at
                // today; a requested date outside that window still ends up
                // NotFound below.
                debug!(city_id, %date, "no cached observation, fetching default window");
                self.weather
                    .forecast(&city, self.default_forecast_days)
                    .await?;
                self.weather
                    .observation_for_date(city_id, date)
                    .await?
                    .ok_or_else(|| CitycastError::ForecastNotFound {
                        city: city.name.clone(),
                        date,
                    })?
            }
        };

        let activities = scoring::recommendations(&city, &observation);
        Ok(Recommendations {
            city,
            date,
            activities,
        })
    }
}
