//! Embedded persistent store for cities and weather observations
//!
//! Backed by fjall keyspaces with postcard-encoded values. Natural-key
//! uniqueness (provider id for cities, (city, date) for weather) falls out of
//! insert-or-replace on the encoded key, which also makes concurrent writers
//! for the same key a benign last-writer-wins race. All storage calls run on
//! the blocking pool.

use std::path::Path;

use chrono::NaiveDate;
use fjall::Keyspace;
use tokio::task;

use crate::Result;
use crate::error::CitycastError;
use crate::models::{City, WeatherObservation};
use crate::open_meteo::CityRecord;

const NEXT_CITY_ID_KEY: &str = "next_city_id";

fn city_key(provider_id: i64) -> String {
    format!("{provider_id}")
}

fn city_index_key(id: i64) -> String {
    format!("{id:010}")
}

// Zero-padded city id keeps one city's rows in a contiguous, date-ordered
// key range.
fn weather_key(city_id: i64, date: NaiveDate) -> String {
    format!("{city_id:010}:{date}")
}

fn weather_prefix(city_id: i64) -> String {
    format!("{city_id:010}:")
}

/// Persistent store holding the city and weather collections.
pub struct Store {
    cities: Keyspace,
    city_index: Keyspace,
    weather: Keyspace,
    meta: Keyspace,
}

impl Store {
    /// Open (or create) the store at the given directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let cities = db.keyspace("cities", fjall::KeyspaceCreateOptions::default)?;
        let city_index = db.keyspace("city_index", fjall::KeyspaceCreateOptions::default)?;
        let weather = db.keyspace("weather", fjall::KeyspaceCreateOptions::default)?;
        let meta = db.keyspace("meta", fjall::KeyspaceCreateOptions::default)?;

        Ok(Store {
            cities,
            city_index,
            weather,
            meta,
        })
    }

    /// Insert-or-replace a city by its provider id.
    ///
    /// A city seen before keeps its local surrogate id and has every
    /// non-identity field refreshed; a new city is assigned the next id.
    pub async fn upsert_city(&self, record: CityRecord) -> Result<City> {
        let cities = self.cities.clone();
        let index = self.city_index.clone();
        let meta = self.meta.clone();

        task::spawn_blocking(move || upsert_city_blocking(&cities, &index, &meta, record)).await?
    }

    /// Look up a city by its local surrogate id.
    pub async fn city_by_id(&self, id: i64) -> Result<Option<City>> {
        let index = self.city_index.clone();
        let cities = self.cities.clone();

        task::spawn_blocking(move || -> Result<Option<City>> {
            let Some(provider_key) = index.get(city_index_key(id).as_bytes())?.map(|v| v.to_vec())
            else {
                return Ok(None);
            };
            match cities.get(&provider_key)? {
                Some(bytes) => Ok(Some(postcard::from_bytes(&bytes.to_vec())?)),
                None => Ok(None),
            }
        })
        .await?
    }

    /// Look up a city by the provider's geocoding id.
    pub async fn city_by_provider_id(&self, provider_id: i64) -> Result<Option<City>> {
        let cities = self.cities.clone();

        task::spawn_blocking(move || -> Result<Option<City>> {
            match cities.get(city_key(provider_id).as_bytes())? {
                Some(bytes) => Ok(Some(postcard::from_bytes(&bytes.to_vec())?)),
                None => Ok(None),
            }
        })
        .await?
    }

    /// Cities whose name contains the query (case-insensitive), optionally
    /// filtered by country code, ranked by population descending then name
    /// ascending, truncated to `limit`.
    pub async fn cities_matching(
        &self,
        name_contains: &str,
        country_code: Option<&str>,
        limit: usize,
    ) -> Result<Vec<City>> {
        let cities = self.cities.clone();
        let needle = name_contains.to_lowercase();
        let country = country_code.map(str::to_string);

        task::spawn_blocking(move || -> Result<Vec<City>> {
            let mut matches = Vec::new();
            for entry in cities.iter() {
                let (_, value) = entry.into_inner()?;
                let city: City = postcard::from_bytes(&value.to_vec())?;
                if !city.name.to_lowercase().contains(&needle) {
                    continue;
                }
                if let Some(cc) = &country {
                    if city.country_code.as_deref() != Some(cc.as_str()) {
                        continue;
                    }
                }
                matches.push(city);
            }

            // Prefer larger cities, then alphabetical
            matches.sort_by(|a, b| {
                b.population
                    .unwrap_or(0)
                    .cmp(&a.population.unwrap_or(0))
                    .then_with(|| a.name.cmp(&b.name))
            });
            matches.truncate(limit);
            Ok(matches)
        })
        .await?
    }

    /// Insert-or-replace the weather row for (`city_id`, `date`).
    pub async fn upsert_observation(
        &self,
        observation: WeatherObservation,
    ) -> Result<WeatherObservation> {
        let weather = self.weather.clone();

        task::spawn_blocking(move || -> Result<WeatherObservation> {
            let key = weather_key(observation.city_id, observation.date);
            let entity = format!(
                "weather row ({}, {})",
                observation.city_id, observation.date
            );
            let bytes = postcard::to_stdvec(&observation)
                .map_err(|err| CitycastError::write_failed(entity.clone(), err.to_string()))?;
            weather
                .insert(key.as_bytes(), bytes)
                .map_err(|err| CitycastError::write_failed(entity, err.to_string()))?;
            Ok(observation)
        })
        .await?
    }

    /// The single observation for (`city_id`, `date`), if present.
    pub async fn observation_for_date(
        &self,
        city_id: i64,
        date: NaiveDate,
    ) -> Result<Option<WeatherObservation>> {
        let weather = self.weather.clone();

        task::spawn_blocking(move || -> Result<Option<WeatherObservation>> {
            match weather.get(weather_key(city_id, date).as_bytes())? {
                Some(bytes) => Ok(Some(postcard::from_bytes(&bytes.to_vec())?)),
                None => Ok(None),
            }
        })
        .await?
    }

    /// All observations for a city with date in [`start`, `end`] inclusive,
    /// in date order.
    pub async fn observations_in_range(
        &self,
        city_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherObservation>> {
        let weather = self.weather.clone();

        task::spawn_blocking(move || -> Result<Vec<WeatherObservation>> {
            let mut rows = Vec::new();
            // ISO date keys make prefix iteration chronological already
            for entry in weather.prefix(weather_prefix(city_id).as_bytes()) {
                let (_, value) = entry.into_inner()?;
                let observation: WeatherObservation = postcard::from_bytes(&value.to_vec())?;
                if observation.date >= start && observation.date <= end {
                    rows.push(observation);
                }
            }
            Ok(rows)
        })
        .await?
    }
}

fn upsert_city_blocking(
    cities: &Keyspace,
    index: &Keyspace,
    meta: &Keyspace,
    record: CityRecord,
) -> Result<City> {
    let key = city_key(record.id);
    let existing: Option<City> = match cities.get(key.as_bytes())? {
        Some(bytes) => Some(postcard::from_bytes(&bytes.to_vec())?),
        None => None,
    };

    // The provider id is the natural key; the surrogate id survives refreshes
    let id = match &existing {
        Some(city) => city.id,
        None => next_city_id(meta)?,
    };

    let city = City {
        id,
        provider_id: record.id,
        name: record.name,
        latitude: record.latitude,
        longitude: record.longitude,
        elevation: record.elevation,
        timezone: record.timezone.unwrap_or_else(|| "auto".to_string()),
        feature_code: record.feature_code,
        country_code: record.country_code,
        country: record.country,
        admin1: record.admin1,
        admin2: record.admin2,
        admin3: record.admin3,
        admin4: record.admin4,
        population: record.population,
        postcodes: record.postcodes,
    };

    let entity = format!("city {}", city.provider_id);
    let bytes = postcard::to_stdvec(&city)
        .map_err(|err| CitycastError::write_failed(entity.clone(), err.to_string()))?;
    cities
        .insert(key.as_bytes(), bytes)
        .map_err(|err| CitycastError::write_failed(entity.clone(), err.to_string()))?;
    if existing.is_none() {
        index
            .insert(city_index_key(id).as_bytes(), key.as_bytes())
            .map_err(|err| CitycastError::write_failed(entity, err.to_string()))?;
    }

    Ok(city)
}

fn next_city_id(meta: &Keyspace) -> Result<i64> {
    let next = match meta.get(NEXT_CITY_ID_KEY.as_bytes())? {
        Some(bytes) => postcard::from_bytes::<i64>(&bytes.to_vec())?,
        None => 1,
    };
    meta.insert(NEXT_CITY_ID_KEY.as_bytes(), postcard::to_stdvec(&(next + 1))?)?;
    Ok(next)
}
