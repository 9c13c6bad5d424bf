//! City search and lookup service
//!
//! Caches geocoding results permanently: a city that is present is fresh, so
//! upstream is only consulted when the cached candidate set is too small for
//! the query.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::cache::{self, CacheSource, FreshnessRequirement};
use crate::error::CitycastError;
use crate::models::City;
use crate::open_meteo::{CityRecord, GeocodingProvider};
use crate::store::Store;

/// One city search request.
#[derive(Debug, Clone)]
pub struct CitySearch {
    /// Name substring to match, case-insensitive
    pub query: String,
    /// Maximum number of results
    pub limit: usize,
    /// Optional ISO country-code filter
    pub country_code: Option<String>,
}

impl CitySearch {
    #[must_use]
    pub fn new(query: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            limit,
            country_code: None,
        }
    }

    #[must_use]
    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }
}

/// Service for searching and resolving cities.
pub struct CityService {
    store: Arc<Store>,
    provider: Arc<dyn GeocodingProvider>,
    /// Floor below which a cached result set is not worth returning without
    /// consulting upstream; the effective minimum is `min(limit, floor)`.
    min_results: usize,
}

impl CityService {
    #[must_use]
    pub fn new(store: Arc<Store>, provider: Arc<dyn GeocodingProvider>, min_results: usize) -> Self {
        Self {
            store,
            provider,
            min_results,
        }
    }

    /// Search cities, serving cached matches when enough exist.
    pub async fn search_cities(&self, search: &CitySearch) -> Result<Vec<City>> {
        debug!(
            query = %search.query,
            limit = search.limit,
            country = ?search.country_code,
            "searching cities"
        );
        cache::resolve(self, search).await
    }

    /// Resolve a city by its local surrogate id; unknown ids are fatal.
    pub async fn city_by_id(&self, id: i64) -> Result<City> {
        self.store
            .city_by_id(id)
            .await?
            .ok_or(CitycastError::CityNotFound { city_id: id })
    }

    /// Resolve a city by the provider's geocoding id.
    pub async fn city_by_provider_id(&self, provider_id: i64) -> Result<Option<City>> {
        self.store.city_by_provider_id(provider_id).await
    }
}

#[async_trait]
impl CacheSource for CityService {
    type Query = CitySearch;
    type Fetched = CityRecord;
    type Entity = City;

    async fn read_cached(&self, query: &CitySearch) -> Result<Vec<City>> {
        self.store
            .cities_matching(&query.query, query.country_code.as_deref(), query.limit)
            .await
    }

    // Geocoding data never expires; presence is freshness
    fn is_fresh(&self, _entity: &City) -> bool {
        true
    }

    fn requirement(&self, query: &CitySearch) -> FreshnessRequirement {
        FreshnessRequirement::AtLeast(query.limit.min(self.min_results))
    }

    async fn fetch_upstream(&self, query: &CitySearch) -> Result<Vec<CityRecord>> {
        self.provider
            .search(&query.query, query.limit, query.country_code.as_deref())
            .await
    }

    async fn upsert(&self, record: CityRecord) -> Result<City> {
        self.store.upsert_city(record).await
    }

    fn describe(&self, query: &CitySearch) -> String {
        match &query.country_code {
            Some(cc) => format!("city search '{}' in {cc}", query.query),
            None => format!("city search '{}'", query.query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StaticGeocoder {
        records: Vec<CityRecord>,
        available: bool,
        calls: AtomicUsize,
    }

    impl StaticGeocoder {
        fn with_records(records: Vec<CityRecord>) -> Self {
            Self {
                records,
                available: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                records: vec![],
                available: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GeocodingProvider for StaticGeocoder {
        async fn search(
            &self,
            name: &str,
            _limit: usize,
            _country_code: Option<&str>,
        ) -> Result<Vec<CityRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.available {
                return Err(CitycastError::unavailable(
                    format!("city search '{name}'"),
                    "connection refused",
                ));
            }
            Ok(self.records.clone())
        }
    }

    fn record(id: i64, name: &str, population: Option<i64>) -> CityRecord {
        CityRecord {
            id,
            name: name.to_string(),
            latitude: 48.0,
            longitude: 11.0,
            elevation: Some(520.0),
            feature_code: None,
            country_code: Some("DE".to_string()),
            country: Some("Germany".to_string()),
            admin1: None,
            admin2: None,
            admin3: None,
            admin4: None,
            timezone: Some("Europe/Berlin".to_string()),
            population,
            postcodes: vec![],
        }
    }

    fn service(dir: &TempDir, provider: StaticGeocoder) -> (Arc<Store>, CityService, Arc<StaticGeocoder>) {
        let store = Arc::new(Store::open(dir.path()).unwrap());
        let provider = Arc::new(provider);
        let service = CityService::new(store.clone(), provider.clone(), 5);
        (store, service, provider)
    }

    #[tokio::test]
    async fn test_search_fetches_and_caches_new_cities() {
        let dir = TempDir::new().unwrap();
        let (store, service, provider) = service(
            &dir,
            StaticGeocoder::with_records(vec![
                record(1, "Munich", Some(1_500_000)),
                record(2, "Munster", Some(300_000)),
            ]),
        );

        let search = CitySearch::new("mun", 10);
        let cities = service.search_cities(&search).await.unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // The rows were persisted with surrogate ids
        let cached = store.cities_matching("mun", None, 10).await.unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn test_search_serves_cache_when_floor_met() {
        let dir = TempDir::new().unwrap();
        let (store, service, provider) =
            service(&dir, StaticGeocoder::with_records(vec![record(9, "Hamm", None)]));

        for id in 1..=5 {
            store
                .upsert_city(record(id, &format!("Hamburg {id}"), Some(id * 100)))
                .await
                .unwrap();
        }

        let cities = service.search_cities(&CitySearch::new("hamburg", 10)).await.unwrap();
        assert_eq!(cities.len(), 5);
        // min(limit, floor) = 5 cached rows already satisfy the query
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_low_limit_lowers_the_floor() {
        let dir = TempDir::new().unwrap();
        let (store, service, provider) =
            service(&dir, StaticGeocoder::with_records(vec![record(9, "Hannover", None)]));

        store.upsert_city(record(1, "Hanau", Some(100))).await.unwrap();

        // limit 1 needs only one cached row
        let cities = service.search_cities(&CitySearch::new("han", 1)).await.unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_falls_back_to_cache_on_outage() {
        let dir = TempDir::new().unwrap();
        let (store, service, provider) = service(&dir, StaticGeocoder::unavailable());

        store.upsert_city(record(1, "Lisbon", Some(500_000))).await.unwrap();

        let cities = service.search_cities(&CitySearch::new("lis", 10)).await.unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Lisbon");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_surfaces_outage_with_empty_cache() {
        let dir = TempDir::new().unwrap();
        let (_store, service, _provider) = service(&dir, StaticGeocoder::unavailable());

        let err = service
            .search_cities(&CitySearch::new("atlantis", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CitycastError::UpstreamUnavailable { .. }));
        assert!(err.to_string().contains("atlantis"));
    }

    #[tokio::test]
    async fn test_city_by_id_not_found() {
        let dir = TempDir::new().unwrap();
        let (_store, service, _provider) = service(&dir, StaticGeocoder::with_records(vec![]));

        let err = service.city_by_id(99).await.unwrap_err();
        assert!(matches!(err, CitycastError::CityNotFound { city_id: 99 }));
    }
}
