use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

use citycast::scoring;
use citycast::{
    CitySearch, CityService, CitycastConfig, OpenMeteoClient, RecommendationService, Store,
    WeatherService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = CitycastConfig::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let store = Arc::new(Store::open(config.store_path()).context("failed to open store")?);
    let client = Arc::new(OpenMeteoClient::new(&config.upstream)?);
    let cities = Arc::new(CityService::new(
        store.clone(),
        client.clone(),
        config.cache.min_city_results,
    ));
    let weather = Arc::new(WeatherService::new(
        store,
        client,
        config.cache.weather_ttl_minutes,
    ));
    let recommender =
        RecommendationService::new(cities.clone(), weather.clone(), config.cache.forecast_days);

    match args.first().map(String::as_str) {
        Some("search") => {
            let Some(query) = args.get(1) else {
                bail!("usage: citycast search <query> [country-code]");
            };
            let mut search = CitySearch::new(query.as_str(), 10);
            if let Some(country) = args.get(2) {
                search = search.with_country(country.as_str());
            }

            let results = cities.search_cities(&search).await?;
            if results.is_empty() {
                println!("No cities found for '{query}'");
                return Ok(());
            }
            for city in results {
                println!(
                    "{:>10}  {}  ({:.4}, {:.4})",
                    city.id,
                    city.label(),
                    city.latitude,
                    city.longitude
                );
            }
        }
        Some("forecast") => {
            let Some(raw_id) = args.get(1) else {
                bail!("usage: citycast forecast <city-id> [days]");
            };
            let city_id: i64 = raw_id.parse().context("city id must be an integer")?;
            let days: u32 = match args.get(2) {
                Some(raw) => raw.parse().context("days must be an integer")?,
                None => config.cache.forecast_days,
            };

            let city = cities.city_by_id(city_id).await?;
            println!("Forecast for {}", city.label());
            for row in weather.forecast(&city, days).await? {
                println!(
                    "{}  {:<13} {:>5.1}°C / {:>5.1}°C  precip {:>4.1}mm  wind {:>5.1} km/h",
                    row.date,
                    scoring::description(row.weather_code),
                    row.max_temp,
                    row.min_temp,
                    row.precipitation,
                    row.wind_speed
                );
            }
        }
        Some("recommend") => {
            let (Some(raw_id), Some(raw_date)) = (args.get(1), args.get(2)) else {
                bail!("usage: citycast recommend <city-id> <date>");
            };
            let city_id: i64 = raw_id.parse().context("city id must be an integer")?;
            let date: NaiveDate = raw_date.parse().context("date must be YYYY-MM-DD")?;

            let result = recommender.recommend(city_id, date).await?;
            println!("Recommendations for {} on {}", result.city.label(), result.date);
            for entry in result.activities {
                println!(
                    "{:>5.0}  {:<16} {:<19} {}",
                    entry.score,
                    entry.recommendation.to_string(),
                    entry.activity.to_string(),
                    entry.reasoning
                );
            }
        }
        _ => {
            println!("citycast {} - weather-aware activity recommendations", citycast::VERSION);
            println!();
            println!("Usage:");
            println!("  citycast search <query> [country-code]");
            println!("  citycast forecast <city-id> [days]");
            println!("  citycast recommend <city-id> <date>");
        }
    }

    Ok(())
}
