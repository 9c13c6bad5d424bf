//! City model backed by geocoding data

use serde::{Deserialize, Serialize};

/// A geocoded city as persisted in the store.
///
/// `provider_id` is the geocoding provider's stable identifier and is
/// immutable once stored. `id` is the local surrogate key allocated on first
/// insert; the pair is jointly unique. All other fields are refreshed in
/// place whenever the provider returns the city again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Local surrogate id, allocated on first insert
    pub id: i64,
    /// Provider-assigned geocoding id (natural key)
    pub provider_id: i64,
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Elevation in meters; absent elevation is scored as sea level
    pub elevation: Option<f64>,
    /// IANA timezone name used for forecast requests
    pub timezone: String,
    pub feature_code: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub admin1: Option<String>,
    pub admin2: Option<String>,
    pub admin3: Option<String>,
    pub admin4: Option<String>,
    pub population: Option<i64>,
    pub postcodes: Vec<String>,
}

impl City {
    /// Display label combining name and the most specific region info available
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.admin1, &self.country) {
            (Some(admin1), Some(country)) => format!("{}, {admin1}, {country}", self.name),
            (None, Some(country)) => format!("{}, {country}", self.name),
            _ => self.name.clone(),
        }
    }
}
