//! Error types and handling for the citycast library

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the citycast library
#[derive(Error, Debug)]
pub enum CitycastError {
    /// Unknown city id; fatal to the calling request
    #[error("city {city_id} not found")]
    CityNotFound { city_id: i64 },

    /// No weather row for the requested date even after a fetch attempt
    #[error("no weather forecast available for {city} on {date}")]
    ForecastNotFound { city: String, date: NaiveDate },

    /// Transport, timeout, or 5xx-class failure talking to a provider
    #[error("upstream request failed ({query}): {message}")]
    UpstreamUnavailable { query: String, message: String },

    /// 4xx-class provider response; never masked by a cache fallback
    #[error("upstream rejected request ({query}): {reason}")]
    UpstreamRejected { query: String, reason: String },

    /// Single-row upsert failure during a batch cache write
    #[error("failed to persist {entity}: {message}")]
    PersistenceWriteFailed { entity: String, message: String },

    /// Storage-layer fault outside of batch upserts
    #[error("store error: {message}")]
    Store { message: String },

    /// Configuration-related errors
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl CitycastError {
    /// Create a new upstream-unavailable error
    pub fn unavailable<Q: Into<String>, M: Into<String>>(query: Q, message: M) -> Self {
        Self::UpstreamUnavailable {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Create a new upstream-rejected error
    pub fn rejected<Q: Into<String>, R: Into<String>>(query: Q, reason: R) -> Self {
        Self::UpstreamRejected {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create a new persistence-write error
    pub fn write_failed<E: Into<String>, M: Into<String>>(entity: E, message: M) -> Self {
        Self::PersistenceWriteFailed {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<M: Into<String>>(message: M) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a degraded cached result may stand in for this failure.
    ///
    /// Only transient upstream outages qualify; a rejected request would fail
    /// identically on retry, so serving stale data would hide a caller bug.
    #[must_use]
    pub fn allows_cache_fallback(&self) -> bool {
        matches!(self, CitycastError::UpstreamUnavailable { .. })
    }
}

impl From<fjall::Error> for CitycastError {
    fn from(err: fjall::Error) -> Self {
        CitycastError::store(err.to_string())
    }
}

impl From<postcard::Error> for CitycastError {
    fn from(err: postcard::Error) -> Self {
        CitycastError::store(format!("serialization: {err}"))
    }
}

impl From<tokio::task::JoinError> for CitycastError {
    fn from(err: tokio::task::JoinError) -> Self {
        CitycastError::store(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let unavailable = CitycastError::unavailable("city search 'ber'", "timeout");
        assert!(matches!(
            unavailable,
            CitycastError::UpstreamUnavailable { .. }
        ));

        let rejected = CitycastError::rejected("forecast", "invalid latitude");
        assert!(matches!(rejected, CitycastError::UpstreamRejected { .. }));

        let write = CitycastError::write_failed("weather row", "disk full");
        assert!(matches!(write, CitycastError::PersistenceWriteFailed { .. }));
    }

    #[test]
    fn test_only_unavailable_allows_fallback() {
        assert!(CitycastError::unavailable("q", "m").allows_cache_fallback());

        assert!(!CitycastError::rejected("q", "r").allows_cache_fallback());
        assert!(!CitycastError::CityNotFound { city_id: 1 }.allows_cache_fallback());
        assert!(!CitycastError::store("m").allows_cache_fallback());
        assert!(!CitycastError::write_failed("e", "m").allows_cache_fallback());
    }

    #[test]
    fn test_error_messages_identify_query() {
        let err = CitycastError::unavailable("city search 'berlin'", "connect timeout");
        let msg = err.to_string();
        assert!(msg.contains("city search 'berlin'"));
        assert!(msg.contains("connect timeout"));

        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let err = CitycastError::ForecastNotFound {
            city: "Oslo".to_string(),
            date,
        };
        assert!(err.to_string().contains("Oslo"));
        assert!(err.to_string().contains("2025-03-01"));
    }
}
