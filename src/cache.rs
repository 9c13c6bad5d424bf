//! Freshness-gated cache resolution
//!
//! One generic resolve loop shared by the city and weather services: serve
//! cached rows when enough of them are fresh, refetch and upsert otherwise,
//! and degrade to stale rows when the upstream is unavailable. Each service
//! supplies its own notion of "cached", "fresh", and "enough" through the
//! [`CacheSource`] trait.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::Result;

/// How many cached rows must be fresh before the upstream call is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessRequirement {
    /// At least this many fresh rows satisfy the query.
    AtLeast(usize),
    /// Every cached row must be fresh and at least one must exist; a single
    /// stale row invalidates the whole set.
    All,
}

/// A cached collection backed by an upstream fetcher.
#[async_trait]
pub trait CacheSource {
    /// Query key identifying one cacheable result set.
    type Query: Send + Sync;
    /// What the upstream returns, before persistence.
    type Fetched: Send;
    /// What the cache stores and serves.
    type Entity: Send;

    /// Cached rows matching the query, in presentation order.
    async fn read_cached(&self, query: &Self::Query) -> Result<Vec<Self::Entity>>;

    /// Freshness predicate for a single cached row.
    fn is_fresh(&self, entity: &Self::Entity) -> bool;

    /// Freshness requirement for this query.
    fn requirement(&self, query: &Self::Query) -> FreshnessRequirement;

    /// Fetch the authoritative rows from upstream.
    async fn fetch_upstream(&self, query: &Self::Query) -> Result<Vec<Self::Fetched>>;

    /// Insert-or-replace one fetched row by its natural key.
    async fn upsert(&self, item: Self::Fetched) -> Result<Self::Entity>;

    /// Short query description for logs and error context.
    fn describe(&self, query: &Self::Query) -> String;
}

/// Resolve a query through the cache.
///
/// Upstream results are persisted row by row; a row that fails to persist is
/// logged and skipped, never aborting the batch. When the upstream is
/// unavailable and any cached rows exist (fresh or stale) they are served as
/// a degraded result; a rejected request is always surfaced since neither
/// retrying nor stale data can fix it.
pub async fn resolve<S: CacheSource>(source: &S, query: &S::Query) -> Result<Vec<S::Entity>> {
    let cached = source.read_cached(query).await?;
    let fresh = cached.iter().filter(|e| source.is_fresh(e)).count();

    let satisfied = match source.requirement(query) {
        FreshnessRequirement::AtLeast(min) => fresh >= min,
        FreshnessRequirement::All => !cached.is_empty() && fresh == cached.len(),
    };
    if satisfied {
        debug!(
            query = %source.describe(query),
            count = cached.len(),
            "cache satisfied query"
        );
        return Ok(cached);
    }

    match source.fetch_upstream(query).await {
        Ok(fetched) => {
            let mut stored = Vec::with_capacity(fetched.len());
            for item in fetched {
                match source.upsert(item).await {
                    Ok(entity) => stored.push(entity),
                    Err(err) => {
                        error!(
                            query = %source.describe(query),
                            %err,
                            "failed to persist row, skipping"
                        );
                    }
                }
            }
            debug!(
                query = %source.describe(query),
                count = stored.len(),
                "cached and returning upstream rows"
            );
            Ok(stored)
        }
        Err(err) if err.allows_cache_fallback() && !cached.is_empty() => {
            warn!(
                query = %source.describe(query),
                %err,
                count = cached.len(),
                "upstream failed, falling back to cached rows"
            );
            Ok(cached)
        }
        Err(err) => Err(err),
    }
}
