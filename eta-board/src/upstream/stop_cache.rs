//! Permanent stop-metadata cache.
//!
//! Stop names and coordinates are static for the life of a session, so
//! entries are never expired or evicted. Concurrent lookups of the same
//! stop are coalesced into one upstream request.

use std::future::Future;
use std::sync::Arc;

use moka::future::Cache as MokaCache;

use super::error::UpstreamError;
use crate::domain::{BusOperator, StopInfo};

/// Cache key: stop identity is `(operator, stop id)`.
type StopKey = (BusOperator, String);

/// Shared cache of resolved stop metadata.
#[derive(Clone)]
pub struct StopCache {
    entries: MokaCache<StopKey, StopInfo>,
}

impl Default for StopCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StopCache {
    /// Create an empty cache with no TTL and no capacity bound.
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }

    /// Look up a stop without fetching.
    pub async fn get(&self, operator: BusOperator, stop_id: &str) -> Option<StopInfo> {
        self.entries.get(&(operator, stop_id.to_string())).await
    }

    /// Record metadata obtained as a side effect of another request.
    pub async fn insert(&self, operator: BusOperator, stop_id: &str, info: StopInfo) {
        self.entries.insert((operator, stop_id.to_string()), info).await;
    }

    /// Return the cached entry, or run `fetch` once and cache its result.
    ///
    /// Failures are returned to every waiter and are not cached.
    pub async fn get_or_fetch<Fut>(
        &self,
        operator: BusOperator,
        stop_id: &str,
        fetch: Fut,
    ) -> Result<StopInfo, Arc<UpstreamError>>
    where
        Fut: Future<Output = Result<StopInfo, UpstreamError>>,
    {
        self.entries
            .try_get_with((operator, stop_id.to_string()), fetch)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> StopInfo {
        StopInfo {
            name: name.to_string(),
            latitude: Some(22.3),
            longitude: Some(114.1),
        }
    }

    #[tokio::test]
    async fn fetch_runs_once_per_stop() {
        let cache = StopCache::new();

        let first = cache
            .get_or_fetch(BusOperator::Kmb, "S1", async { Ok(info("旺角")) })
            .await
            .unwrap();
        assert_eq!(first.name, "旺角");

        let second = cache
            .get_or_fetch(BusOperator::Kmb, "S1", async {
                panic!("cached entry should be reused")
            })
            .await
            .unwrap();
        assert_eq!(second.name, "旺角");
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = StopCache::new();

        let err = cache
            .get_or_fetch(BusOperator::Ctb, "S1", async { Err(UpstreamError::NoData) })
            .await;
        assert!(err.is_err());
        assert!(cache.get(BusOperator::Ctb, "S1").await.is_none());

        let ok = cache
            .get_or_fetch(BusOperator::Ctb, "S1", async { Ok(info("中環")) })
            .await
            .unwrap();
        assert_eq!(ok.name, "中環");
    }

    #[tokio::test]
    async fn operators_do_not_share_ids() {
        let cache = StopCache::new();
        cache.insert(BusOperator::Nlb, "7", info("東涌")).await;

        assert!(cache.get(BusOperator::Nlb, "7").await.is_some());
        assert!(cache.get(BusOperator::Kmb, "7").await.is_none());
    }
}
