//! Per-session recommendation cache (Moka)
//!
//! The model is consulted at most once per (session, spec) pair. Concurrent
//! lookups for the same key share one in-flight computation.

use moka::future::Cache;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use super::types::RecommendationOutcome;
use crate::types::BuildingSpec;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
const MAX_SESSIONS: u64 = 10_000;

#[derive(Clone)]
pub struct RecommendationCache {
    inner: Cache<String, RecommendationOutcome>,
}

impl RecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Cache key: session id plus the spec it was analyzed with
    pub fn key(session_id: &str, spec: &BuildingSpec) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}",
            session_id,
            spec.building_type,
            spec.area,
            spec.floors,
            spec.location,
            spec.cost_sensitivity.as_str()
        )
    }

    /// Cached outcome, or run `init` once and keep its result
    ///
    /// `Unavailable` is cached too: a session that fell back keeps rendering
    /// the bill without re-hitting the model.
    pub async fn get_or_recommend<F>(&self, key: String, init: F) -> RecommendationOutcome
    where
        F: Future<Output = RecommendationOutcome>,
    {
        if let Some(cached) = self.inner.get(&key).await {
            debug!("Cache hit for recommendation {}", key);
            return cached;
        }
        self.inner.get_with(key, init).await
    }

    pub async fn get(&self, key: &str) -> Option<RecommendationOutcome> {
        self.inner.get(key).await
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

impl Default for RecommendationCache {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}
