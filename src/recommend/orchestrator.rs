//! Recommendation Orchestrator - bounded-retry model call with fallback
//!
//! Algorithm:
//! 1. Build the grounding request from spec, bill and full catalog
//! 2. Call the model under a per-attempt deadline
//! 3. Extract + validate the JSON object
//! 4. On a transient failure, wait the backoff and retry (bounded)
//! 5. After the last attempt, or on a permanent failure, yield `Unavailable`
//!
//! Never returns an error to the caller: the bill is always presentable.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::model::{GenerativeModel, ModelError, ModelRequest};
use super::parse::{parse_recommendation, OutputError, ParseError, ValidationError};
use super::prompt::{build_recommendation_request, REQUESTED_OPTIMIZATIONS};
use super::types::{RecommendationOutcome, RecommendationResult};
use crate::catalog::MaterialCatalog;
use crate::types::{BillOfMaterials, BuildingSpec};

/// Default attempt count (first call + one retry)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1500);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded retry settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (min 1)
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
    /// Deadline for a single model call
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<OutputError> for AttemptFailure {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Parse(e) => AttemptFailure::Parse(e),
            OutputError::Validation(e) => AttemptFailure::Validation(e),
        }
    }
}

impl AttemptFailure {
    /// Malformed or invalid output counts as transient: a resample may fix it
    pub fn is_transient(&self) -> bool {
        match self {
            AttemptFailure::Model(e) => e.is_transient(),
            AttemptFailure::Parse(_) | AttemptFailure::Validation(_) => true,
        }
    }
}

/// Terminal failure after the retry budget is spent
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("recommendation failed after {attempts} attempt(s): {last}")]
pub struct RecommendationFailure {
    pub attempts: u32,
    pub last: AttemptFailure,
}

/// Calls the model, validates its output and degrades to `Unavailable`
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    model: Arc<dyn GenerativeModel>,
    policy: RetryPolicy,
}

impl RecommendationOrchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>, policy: RetryPolicy) -> Self {
        Self { model, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.model.provider_name()
    }

    /// Recommendation for a bill, or `Unavailable` on terminal failure
    pub async fn recommend(
        &self,
        spec: &BuildingSpec,
        bill: &BillOfMaterials,
        catalog: &MaterialCatalog,
    ) -> RecommendationOutcome {
        match self.try_recommend(spec, bill, catalog).await {
            Ok(result) => RecommendationOutcome::Available(result),
            Err(failure) => {
                warn!("Recommendation unavailable: {}", failure);
                RecommendationOutcome::Unavailable
            }
        }
    }

    /// Same as `recommend` but surfaces the terminal failure
    pub async fn try_recommend(
        &self,
        spec: &BuildingSpec,
        bill: &BillOfMaterials,
        catalog: &MaterialCatalog,
    ) -> Result<RecommendationResult, RecommendationFailure> {
        let request = build_recommendation_request(spec, bill, catalog);
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                "Recommendation attempt {}/{} via {}",
                attempt,
                max_attempts,
                self.model.provider_name()
            );

            match self.attempt(&request, catalog).await {
                Ok(result) => {
                    if result.optimizations.len() != REQUESTED_OPTIMIZATIONS {
                        warn!(
                            "Model returned {} optimizations (asked for {})",
                            result.optimizations.len(),
                            REQUESTED_OPTIMIZATIONS
                        );
                    }
                    info!(
                        "Recommendation ready after {} attempt(s): {} hotspots, {} optimizations",
                        attempt,
                        result.hotspots.len(),
                        result.optimizations.len()
                    );
                    return Ok(result);
                }
                Err(failure) => {
                    if !failure.is_transient() {
                        warn!("Attempt {} failed permanently: {}", attempt, failure);
                        return Err(RecommendationFailure { attempts: attempt, last: failure });
                    }
                    if attempt >= max_attempts {
                        warn!("Attempt {} failed, retry budget spent: {}", attempt, failure);
                        return Err(RecommendationFailure { attempts: attempt, last: failure });
                    }
                    warn!(
                        "Attempt {} failed: {} (retrying in {:?})",
                        attempt, failure, self.policy.backoff
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
        }
    }

    /// One deadline-bounded call plus output validation
    async fn attempt(
        &self,
        request: &ModelRequest,
        catalog: &MaterialCatalog,
    ) -> Result<RecommendationResult, AttemptFailure> {
        let raw = match tokio::time::timeout(self.policy.attempt_timeout, self.model.generate(request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ModelError::Timeout(self.policy.attempt_timeout.as_millis() as u64).into())
            }
        };
        Ok(parse_recommendation(&raw, catalog)?)
    }
}
