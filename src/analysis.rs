//! Analysis Service - request boundary for the decision core
//!
//! Flow for one analysis:
//! 1. Validate the spec and compute the baseline bill (bias 0)
//! 2. Ask the orchestrator for a recommendation (once per session)
//! 3. Attach the impact report and the catalog for client-side recalculation
//!
//! Engine errors are hard failures; recommendation failure is not.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::MaterialCatalog;
use crate::config::ServiceConfig;
use crate::engine::DecisionEngine;
use crate::error::EngineResult;
use crate::impact::ImpactReport;
use crate::recommend::{
    DisabledModel, GenerativeModel, HttpGenerativeModel, RecommendationCache, RecommendationOrchestrator,
    RecommendationOutcome, RetryPolicy,
};
use crate::scenarios::{self, ScenarioComparison};
use crate::types::{BillOfMaterials, BuildingSpec, OptimizationBias};

/// Analyze request: the spec plus an optional session id
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub spec: BuildingSpec,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(spec: BuildingSpec) -> Self {
        Self { spec, session_id: None }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub baseline: BillOfMaterials,
    /// `null` when unavailable
    pub recommendation: RecommendationOutcome,
    pub recommendation_status: &'static str,
    pub impact: ImpactReport,
    /// Full catalog for client-side recalculation
    pub catalog: MaterialCatalog,
}

/// Engine-only request: spec plus bias (default 0)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BiasRequest {
    pub spec: BuildingSpec,
    #[serde(default)]
    pub bias: Option<OptimizationBias>,
}

impl BiasRequest {
    pub fn bias(&self) -> OptimizationBias {
        self.bias.unwrap_or(OptimizationBias::BASELINE)
    }
}

/// Bill with its impact report
#[derive(Debug, Clone, Serialize)]
pub struct BillReport {
    #[serde(flatten)]
    pub bill: BillOfMaterials,
    pub impact: ImpactReport,
}

/// Build the configured generative model (disabled when no key is set)
pub fn build_model(config: &ServiceConfig) -> Result<Arc<dyn GenerativeModel>> {
    match &config.model {
        Some(settings) => {
            info!("Using generative model {} at {}", settings.model, settings.base_url);
            let model = HttpGenerativeModel::new(
                &settings.base_url,
                &settings.model,
                &settings.api_key,
                config.model_timeout,
            )
            .context("Failed to build generative model client")?;
            Ok(Arc::new(model))
        }
        None => {
            warn!("MODEL_API_KEY not set: recommendations will be unavailable");
            Ok(Arc::new(DisabledModel))
        }
    }
}

pub struct AnalysisService {
    engine: DecisionEngine,
    catalog: Arc<MaterialCatalog>,
    orchestrator: RecommendationOrchestrator,
    cache: RecommendationCache,
}

impl AnalysisService {
    pub fn new(
        engine: DecisionEngine,
        catalog: Arc<MaterialCatalog>,
        orchestrator: RecommendationOrchestrator,
        cache: RecommendationCache,
    ) -> Self {
        Self { engine, catalog, orchestrator, cache }
    }

    /// Load catalog and wire the orchestrator from configuration
    pub fn from_config(config: &ServiceConfig, model: Arc<dyn GenerativeModel>) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => {
                info!("Loading material catalog from {:?}", path);
                MaterialCatalog::from_csv(path)
                    .with_context(|| format!("Failed to load catalog from {:?}", path))?
            }
            None => {
                info!("Using built-in reference catalog");
                MaterialCatalog::reference()
            }
        };
        info!("Catalog ready: {} materials", catalog.len());

        let engine = DecisionEngine::reference();
        if let Err(e) = engine.config().check_catalog(&catalog) {
            warn!("Catalog does not cover every engine role: {}", e);
        }

        let policy = RetryPolicy::default()
            .with_backoff(config.retry_backoff)
            .with_attempt_timeout(config.model_timeout);

        Ok(Self::new(
            engine,
            Arc::new(catalog),
            RecommendationOrchestrator::new(model, policy),
            RecommendationCache::new(config.session_ttl),
        ))
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    /// Baseline bill, recommendation (or Unavailable) and impact report
    pub async fn analyze(&self, request: &AnalyzeRequest) -> EngineResult<AnalysisResponse> {
        let spec = &request.spec;
        let baseline = self
            .engine
            .compute_bill(spec, &self.catalog, OptimizationBias::BASELINE)?;
        info!(
            "Baseline for {} ({} area, {} floors): {:.2} t CO2e",
            spec.building_type, spec.area, spec.floors, baseline.total_carbon
        );

        let recommendation = match &request.session_id {
            Some(session_id) => {
                let key = RecommendationCache::key(session_id, spec);
                self.cache
                    .get_or_recommend(key, self.orchestrator.recommend(spec, &baseline, &self.catalog))
                    .await
            }
            None => self.orchestrator.recommend(spec, &baseline, &self.catalog).await,
        };

        Ok(AnalysisResponse {
            impact: ImpactReport::new(baseline.total_carbon, spec.area),
            recommendation_status: recommendation.status(),
            recommendation,
            catalog: (*self.catalog).clone(),
            baseline,
        })
    }

    /// Engine-only bill at a bias, with its impact report
    pub fn bill(&self, spec: &BuildingSpec, bias: OptimizationBias) -> EngineResult<BillReport> {
        let bill = self.engine.compute_bill(spec, &self.catalog, bias)?;
        let impact = ImpactReport::new(bill.total_carbon, spec.area);
        Ok(BillReport { bill, impact })
    }

    /// Engine-only baseline / current / best-case comparison
    pub fn scenarios(&self, spec: &BuildingSpec, bias: OptimizationBias) -> EngineResult<ScenarioComparison> {
        scenarios::compare(&self.engine, spec, &self.catalog, bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::ratios::BuildingType;
    use crate::recommend::ScriptedModel;

    fn service(model: Arc<ScriptedModel>) -> AnalysisService {
        AnalysisService::new(
            DecisionEngine::reference(),
            Arc::new(MaterialCatalog::reference()),
            RecommendationOrchestrator::new(model, RetryPolicy::default()),
            RecommendationCache::default(),
        )
    }

    #[test]
    fn test_analyze_request_flattens_spec() {
        let req: AnalyzeRequest = serde_json::from_str(
            r#"{"type":"Office","area":10000,"floors":4,"budget":"Low","sessionId":"abc"}"#,
        )
        .unwrap();
        assert_eq!(req.spec.building_type, BuildingType::Office);
        assert_eq!(req.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_bias_request_defaults_to_baseline() {
        let req: BiasRequest =
            serde_json::from_str(r#"{"spec":{"type":"House","area":100,"floors":1}}"#).unwrap();
        assert_eq!(req.bias(), OptimizationBias::BASELINE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_recommendation_still_returns_bill() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let svc = service(model.clone());
        let spec = BuildingSpec::new(BuildingType::House, 2500.0, 2);

        let response = svc.analyze(&AnalyzeRequest::new(spec)).await.unwrap();
        assert_eq!(response.recommendation, RecommendationOutcome::Unavailable);
        assert_eq!(response.recommendation_status, "unavailable");
        assert!(response.baseline.total_carbon > 0.0);
        assert_eq!(response.catalog.len(), 13);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_spec_fails_before_model_call() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let svc = service(model.clone());
        let spec = BuildingSpec::new(BuildingType::House, 0.0, 2);

        let err = svc.analyze(&AnalyzeRequest::new(spec)).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidSpec(_)));
        assert_eq!(model.calls(), 0);
    }
}
