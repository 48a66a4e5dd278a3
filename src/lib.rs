//! GreenBuild Decision & Recommendation Core
//!
//! Deterministic bill-of-materials engine for embodied-carbon estimation, with
//! a grounded, fail-safe generative recommendation step on top.
//!
//! Layout:
//! - `catalog/`, `ratios/`: immutable reference data (materials, kg per area)
//! - `engine/`: bias-driven material selection and the priced bill
//! - `scenarios/`, `impact/`: comparisons, intensity classes, equivalences
//! - `recommend/`: model seam, grounding prompt, validation, retry, cache
//! - `chat/`: stateless assistant
//! - `analysis/`: request boundary tying the above together
//! - `api_server/` (feature `api`): axum HTTP surface

pub mod analysis;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod impact;
pub mod ratios;
pub mod recommend;
pub mod scenarios;
pub mod types;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use analysis::{AnalysisResponse, AnalysisService, AnalyzeRequest, BiasRequest, BillReport};
pub use catalog::{MaterialCatalog, MaterialRecord};
pub use chat::{ChatAssistant, ChatError, ChatReply, ChatRequest};
pub use config::{ConfigError, ServiceConfig};
pub use engine::{compute_bill, DecisionEngine, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use impact::{classify_intensity, equivalences, ImpactReport, IntensityClass};
pub use ratios::{BuildingType, RatioTable, RatioTables, StructuralRole};
pub use recommend::{RecommendationOrchestrator, RecommendationOutcome, RecommendationResult};
pub use scenarios::{compare, ScenarioComparison};
pub use types::{BillOfMaterials, BuildingSpec, CostSensitivity, MaterialAllocation, OptimizationBias};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
