//! Engine error taxonomy
//!
//! Errors raised by the deterministic layers (catalog, ratio tables, decision
//! engine). These are hard failures at the request boundary. Recommendation
//! failures never appear here: they are absorbed into
//! [`RecommendationOutcome::Unavailable`](crate::recommend::RecommendationOutcome).

use crate::ratios::BuildingType;

/// Hard failures of the bill-of-materials computation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Building type has no ratio table and no fallback table is configured
    #[error("No structural ratio table for building type '{0}' and no fallback configured")]
    Configuration(BuildingType),

    /// A default or substitution material is absent from the catalog
    #[error("Material '{material}' required by role '{role}' is missing from the catalog")]
    CatalogIntegrity { material: String, role: String },

    /// Spec violates `area > 0` or `floors >= 1`
    #[error("Invalid building spec: {0}")]
    InvalidSpec(String),
}

impl EngineError {
    /// Short machine-readable code used by the HTTP layer
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Configuration(_) => "configuration_error",
            EngineError::CatalogIntegrity { .. } => "catalog_integrity_error",
            EngineError::InvalidSpec(_) => "invalid_spec",
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
