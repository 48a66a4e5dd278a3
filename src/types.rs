use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::ratios::{BuildingType, StructuralRole};

/// Advisory cost sensitivity (passed to the recommendation step only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CostSensitivity {
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[default]
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl CostSensitivity {
    pub fn as_str(self) -> &'static str {
        match self {
            CostSensitivity::Low => "Low",
            CostSensitivity::Medium => "Medium",
            CostSensitivity::High => "High",
        }
    }
}

/// User-supplied building specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingSpec {
    #[serde(alias = "type")]
    pub building_type: BuildingType,
    /// Floor area (area units, e.g. sq ft)
    pub area: f64,
    pub floors: u32,
    /// Advisory only, never used in arithmetic
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "budget")]
    pub cost_sensitivity: CostSensitivity,
}

impl BuildingSpec {
    pub fn new(building_type: BuildingType, area: f64, floors: u32) -> Self {
        Self {
            building_type,
            area,
            floors,
            location: String::new(),
            cost_sensitivity: CostSensitivity::default(),
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_cost_sensitivity(mut self, cost_sensitivity: CostSensitivity) -> Self {
        self.cost_sensitivity = cost_sensitivity;
        self
    }

    /// Enforce `area > 0` and `floors >= 1`
    pub fn validate(&self) -> EngineResult<()> {
        if !self.area.is_finite() || self.area <= 0.0 {
            return Err(EngineError::InvalidSpec(format!(
                "area must be a positive number, got {}",
                self.area
            )));
        }
        if self.floors < 1 {
            return Err(EngineError::InvalidSpec("floors must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Cost-first (0) to carbon-first (1) substitution bias
///
/// Always within `[0, 1]`: out-of-range input is clamped and NaN reads as the
/// cost-first baseline.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct OptimizationBias(f64);

impl OptimizationBias {
    pub const BASELINE: OptimizationBias = OptimizationBias(0.0);
    pub const MAX_REDUCTION: OptimizationBias = OptimizationBias(1.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::BASELINE;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for OptimizationBias {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for OptimizationBias {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(OptimizationBias::new)
    }
}

/// One role's material choice and its totals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialAllocation {
    pub role: StructuralRole,
    pub material_name: String,
    pub unit: String,
    pub quantity: f64,
    /// tons CO2e
    pub total_carbon: f64,
    pub total_cost: f64,
    /// True when the role's greener alternative replaced its default
    pub substituted: bool,
}

/// Priced, carbon-scored bill of materials for one spec at one bias
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillOfMaterials {
    pub allocations: Vec<MaterialAllocation>,
    /// tons CO2e
    pub total_carbon: f64,
    pub total_cost: f64,
    /// tons CO2e per unit area
    pub intensity: f64,
    pub bias: OptimizationBias,
    pub floor_multiplier: f64,
}

impl BillOfMaterials {
    pub fn allocation(&self, role: StructuralRole) -> Option<&MaterialAllocation> {
        self.allocations.iter().find(|a| a.role == role)
    }

    /// Allocations sorted by carbon contribution, largest first
    pub fn hotspots(&self) -> Vec<&MaterialAllocation> {
        let mut sorted: Vec<&MaterialAllocation> = self.allocations.iter().collect();
        sorted.sort_by(|a, b| b.total_carbon.total_cmp(&a.total_carbon));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_is_clamped() {
        assert_eq!(OptimizationBias::new(-0.2).value(), 0.0);
        assert_eq!(OptimizationBias::new(1.0000001).value(), 1.0);
        assert_eq!(OptimizationBias::new(0.45).value(), 0.45);
        assert_eq!(OptimizationBias::new(f64::NAN), OptimizationBias::BASELINE);

        let parsed: OptimizationBias = serde_json::from_str("1.7").unwrap();
        assert_eq!(parsed, OptimizationBias::MAX_REDUCTION);
    }

    #[test]
    fn test_spec_deserializes_with_aliases() {
        let spec: BuildingSpec = serde_json::from_str(
            r#"{"type":"house","area":2500,"floors":2,"location":"Austin, TX","budget":"High"}"#,
        )
        .unwrap();
        assert_eq!(spec.building_type, BuildingType::House);
        assert_eq!(spec.area, 2500.0);
        assert_eq!(spec.cost_sensitivity, CostSensitivity::High);

        let spec: BuildingSpec =
            serde_json::from_str(r#"{"buildingType":"Office","area":10000,"floors":4}"#).unwrap();
        assert_eq!(spec.cost_sensitivity, CostSensitivity::Medium);
        assert!(spec.location.is_empty());
    }

    #[test]
    fn test_spec_validation() {
        assert!(BuildingSpec::new(BuildingType::House, 100.0, 1).validate().is_ok());
        assert!(BuildingSpec::new(BuildingType::House, 0.0, 1).validate().is_err());
        assert!(BuildingSpec::new(BuildingType::House, -5.0, 1).validate().is_err());
        assert!(BuildingSpec::new(BuildingType::House, f64::INFINITY, 1).validate().is_err());
        assert!(BuildingSpec::new(BuildingType::House, 100.0, 0).validate().is_err());
    }
}
