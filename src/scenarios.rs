//! Scenario comparison - baseline / current / best-case bills
//!
//! The three bills are independent engine calls and are computed in parallel.
//! Nothing here touches the recommendation step.

use serde::Serialize;

use crate::catalog::MaterialCatalog;
use crate::engine::DecisionEngine;
use crate::error::EngineResult;
use crate::types::{BillOfMaterials, BuildingSpec, OptimizationBias};

/// Bias above which sourcing switches to low-carbon suppliers
const LOW_CARBON_SOURCING_BIAS: f64 = 0.6;
/// Bias above which the structural grid goes hybrid timber/steel
const HYBRID_GRID_BIAS: f64 = 0.8;

/// Qualitative strategy implied by a bias value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyProfile {
    pub material_sourcing: &'static str,
    pub structural_grid: &'static str,
}

impl StrategyProfile {
    pub fn for_bias(bias: OptimizationBias) -> Self {
        Self {
            material_sourcing: if bias.value() > LOW_CARBON_SOURCING_BIAS {
                "Low-Carbon Optimized"
            } else {
                "Standard Regional"
            },
            structural_grid: if bias.value() > HYBRID_GRID_BIAS {
                "Hybrid Wood/Steel"
            } else {
                "Concrete Reinforced"
            },
        }
    }
}

/// Baseline vs current vs theoretical minimum
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub baseline: BillOfMaterials,
    pub current: BillOfMaterials,
    pub best_case: BillOfMaterials,
    /// Percent of baseline carbon avoided by the current bias
    pub carbon_saving_pct: f64,
    /// Tons CO2e avoided by the current bias
    pub carbon_saving_tons: f64,
    /// Current cost minus baseline cost
    pub cost_delta: f64,
    pub strategy: StrategyProfile,
}

/// Compare a bias against the cost-first baseline and the carbon-first bound
pub fn compare(
    engine: &DecisionEngine,
    spec: &BuildingSpec,
    catalog: &MaterialCatalog,
    bias: impl Into<OptimizationBias>,
) -> EngineResult<ScenarioComparison> {
    let bias = bias.into();
    let (baseline, (current, best_case)) = rayon::join(
        || engine.compute_bill(spec, catalog, OptimizationBias::BASELINE),
        || {
            rayon::join(
                || engine.compute_bill(spec, catalog, bias),
                || engine.compute_bill(spec, catalog, OptimizationBias::MAX_REDUCTION),
            )
        },
    );
    let (baseline, current, best_case) = (baseline?, current?, best_case?);

    let carbon_saving_tons = baseline.total_carbon - current.total_carbon;
    let carbon_saving_pct = if baseline.total_carbon != 0.0 {
        carbon_saving_tons / baseline.total_carbon * 100.0
    } else {
        0.0
    };
    let cost_delta = current.total_cost - baseline.total_cost;

    Ok(ScenarioComparison {
        carbon_saving_pct,
        carbon_saving_tons,
        cost_delta,
        strategy: StrategyProfile::for_bias(bias),
        baseline,
        current,
        best_case,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::BuildingType;
    use approx::assert_relative_eq;

    #[test]
    fn test_baseline_comparison_has_no_saving() {
        let engine = DecisionEngine::reference();
        let catalog = MaterialCatalog::reference();
        let spec = BuildingSpec::new(BuildingType::Office, 10_000.0, 4);

        let cmp = compare(&engine, &spec, &catalog, 0.0).unwrap();
        assert_eq!(cmp.baseline, cmp.current);
        assert_relative_eq!(cmp.carbon_saving_pct, 0.0, epsilon = 1e-12);
        assert_relative_eq!(cmp.cost_delta, 0.0, epsilon = 1e-12);
        assert!(cmp.best_case.total_carbon < cmp.baseline.total_carbon);
    }

    #[test]
    fn test_saving_pct_matches_totals() {
        let engine = DecisionEngine::reference();
        let catalog = MaterialCatalog::reference();
        let spec = BuildingSpec::new(BuildingType::School, 40_000.0, 2);

        let cmp = compare(&engine, &spec, &catalog, 0.6).unwrap();
        let expected = (cmp.baseline.total_carbon - cmp.current.total_carbon)
            / cmp.baseline.total_carbon
            * 100.0;
        assert_relative_eq!(cmp.carbon_saving_pct, expected, epsilon = 1e-9);
        assert!(cmp.carbon_saving_pct > 0.0);
        // Recycled steel and low-carbon concrete both cost more per kg
        assert!(cmp.cost_delta > 0.0);
    }

    #[test]
    fn test_strategy_profile() {
        let p = StrategyProfile::for_bias(OptimizationBias::new(0.6));
        assert_eq!(p.material_sourcing, "Standard Regional");
        assert_eq!(p.structural_grid, "Concrete Reinforced");

        let p = StrategyProfile::for_bias(OptimizationBias::new(0.9));
        assert_eq!(p.material_sourcing, "Low-Carbon Optimized");
        assert_eq!(p.structural_grid, "Hybrid Wood/Steel");
    }
}
