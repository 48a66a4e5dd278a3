//! Decision Engine - Threshold-gated material selection and quantity takeoff
//!
//! Maps (spec, catalog, bias) to a priced, carbon-scored bill of materials.
//! Pure and deterministic: the engine holds only immutable configuration, so
//! a single instance can be shared across threads and called repeatedly with
//! different bias values.
//!
//! Algorithm:
//! 1. Resolve the ratio table for the building type (fallback if unknown)
//! 2. floor_multiplier = 1 + (floors - 1) × 0.12
//! 3. Per role: default material, or its alternative when bias > threshold
//! 4. quantity = ratio × area × floor_multiplier
//!    carbon (t) = quantity × carbon_per_unit / 1000
//!    cost = quantity × cost_per_unit
//! 5. Sum across roles; intensity = total_carbon / area

use rayon::prelude::*;
use std::sync::Arc;

use crate::catalog::{MaterialCatalog, MaterialRecord};
use crate::error::{EngineError, EngineResult};
use crate::ratios::{RatioTables, StructuralRole};
use crate::types::{BillOfMaterials, BuildingSpec, MaterialAllocation, OptimizationBias};

/// Added vertical complexity per floor above the first
pub const FLOOR_PENALTY: f64 = 0.12;

/// kg → tons
const KG_PER_TON: f64 = 1000.0;

/// Greener alternative for a role, used when bias strictly exceeds `threshold`
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub alternative: String,
    pub threshold: f64,
}

/// Default material and optional substitution for one structural role
#[derive(Debug, Clone, PartialEq)]
pub struct RoleRule {
    pub role: StructuralRole,
    pub default_material: String,
    pub substitution: Option<Substitution>,
}

impl RoleRule {
    fn new(role: StructuralRole, default_material: &str) -> Self {
        Self {
            role,
            default_material: default_material.to_string(),
            substitution: None,
        }
    }

    fn substitute(mut self, alternative: &str, threshold: f64) -> Self {
        self.substitution = Some(Substitution {
            alternative: alternative.to_string(),
            threshold,
        });
        self
    }

    /// Material name selected for this bias (single decision, no blending)
    pub fn select(&self, bias: OptimizationBias) -> (&str, bool) {
        match &self.substitution {
            Some(sub) if bias.value() > sub.threshold => (sub.alternative.as_str(), true),
            _ => (self.default_material.as_str(), false),
        }
    }

    /// Every material name this rule may reference
    fn required_materials(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default_material.as_str())
            .chain(self.substitution.iter().map(|s| s.alternative.as_str()))
    }
}

/// Immutable engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub ratio_tables: RatioTables,
    /// One rule per role, in [`StructuralRole::ALL`] order
    pub rules: Vec<RoleRule>,
    pub floor_penalty: f64,
}

impl EngineConfig {
    /// Reference configuration (ICE v3.0 defaults and thresholds)
    pub fn reference() -> Self {
        use StructuralRole::*;
        Self {
            ratio_tables: RatioTables::reference(),
            rules: vec![
                RoleRule::new(PrimaryStructure, "Concrete (Standard)")
                    .substitute("Concrete (Low-Carbon)", 0.3),
                RoleRule::new(StructuralMetal, "Steel (Virgin)").substitute("Steel (Recycled)", 0.5),
                RoleRule::new(SecondaryStructure, "Softwood Timber")
                    .substitute("Cross-Laminated Timber", 0.7),
                RoleRule::new(EnvelopeMasonry, "Brick"),
                RoleRule::new(Glazing, "Glass"),
                RoleRule::new(Insulation, "Mineral Wool").substitute("Hempcrete", 0.8),
                RoleRule::new(CladdingMetal, "Aluminium (Virgin)")
                    .substitute("Aluminium (Recycled)", 0.4),
            ],
            floor_penalty: FLOOR_PENALTY,
        }
    }

    pub fn with_ratio_tables(mut self, ratio_tables: RatioTables) -> Self {
        self.ratio_tables = ratio_tables;
        self
    }

    pub fn rule(&self, role: StructuralRole) -> Option<&RoleRule> {
        self.rules.iter().find(|r| r.role == role)
    }

    /// Check that every default and alternative material exists
    ///
    /// Alternatives are checked even when the current bias would not select
    /// them, so a catalog gap surfaces on the baseline call too.
    pub fn check_catalog(&self, catalog: &MaterialCatalog) -> EngineResult<()> {
        for rule in &self.rules {
            for material in rule.required_materials() {
                if !catalog.contains(material) {
                    return Err(EngineError::CatalogIntegrity {
                        material: material.to_string(),
                        role: rule.role.label().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// floor_multiplier = 1 + (floors - 1) × penalty
pub fn floor_multiplier(floors: u32, penalty: f64) -> f64 {
    1.0 + (floors.saturating_sub(1)) as f64 * penalty
}

/// Stateless bill-of-materials calculator over shared configuration
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: Arc<EngineConfig>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn reference() -> Self {
        Self::new(EngineConfig::reference())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the bill of materials for one bias value
    pub fn compute_bill(
        &self,
        spec: &BuildingSpec,
        catalog: &MaterialCatalog,
        bias: impl Into<OptimizationBias>,
    ) -> EngineResult<BillOfMaterials> {
        let bias = bias.into();
        spec.validate()?;
        self.config.check_catalog(catalog)?;

        let table = self.config.ratio_tables.resolve(&spec.building_type)?;
        let multiplier = floor_multiplier(spec.floors, self.config.floor_penalty);

        let mut allocations = Vec::with_capacity(self.config.rules.len());
        for rule in &self.config.rules {
            let (material_name, substituted) = rule.select(bias);
            let material = lookup(catalog, material_name, rule.role)?;

            if substituted {
                tracing::debug!(
                    "{}: {} → {} (bias {:.2})",
                    rule.role,
                    rule.default_material,
                    material_name,
                    bias.value()
                );
            }

            allocations.push(allocate(rule.role, material, table.ratio(rule.role), spec.area, multiplier, substituted));
        }

        let total_carbon: f64 = allocations.iter().map(|a| a.total_carbon).sum();
        let total_cost: f64 = allocations.iter().map(|a| a.total_cost).sum();

        Ok(BillOfMaterials {
            allocations,
            total_carbon,
            total_cost,
            intensity: total_carbon / spec.area,
            bias,
            floor_multiplier: multiplier,
        })
    }

    /// Compute bills for several bias values in parallel (order preserved)
    pub fn compute_sweep(
        &self,
        spec: &BuildingSpec,
        catalog: &MaterialCatalog,
        biases: &[f64],
    ) -> EngineResult<Vec<BillOfMaterials>> {
        biases
            .par_iter()
            .map(|&bias| self.compute_bill(spec, catalog, bias))
            .collect()
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::reference()
    }
}

/// Convenience entry point using the reference configuration
pub fn compute_bill(
    spec: &BuildingSpec,
    catalog: &MaterialCatalog,
    bias: impl Into<OptimizationBias>,
) -> EngineResult<BillOfMaterials> {
    DecisionEngine::reference().compute_bill(spec, catalog, bias)
}

fn lookup<'a>(
    catalog: &'a MaterialCatalog,
    name: &str,
    role: StructuralRole,
) -> EngineResult<&'a MaterialRecord> {
    catalog.get(name).ok_or_else(|| EngineError::CatalogIntegrity {
        material: name.to_string(),
        role: role.label().to_string(),
    })
}

fn allocate(
    role: StructuralRole,
    material: &MaterialRecord,
    ratio: f64,
    area: f64,
    multiplier: f64,
    substituted: bool,
) -> MaterialAllocation {
    let quantity = ratio * area * multiplier;
    MaterialAllocation {
        role,
        material_name: material.name.clone(),
        unit: material.unit.clone(),
        quantity,
        total_carbon: quantity * material.carbon_per_unit / KG_PER_TON,
        total_cost: quantity * material.cost_per_unit,
        substituted,
    }
}
