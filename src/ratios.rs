//! Structural Ratio Tables
//!
//! Per-building-type material intensity: kg of material per unit of floor
//! area for each structural role. The role set is fixed; every table carries
//! one ratio per role and every bill carries one allocation per role.

use crate::error::{EngineError, EngineResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Building Type
// ============================================================================

/// Building type from the inbound spec
///
/// Parsing is case-insensitive. Anything outside the four known types is kept
/// as `Unrecognized` so the engine can decide between the fallback table and
/// a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildingType {
    House,
    Office,
    School,
    Hospital,
    Unrecognized(String),
}

impl BuildingType {
    pub const KNOWN: [BuildingType; 4] = [
        BuildingType::House,
        BuildingType::Office,
        BuildingType::School,
        BuildingType::Hospital,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            BuildingType::House => "House",
            BuildingType::Office => "Office",
            BuildingType::School => "School",
            BuildingType::Hospital => "Hospital",
            BuildingType::Unrecognized(raw) => raw,
        }
    }
}

impl FromStr for BuildingType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "house" => BuildingType::House,
            "office" => BuildingType::Office,
            "school" => BuildingType::School,
            "hospital" => BuildingType::Hospital,
            _ => BuildingType::Unrecognized(s.trim().to_string()),
        })
    }
}

impl From<String> for BuildingType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<BuildingType> for String {
    fn from(t: BuildingType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Structural Role
// ============================================================================

/// Fixed structural roles (one allocation each, in this order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructuralRole {
    PrimaryStructure,
    StructuralMetal,
    SecondaryStructure,
    EnvelopeMasonry,
    Glazing,
    Insulation,
    CladdingMetal,
}

impl StructuralRole {
    pub const ALL: [StructuralRole; 7] = [
        StructuralRole::PrimaryStructure,
        StructuralRole::StructuralMetal,
        StructuralRole::SecondaryStructure,
        StructuralRole::EnvelopeMasonry,
        StructuralRole::Glazing,
        StructuralRole::Insulation,
        StructuralRole::CladdingMetal,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable role name
    pub fn label(self) -> &'static str {
        match self {
            StructuralRole::PrimaryStructure => "primary structure",
            StructuralRole::StructuralMetal => "structural metal",
            StructuralRole::SecondaryStructure => "secondary structure",
            StructuralRole::EnvelopeMasonry => "envelope masonry",
            StructuralRole::Glazing => "envelope glazing",
            StructuralRole::Insulation => "insulation",
            StructuralRole::CladdingMetal => "cladding metal",
        }
    }
}

impl fmt::Display for StructuralRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Ratio Tables
// ============================================================================

/// Quantity per unit area for every structural role
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioTable {
    ratios: [f64; 7],
}

impl RatioTable {
    /// Ratios in [`StructuralRole::ALL`] order
    pub const fn new(ratios: [f64; 7]) -> Self {
        Self { ratios }
    }

    pub fn ratio(&self, role: StructuralRole) -> f64 {
        self.ratios[role.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (StructuralRole, f64)> + '_ {
        StructuralRole::ALL.iter().map(move |&role| (role, self.ratio(role)))
    }
}

//                                        concrete steel timber brick glass wool  alu
pub const HOUSE_RATIOS: RatioTable = RatioTable::new([40.0, 2.5, 8.0, 35.0, 0.8, 1.5, 0.5]);
pub const OFFICE_RATIOS: RatioTable = RatioTable::new([85.0, 12.0, 1.5, 10.0, 4.5, 2.5, 2.2]);
pub const SCHOOL_RATIOS: RatioTable = RatioTable::new([65.0, 8.0, 4.0, 25.0, 2.5, 2.2, 1.2]);
pub const HOSPITAL_RATIOS: RatioTable = RatioTable::new([95.0, 15.0, 1.0, 15.0, 3.5, 3.0, 2.5]);

/// Ratio tables keyed by building type, plus an optional fallback
#[derive(Debug, Clone)]
pub struct RatioTables {
    tables: FxHashMap<BuildingType, RatioTable>,
    fallback: Option<RatioTable>,
}

impl RatioTables {
    pub fn new(fallback: Option<RatioTable>) -> Self {
        Self {
            tables: FxHashMap::default(),
            fallback,
        }
    }

    /// Reference tables; House doubles as the fallback for unknown types
    pub fn reference() -> Self {
        Self::new(Some(HOUSE_RATIOS))
            .with_table(BuildingType::House, HOUSE_RATIOS)
            .with_table(BuildingType::Office, OFFICE_RATIOS)
            .with_table(BuildingType::School, SCHOOL_RATIOS)
            .with_table(BuildingType::Hospital, HOSPITAL_RATIOS)
    }

    pub fn with_table(mut self, building_type: BuildingType, table: RatioTable) -> Self {
        self.tables.insert(building_type, table);
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Table for a building type, falling back when the type has no table
    pub fn resolve(&self, building_type: &BuildingType) -> EngineResult<&RatioTable> {
        if let Some(table) = self.tables.get(building_type) {
            return Ok(table);
        }
        match &self.fallback {
            Some(table) => {
                tracing::debug!("No ratio table for '{}', using fallback", building_type);
                Ok(table)
            }
            None => Err(EngineError::Configuration(building_type.clone())),
        }
    }
}

impl Default for RatioTables {
    fn default() -> Self {
        Self::reference()
    }
}
