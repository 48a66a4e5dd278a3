//! Impact Translator - Intensity classification and relatable equivalences
//!
//! Breakpoints and conversion factors are calibration constants shared with
//! the presentation layer; changing them changes user-visible labels.

use serde::{Deserialize, Serialize};

/// kg CO2e per unit area below which a design is Low intensity
pub const LOW_INTENSITY_MAX: f64 = 18.0;
/// kg CO2e per unit area below which a design is Medium intensity
pub const MEDIUM_INTENSITY_MAX: f64 = 55.0;

/// Tons CO2e per passenger car removed for a year
pub const TONS_PER_CAR_YEAR: f64 = 4.6;
/// Tons CO2e sequestered per tree planted over 10 years
pub const TONS_PER_TREE_DECADE: f64 = 0.025;
/// Tons CO2e per home powered for a year
pub const TONS_PER_HOME_YEAR: f64 = 8.5;

/// Carbon intensity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityClass {
    Low,
    Medium,
    High,
}

impl IntensityClass {
    pub fn as_str(self) -> &'static str {
        match self {
            IntensityClass::Low => "Low",
            IntensityClass::Medium => "Medium",
            IntensityClass::High => "High",
        }
    }
}

/// Human-relatable equivalent of a carbon total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equivalence {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

/// Intensity in kg CO2e per unit area
pub fn intensity_kg_per_area(total_carbon_tons: f64, area: f64) -> f64 {
    (total_carbon_tons * 1000.0) / area
}

/// Classify a carbon total by kg-per-area breakpoints
///
/// Breakpoints are exclusive upper bounds: exactly 18 is Medium, exactly 55
/// is High.
pub fn classify_intensity(total_carbon_tons: f64, area: f64) -> IntensityClass {
    classify_kg_per_area(intensity_kg_per_area(total_carbon_tons, area))
}

pub fn classify_kg_per_area(kg_per_area: f64) -> IntensityClass {
    if kg_per_area < LOW_INTENSITY_MAX {
        IntensityClass::Low
    } else if kg_per_area < MEDIUM_INTENSITY_MAX {
        IntensityClass::Medium
    } else {
        IntensityClass::High
    }
}

/// Cars removed, trees planted and homes powered for a carbon total
pub fn equivalences(total_carbon_tons: f64) -> Vec<Equivalence> {
    vec![
        Equivalence {
            label: "Cars Removed".to_string(),
            value: round_to(total_carbon_tons / TONS_PER_CAR_YEAR, 1),
            unit: "per year".to_string(),
        },
        Equivalence {
            label: "Trees Planted".to_string(),
            value: round_to(total_carbon_tons / TONS_PER_TREE_DECADE, 0),
            unit: "over 10 yrs".to_string(),
        },
        Equivalence {
            label: "Homes Powered".to_string(),
            value: round_to(total_carbon_tons / TONS_PER_HOME_YEAR, 1),
            unit: "for a year".to_string(),
        },
    ]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Classification plus equivalences for one carbon total
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub intensity_kg_per_area: f64,
    pub class: IntensityClass,
    pub equivalences: Vec<Equivalence>,
}

impl ImpactReport {
    pub fn new(total_carbon_tons: f64, area: f64) -> Self {
        let kg_per_area = intensity_kg_per_area(total_carbon_tons, area);
        Self {
            intensity_kg_per_area: kg_per_area,
            class: classify_kg_per_area(kg_per_area),
            equivalences: equivalences(total_carbon_tons),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify_kg_per_area(17.999), IntensityClass::Low);
        assert_eq!(classify_kg_per_area(18.0), IntensityClass::Medium);
        assert_eq!(classify_kg_per_area(54.999), IntensityClass::Medium);
        assert_eq!(classify_kg_per_area(55.0), IntensityClass::High);
    }

    #[test]
    fn test_classify_from_tons() {
        // 18 t over 1000 units = 18 kg/unit
        assert_eq!(classify_intensity(18.0, 1000.0), IntensityClass::Medium);
        assert_eq!(classify_intensity(55.0, 1000.0), IntensityClass::High);
        assert_eq!(classify_intensity(1.0, 1000.0), IntensityClass::Low);
        // Net-negative designs are Low
        assert_eq!(classify_intensity(-2.0, 1000.0), IntensityClass::Low);
    }

    #[test]
    fn test_equivalences() {
        let eq = equivalences(46.0);
        assert_eq!(eq.len(), 3);
        assert_eq!(eq[0].label, "Cars Removed");
        assert_relative_eq!(eq[0].value, 10.0, epsilon = 1e-9);
        assert_eq!(eq[1].label, "Trees Planted");
        assert_relative_eq!(eq[1].value, 1840.0, epsilon = 1e-9);
        assert_eq!(eq[2].label, "Homes Powered");
        assert_relative_eq!(eq[2].value, 5.4, epsilon = 1e-9);
    }

    #[test]
    fn test_impact_report() {
        let report = ImpactReport::new(50.0, 2500.0);
        assert_relative_eq!(report.intensity_kg_per_area, 20.0, epsilon = 1e-9);
        assert_eq!(report.class, IntensityClass::Medium);
        assert_eq!(report.equivalences.len(), 3);
    }
}
