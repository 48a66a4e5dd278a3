use serde::{Deserialize, Serialize};
use std::fmt;

/// Expected durability of an optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Durability {
    High,
    Medium,
    Low,
}

impl Durability {
    /// Case-insensitive parse of `High | Medium | Low`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Durability::High),
            "medium" => Some(Durability::Medium),
            "low" => Some(Durability::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Durability::High => "High",
            Durability::Medium => "Medium",
            Durability::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Material singled out as a disproportionate carbon contributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub material: String,
    pub reason: String,
}

/// One suggested substitution or design change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    pub title: String,
    pub action: String,
    pub carbon_saving_tons: f64,
    pub cost_delta_usd: f64,
    pub durability: Durability,
    pub technical_explanation: String,
    pub tradeoff: String,
}

/// Validated output of the recommendation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub hotspots: Vec<Hotspot>,
    pub optimizations: Vec<Optimization>,
    pub impact_summary: String,
    pub policy_insight: String,
}

/// Recommendation or the explicit "unavailable" sentinel
///
/// Serializes as the result object, or `null` when unavailable. Unavailable
/// is a normal outcome: callers render the bill without suggestions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecommendationOutcome {
    Available(RecommendationResult),
    Unavailable,
}

impl RecommendationOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, RecommendationOutcome::Available(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            RecommendationOutcome::Available(_) => "available",
            RecommendationOutcome::Unavailable => "unavailable",
        }
    }

    pub fn as_result(&self) -> Option<&RecommendationResult> {
        match self {
            RecommendationOutcome::Available(r) => Some(r),
            RecommendationOutcome::Unavailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durability_parse() {
        assert_eq!(Durability::parse("High"), Some(Durability::High));
        assert_eq!(Durability::parse(" medium "), Some(Durability::Medium));
        assert_eq!(Durability::parse("LOW"), Some(Durability::Low));
        assert_eq!(Durability::parse("Very High"), None);
    }

    #[test]
    fn test_unavailable_serializes_as_null() {
        let json = serde_json::to_value(RecommendationOutcome::Unavailable).unwrap();
        assert!(json.is_null());

        let available = RecommendationOutcome::Available(RecommendationResult {
            hotspots: vec![],
            optimizations: vec![],
            impact_summary: "ok".to_string(),
            policy_insight: String::new(),
        });
        let json = serde_json::to_value(&available).unwrap();
        assert_eq!(json["impactSummary"], "ok");
        assert_eq!(available.status(), "available");
    }
}
