//! Grounding prompt and output schema for the recommendation step
//!
//! The prompt carries every catalog record with its coefficients and
//! provenance, plus the engine's bill, so the model can only reason over
//! numbers it was given.

use serde_json::{json, Value};
use std::fmt::Write;

use super::model::ModelRequest;
use crate::catalog::MaterialCatalog;
use crate::types::{BillOfMaterials, BuildingSpec};

pub const RECOMMENDATION_SYSTEM: &str = "You are GreenBuild AI, a senior sustainability engineer and \
construction cost analyst. You reason step by step over the material data you are given and \
answer only with a single JSON object.";

/// Low temperature keeps numeric claims close to the supplied data
pub const RECOMMENDATION_TEMPERATURE: f32 = 0.4;
pub const RECOMMENDATION_MAX_TOKENS: u32 = 2048;

/// Number of optimizations the model is asked for
pub const REQUESTED_OPTIMIZATIONS: usize = 3;

/// Build the full grounding request
pub fn build_recommendation_request(
    spec: &BuildingSpec,
    bill: &BillOfMaterials,
    catalog: &MaterialCatalog,
) -> ModelRequest {
    ModelRequest::text(RECOMMENDATION_SYSTEM, &build_prompt(spec, bill, catalog))
        .with_schema(response_schema())
        .with_temperature(RECOMMENDATION_TEMPERATURE)
        .with_max_output_tokens(RECOMMENDATION_MAX_TOKENS)
}

/// Render the grounding prompt text
pub fn build_prompt(spec: &BuildingSpec, bill: &BillOfMaterials, catalog: &MaterialCatalog) -> String {
    let mut out = String::with_capacity(4096);

    // writeln! into a String cannot fail
    let _ = writeln!(out, "Analyze this building's material mix and propose carbon reductions.");
    let _ = writeln!(out);

    let _ = writeln!(out, "BUILDING SPECIFICATIONS:");
    let _ = writeln!(out, "- Type: {}", spec.building_type);
    let _ = writeln!(out, "- Area: {} sq ft", spec.area);
    let _ = writeln!(out, "- Floors: {}", spec.floors);
    let location = if spec.location.is_empty() { "Unspecified" } else { spec.location.as_str() };
    let _ = writeln!(out, "- Location: {}", location);
    let _ = writeln!(out, "- Cost Sensitivity: {}", spec.cost_sensitivity.as_str());
    let _ = writeln!(out);

    let _ = writeln!(out, "CURRENT MATERIAL MIX & BASELINE:");
    for a in &bill.allocations {
        let _ = writeln!(
            out,
            "- {} ({}): {:.0} {}, {:.2} tons CO2e, ${:.0}",
            a.material_name,
            a.role.label(),
            a.quantity,
            a.unit,
            a.total_carbon,
            a.total_cost
        );
    }
    let _ = writeln!(
        out,
        "- TOTAL: {:.2} tons CO2e, ${:.0}, {:.2} kg CO2e per sq ft",
        bill.total_carbon,
        bill.total_cost,
        bill.intensity * 1000.0
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "AVAILABLE MATERIALS (ICE v3.0 / EC3 datasets):");
    for m in catalog.records() {
        let _ = writeln!(
            out,
            "- {}: {} kg CO2e/{}, ${}/{} (Source: {})",
            m.name, m.carbon_per_unit, m.unit, m.cost_per_unit, m.unit, m.provenance
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "TASK:");
    let _ = writeln!(out, "1. Identify the carbon hotspots in the current mix.");
    let _ = writeln!(
        out,
        "2. Propose {} specific optimizations using only the AVAILABLE MATERIALS.",
        REQUESTED_OPTIMIZATIONS
    );
    let _ = writeln!(
        out,
        "3. For each optimization, compute the carbon delta (tons) and cost delta ($) from the quantities above."
    );
    let _ = writeln!(out, "4. State the tradeoff (e.g. \"Saves 20% carbon but increases cost by 5%\").");
    let _ = writeln!(
        out,
        "5. Explain the technical reason the substitute is better (sequestration, lower process energy, recycled content)."
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "STRICT RULES:");
    let _ = writeln!(out, "- Never invent material data. Use only the AVAILABLE MATERIALS listed above.");
    let _ = writeln!(out, "- Every number must be derived from the quantities and factors provided.");
    let _ = writeln!(out, "- Hotspot material names must match the AVAILABLE MATERIALS exactly.");
    let _ = writeln!(out, "- durability is one of \"High\", \"Medium\", \"Low\".");
    let _ = writeln!(
        out,
        "- policyInsight mentions a green building policy or incentive relevant to the location or building type."
    );
    let _ = writeln!(out, "- Respond with one JSON object matching the output schema and nothing else.");

    out
}

/// JSON Schema for `RecommendationResult`
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "hotspots": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "material": {"type": "string"},
                        "reason": {"type": "string"}
                    },
                    "required": ["material", "reason"]
                }
            },
            "optimizations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "action": {"type": "string"},
                        "carbonSavingTons": {"type": "number"},
                        "costDeltaUsd": {"type": "number"},
                        "durability": {"type": "string", "enum": ["High", "Medium", "Low"]},
                        "technicalExplanation": {"type": "string"},
                        "tradeoff": {"type": "string"}
                    },
                    "required": [
                        "title", "action", "carbonSavingTons", "costDeltaUsd",
                        "durability", "technicalExplanation", "tradeoff"
                    ]
                }
            },
            "impactSummary": {"type": "string"},
            "policyInsight": {"type": "string"}
        },
        "required": ["hotspots", "optimizations", "impactSummary", "policyInsight"]
    })
}
