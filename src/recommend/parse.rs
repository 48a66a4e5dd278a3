//! Parsing and validation of raw model output
//!
//! Model text is untrusted. Steps:
//! 1. Locate the first balanced JSON object in the text (models often wrap
//!    output in prose or markdown fences)
//! 2. Deserialize leniently (numbers may arrive as strings)
//! 3. Validate into a `RecommendationResult`

use serde::Deserialize;
use serde_json::Value;

use super::types::{Durability, Hotspot, Optimization, RecommendationResult};
use crate::catalog::MaterialCatalog;

/// Model output did not contain a usable JSON object
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("No JSON object found in model output")]
    NoObject,

    #[error("Malformed JSON object: {0}")]
    Malformed(String),
}

/// Parsed object does not satisfy the result schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing or empty field: {0}")]
    MissingField(String),

    #[error("Invalid durability '{value}' in optimization {index}")]
    InvalidDurability { index: usize, value: String },

    #[error("Non-numeric value for {0}")]
    NotANumber(String),

    #[error("Hotspot names unknown material '{0}'")]
    UnknownMaterial(String),
}

// ============================================================================
// Object span extraction
// ============================================================================

/// Byte index of the `}` that closes the `{` at `start`, if balanced
fn matching_close(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate the first balanced `{...}` span that parses as a JSON object
///
/// Brace-delimited prose before the payload (e.g. "{note}") is skipped.
pub fn extract_object_span(text: &str) -> Result<&str, ParseError> {
    let mut last_error = None;

    for (start, _) in text.match_indices('{') {
        let Some(end) = matching_close(text, start) else {
            continue;
        };
        let span = &text[start..=end];
        match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(_)) => return Ok(span),
            Ok(_) => {}
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    match last_error {
        Some(e) => Err(ParseError::Malformed(e)),
        None => Err(ParseError::NoObject),
    }
}

// ============================================================================
// Lenient wire shape
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    #[serde(default)]
    hotspots: Option<Vec<RawHotspot>>,
    #[serde(default)]
    optimizations: Option<Vec<RawOptimization>>,
    #[serde(default)]
    impact_summary: Option<String>,
    #[serde(default)]
    policy_insight: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHotspot {
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptimization {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    carbon_saving_tons: Option<Value>,
    #[serde(default)]
    cost_delta_usd: Option<Value>,
    #[serde(default)]
    durability: Option<String>,
    #[serde(default)]
    technical_explanation: Option<String>,
    #[serde(default)]
    tradeoff: Option<String>,
}

fn required_text(value: Option<String>, field: &str) -> Result<String, ValidationError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ValidationError::MissingField(field.to_string())),
    }
}

/// Accept a JSON number or a numeric string ("1.2", "-450")
fn required_number(value: Option<Value>, field: &str) -> Result<f64, ValidationError> {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').replace(',', "").parse::<f64>().ok(),
        None | Some(Value::Null) => return Err(ValidationError::MissingField(field.to_string())),
        Some(_) => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::NotANumber(field.to_string())),
    }
}

// ============================================================================
// Parse + validate
// ============================================================================

/// Failure to turn model text into a validated result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutputError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Extract, deserialize and validate raw model output
///
/// `policyInsight` may be empty; every other text field must be present and
/// non-empty. Hotspots must name catalog materials.
pub fn parse_recommendation(
    raw: &str,
    catalog: &MaterialCatalog,
) -> Result<RecommendationResult, OutputError> {
    let span = extract_object_span(raw)?;
    let parsed: RawRecommendation =
        serde_json::from_str(span).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let raw_hotspots = parsed
        .hotspots
        .ok_or_else(|| ValidationError::MissingField("hotspots".to_string()))?;
    let raw_optimizations = parsed
        .optimizations
        .ok_or_else(|| ValidationError::MissingField("optimizations".to_string()))?;

    let mut hotspots = Vec::with_capacity(raw_hotspots.len());
    for (i, h) in raw_hotspots.into_iter().enumerate() {
        let material = required_text(h.material, &format!("hotspots[{}].material", i))?;
        if !catalog.contains(material.trim()) {
            return Err(ValidationError::UnknownMaterial(material).into());
        }
        hotspots.push(Hotspot {
            material: material.trim().to_string(),
            reason: required_text(h.reason, &format!("hotspots[{}].reason", i))?,
        });
    }

    let mut optimizations = Vec::with_capacity(raw_optimizations.len());
    for (i, o) in raw_optimizations.into_iter().enumerate() {
        let field = |name: &str| format!("optimizations[{}].{}", i, name);

        let durability_raw = required_text(o.durability, &field("durability"))?;
        let durability = Durability::parse(&durability_raw).ok_or_else(|| {
            ValidationError::InvalidDurability { index: i, value: durability_raw.clone() }
        })?;

        optimizations.push(Optimization {
            title: required_text(o.title, &field("title"))?,
            action: required_text(o.action, &field("action"))?,
            carbon_saving_tons: required_number(o.carbon_saving_tons, &field("carbonSavingTons"))?,
            cost_delta_usd: required_number(o.cost_delta_usd, &field("costDeltaUsd"))?,
            durability,
            technical_explanation: required_text(o.technical_explanation, &field("technicalExplanation"))?,
            tradeoff: required_text(o.tradeoff, &field("tradeoff"))?,
        });
    }

    Ok(RecommendationResult {
        hotspots,
        optimizations,
        impact_summary: required_text(parsed.impact_summary, "impactSummary")?,
        policy_insight: parsed.policy_insight.unwrap_or_default(),
    })
}
