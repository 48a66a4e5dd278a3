//! Recommendation step: grounded model call, validation, retry and fallback

pub mod cache;
pub mod http;
pub mod model;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod scripted;
pub mod types;

pub use cache::RecommendationCache;
pub use http::HttpGenerativeModel;
pub use model::{DisabledModel, GenerativeModel, ModelError, ModelRequest};
pub use orchestrator::{AttemptFailure, RecommendationFailure, RecommendationOrchestrator, RetryPolicy};
pub use parse::{extract_object_span, parse_recommendation, ParseError, ValidationError};
pub use scripted::ScriptedModel;
pub use types::{Durability, Hotspot, Optimization, RecommendationOutcome, RecommendationResult};
