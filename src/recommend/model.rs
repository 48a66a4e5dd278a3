//! Generative model seam
//!
//! The orchestrator and the chat assistant talk to this trait only. Vendor
//! specifics (endpoint shape, auth headers, response envelope) live in the
//! implementations.

use async_trait::async_trait;
use serde_json::Value;

/// One text-generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Persona / system instructions
    pub system: String,
    pub prompt: String,
    /// JSON Schema the output must follow (None for free text)
    pub response_schema: Option<Value>,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl ModelRequest {
    pub fn text(system: &str, prompt: &str) -> Self {
        Self {
            system: system.to_string(),
            prompt: prompt.to_string(),
            response_schema: None,
            temperature: 0.7,
            max_output_tokens: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Model call failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Connection refused, reset, DNS, TLS
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the caller's deadline
    #[error("Model call timed out after {0} ms")]
    Timeout(u64),

    /// Non-2xx status other than 401/403/429
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// HTTP 429 or provider quota signal
    #[error("Rate limited (retry after: {retry_after:?})")]
    RateLimited { retry_after: Option<u64> },

    /// HTTP 401/403
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response envelope did not carry generated text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not configured (no endpoint or key)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ModelError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ModelError::Authentication(_) | ModelError::Configuration(_)
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ModelError::RateLimited { .. })
    }
}

/// Abstract text-generation capability
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate text for a request (raw, unvalidated)
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// Stand-in used when no model endpoint is configured
///
/// Every call fails permanently, so recommendations degrade to
/// `Unavailable` without a network round trip.
#[derive(Debug, Default, Clone)]
pub struct DisabledModel;

#[async_trait]
impl GenerativeModel for DisabledModel {
    async fn generate(&self, _request: &ModelRequest) -> Result<String, ModelError> {
        Err(ModelError::Configuration(
            "no generative model endpoint configured".to_string(),
        ))
    }

    fn provider_name(&self) -> &str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ModelError::Network("reset".into()).is_transient());
        assert!(ModelError::Timeout(1500).is_transient());
        assert!(ModelError::Http { status: 503, message: "unavailable".into() }.is_transient());
        assert!(ModelError::RateLimited { retry_after: None }.is_transient());
        assert!(ModelError::InvalidResponse("no choices".into()).is_transient());
        assert!(!ModelError::Authentication("bad key".into()).is_transient());
        assert!(!ModelError::Configuration("missing".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = ModelError::Http { status: 500, message: "boom".to_string() };
        assert_eq!(format!("{}", err), "HTTP error 500: boom");

        let err = ModelError::RateLimited { retry_after: Some(60) };
        assert!(format!("{}", err).contains("Rate limited"));
    }

    #[tokio::test]
    async fn test_disabled_model_fails_permanently() {
        let err = DisabledModel
            .generate(&ModelRequest::text("sys", "hi"))
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }
}
