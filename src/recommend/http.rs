//! OpenAI-compatible `chat/completions` model over reqwest

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::model::{GenerativeModel, ModelError, ModelRequest};

/// HTTP generative model speaking the OpenAI chat-completions dialect
#[derive(Debug, Clone)]
pub struct HttpGenerativeModel {
    /// Base URL (e.g., https://api.openai.com/v1)
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpGenerativeModel {
    /// Create a model client with a transport-level timeout
    ///
    /// The orchestrator applies its own per-attempt deadline on top.
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build the request body
    pub fn build_body(&self, request: &ModelRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.prompt}
            ],
            "temperature": request.temperature,
            "stream": false
        });

        if let Some(max_tokens) = request.max_output_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(schema) = &request.response_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "greenbuild_output",
                    "schema": schema
                }
            });
        }

        body
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response
pub fn parse_chat_completion(response: &Value) -> Result<String, ModelError> {
    response["choices"]
        .get(0)
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| ModelError::InvalidResponse("Missing choices[0].message.content".to_string()))
}

/// Map a non-success HTTP status to a model error
pub fn classify_status(status: u16, retry_after: Option<u64>, body: String) -> ModelError {
    match status {
        401 | 403 => ModelError::Authentication(body),
        429 => ModelError::RateLimited { retry_after },
        _ => ModelError::Http { status, message: body },
    }
}

#[async_trait]
impl GenerativeModel for HttpGenerativeModel {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let body = self.build_body(request);
        debug!("POST {} (model={})", self.endpoint(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), retry_after, text));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("response body is not JSON: {}", e)))?;

        parse_chat_completion(&value)
    }

    fn provider_name(&self) -> &str {
        "openai-compatible"
    }
}
