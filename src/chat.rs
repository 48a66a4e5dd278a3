//! Chat Assistant - stateless conversational front for sustainability questions
//!
//! Each call carries its own history; nothing is stored between calls. The
//! model is tried at most twice and only a rate limit earns the second try.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::recommend::{GenerativeModel, ModelError, ModelRequest};

const CHAT_PERSONA: &str = "You are GreenBuild AI Assistant, a friendly and knowledgeable sustainability expert for construction projects.

Your expertise includes:
- Embodied carbon in building materials (concrete, steel, timber, glass, insulation)
- Green building certifications (LEED, BREEAM, Passive House, RIBA 2030)
- Sustainable material alternatives and their tradeoffs
- Carbon footprint calculations and reduction strategies
- Cost vs. sustainability optimization
- Local and regional building regulations

Communication style:
- Be helpful and encouraging, use plain language
- Give actionable advice and mention both pros and cons of materials
- Politely redirect questions outside construction sustainability
- Keep responses to 2-4 short paragraphs unless more detail is requested

If users ask about their specific project, point them to the \"Analyze\" feature for detailed calculations.";

pub const CHAT_TEMPERATURE: f32 = 0.7;
pub const CHAT_MAX_TOKENS: u32 = 500;
pub const CHAT_MAX_ATTEMPTS: u32 = 2;
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

pub const FALLBACK_MESSAGE: &str =
    "I'm having trouble connecting right now. Please try again in a moment! 🔄";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    #[error("Message is required")]
    EmptyMessage,
}

/// Render persona, history and the new message as one prompt
pub fn build_chat_prompt(request: &ChatRequest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Previous conversation:");
    for msg in &request.history {
        let speaker = match msg.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        let _ = writeln!(out, "{}: {}", speaker, msg.content);
    }
    let _ = write!(
        out,
        "\nUser: {}\n\nRespond helpfully as GreenBuild AI Assistant:",
        request.message
    );
    out
}

#[derive(Clone)]
pub struct ChatAssistant {
    model: Arc<dyn GenerativeModel>,
}

impl ChatAssistant {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Answer one message; model failures become the fallback reply
    pub async fn reply(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let model_request = ModelRequest::text(CHAT_PERSONA, &build_chat_prompt(request))
            .with_temperature(CHAT_TEMPERATURE)
            .with_max_output_tokens(CHAT_MAX_TOKENS);

        match self.generate(&model_request).await {
            Ok(text) => Ok(ChatReply { message: text, success: true }),
            Err(e) => {
                warn!("Chat model call failed: {}", e);
                Ok(ChatReply { message: FALLBACK_MESSAGE.to_string(), success: false })
            }
        }
    }

    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.model.generate(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_rate_limited() && attempt < CHAT_MAX_ATTEMPTS => {
                    warn!("Chat rate limited, retrying in {:?}", RATE_LIMIT_BACKOFF);
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
