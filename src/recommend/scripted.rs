//! Scripted model for tests
//!
//! Replays a fixed sequence of responses and records every request, so
//! retry and fallback paths can be driven deterministically without network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::model::{GenerativeModel, ModelError, ModelRequest};

/// Fake model returning scripted responses in order
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    /// Always fail with the same error
    pub fn failing(error: ModelError, times: usize) -> Self {
        Self::new((0..times).map(|_| Err(error.clone())).collect())
    }

    /// Sleep before answering (for deadline tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests seen so far, in call order
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| Err(ModelError::Network("script exhausted".to_string())))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}
