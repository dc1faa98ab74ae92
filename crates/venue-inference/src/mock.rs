//! Mock generation backend for deterministic testing.
//!
//! Replies are scripted: queued replies are consumed in order, then the
//! default reply answers every further call. Every call is logged.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use venue_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .then_fail(venue_inference::Error::RateLimited("429".into()))
//!     .with_default_response(MockGenerationBackend::location_response("Austin", "United States", 0.9));
//! assert_eq!(backend.call_count(), 0);
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use venue_core::{Error, GenerationBackend, Result, StructuredRequest};

#[derive(Debug)]
enum MockReply {
    Content(String),
    Failure(Error),
}

impl MockReply {
    fn produce(&self) -> Result<String> {
        match self {
            MockReply::Content(content) => Ok(content.clone()),
            MockReply::Failure(err) => Err(replicate(err)),
        }
    }
}

/// Rebuild an error so the same scripted failure can be returned repeatedly.
fn replicate(err: &Error) -> Error {
    match err {
        Error::Cache(m) => Error::Cache(m.clone()),
        Error::Inference(m) => Error::Inference(m.clone()),
        Error::RateLimited(m) => Error::RateLimited(m.clone()),
        Error::Timeout(m) => Error::Timeout(m.clone()),
        Error::Serialization(m) => Error::Serialization(m.clone()),
        Error::Config(m) => Error::Config(m.clone()),
        Error::InvalidInput(m) => Error::InvalidInput(m.clone()),
        Error::Request(m) => Error::Request(m.clone()),
        Error::Unauthorized(m) => Error::Unauthorized(m.clone()),
        Error::Internal(m) => Error::Internal(m.clone()),
        other => Error::Internal(other.to_string()),
    }
}

/// Scripted [`GenerationBackend`].
pub struct MockGenerationBackend {
    model: String,
    script: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    latency_ms: u64,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerationBackend {
    /// Backend that answers every call with an all-empty location.
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            script: Mutex::new(VecDeque::new()),
            default_reply: MockReply::Content(Self::location_response("", "", 0.0)),
            latency_ms: 0,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Well-formed model output for the location schema.
    pub fn location_response(city: &str, country: &str, confidence: f64) -> String {
        json!({
            "city": city,
            "country": country,
            "confidence": confidence,
            "evidence": "mock"
        })
        .to_string()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Content returned once the script is exhausted.
    pub fn with_default_response(mut self, content: impl Into<String>) -> Self {
        self.default_reply = MockReply::Content(content.into());
        self
    }

    /// Error returned once the script is exhausted.
    pub fn with_default_error(mut self, err: Error) -> Self {
        self.default_reply = MockReply::Failure(err);
        self
    }

    /// Queue one successful reply.
    pub fn then_respond(self, content: impl Into<String>) -> Self {
        self.push(MockReply::Content(content.into()));
        self
    }

    /// Queue one failure.
    pub fn then_fail(self, err: Error) -> Self {
        self.push(MockReply::Failure(err));
        self
    }

    /// Simulated latency per call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of generation calls made so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// User prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn push(&self, reply: MockReply) {
        self.script.lock().unwrap().push_back(reply);
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply.produce(),
            None => self.default_reply.produce(),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
