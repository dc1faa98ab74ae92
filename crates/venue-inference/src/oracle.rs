//! Extraction oracle: model-backed strategy with heuristic fallback.
//!
//! Which strategy answers a record is decided by [`choose_strategy`], a pure
//! function of configuration (is a model configured?) and the outcome of the
//! model call. The oracle never returns an error to its caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use venue_core::{
    defaults, CandidateRecord, Error, ExtractionOracle, ExtractionResult, ExtractionStrategy,
    GenerationBackend, Resolution, Result,
};

use crate::heuristic::HeuristicStrategy;
use crate::normalize::sanitize;
use crate::prompts::extraction_request;
use crate::retry::RetryPolicy;

/// Exact shape the model must return; extra or missing keys are rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLocation {
    city: String,
    country: String,
    confidence: f64,
    evidence: String,
}

/// Parse strict model output. Malformed output is a transient failure.
pub fn parse_location(raw: &str) -> Result<ExtractionResult> {
    let parsed: RawLocation = serde_json::from_str(raw.trim())
        .map_err(|e| Error::Serialization(format!("Malformed model output: {}", e)))?;
    Ok(ExtractionResult {
        city: parsed.city,
        country: parsed.country,
        confidence: parsed.confidence,
        evidence: parsed.evidence,
    })
}

/// Calls a [`GenerationBackend`] with the extraction prompt, retrying transient failures.
pub struct ModelStrategy {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
    max_tokens: u32,
}

impl ModelStrategy {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
            max_tokens: defaults::MAX_TOKENS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}

#[async_trait]
impl ExtractionStrategy for ModelStrategy {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn extract(&self, record: &CandidateRecord) -> Result<ExtractionResult> {
        let request = extraction_request(record, self.max_tokens);
        let backend = &self.backend;
        let request = &request;
        self.retry
            .run(|| async move {
                let raw = backend.generate_structured(request).await?;
                parse_location(&raw)
            })
            .await
    }
}

/// Which strategy should answer a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyChoice {
    Model,
    Heuristic,
}

/// Select the answering strategy.
///
/// `failure` is the error of the model attempt, if one was made. Any failure
/// (after the retry policy has run its course) selects the heuristic.
pub fn choose_strategy(model_configured: bool, failure: Option<&Error>) -> StrategyChoice {
    match (model_configured, failure) {
        (true, None) => StrategyChoice::Model,
        _ => StrategyChoice::Heuristic,
    }
}

/// The extraction oracle used by the enrichment engine.
pub struct Oracle {
    primary: Option<Arc<dyn ExtractionStrategy>>,
    fallback: HeuristicStrategy,
}

impl Oracle {
    /// Oracle with no model; every record goes through the heuristic.
    pub fn heuristic_only() -> Self {
        Self {
            primary: None,
            fallback: HeuristicStrategy::new(),
        }
    }

    /// Oracle that tries `primary` first.
    pub fn with_strategy(primary: Arc<dyn ExtractionStrategy>) -> Self {
        Self {
            primary: Some(primary),
            fallback: HeuristicStrategy::new(),
        }
    }

    /// Oracle backed by a generation backend with the given retry policy.
    pub fn from_backend(
        backend: Arc<dyn GenerationBackend>,
        retry: RetryPolicy,
        max_tokens: u32,
    ) -> Self {
        let model = ModelStrategy::new(backend)
            .with_retry(retry)
            .with_max_tokens(max_tokens);
        Self::with_strategy(Arc::new(model))
    }

    pub fn has_model(&self) -> bool {
        self.primary.is_some()
    }
}

#[async_trait]
impl ExtractionOracle for Oracle {
    async fn resolve(&self, record: &CandidateRecord) -> Resolution {
        let attempt = match &self.primary {
            Some(strategy) => Some(strategy.extract(record).await),
            None => None,
        };

        let (model_result, failure) = match attempt {
            Some(Ok(result)) => (Some(result), None),
            Some(Err(e)) => (None, Some(e)),
            None => (None, None),
        };

        match (choose_strategy(self.has_model(), failure.as_ref()), model_result) {
            (StrategyChoice::Model, Some(result)) => {
                debug!(
                    subsystem = "inference",
                    component = "oracle",
                    venue_id = %record.id,
                    "Model extraction succeeded"
                );
                Resolution {
                    result: sanitize(result),
                    strategy: "model",
                    fallback_error: None,
                }
            }
            _ => {
                let fallback_error = failure.map(|e| e.to_string());
                if let Some(ref error) = fallback_error {
                    warn!(
                        subsystem = "inference",
                        component = "oracle",
                        venue_id = %record.id,
                        error = %error,
                        "Model extraction failed, using heuristic"
                    );
                }
                Resolution {
                    result: sanitize(HeuristicStrategy::guess(record)),
                    strategy: self.fallback.name(),
                    fallback_error,
                }
            }
        }
    }

    fn mode(&self) -> String {
        match &self.primary {
            Some(strategy) => format!("{}+{}", strategy.name(), self.fallback.name()),
            None => self.fallback.name().to_string(),
        }
    }
}
