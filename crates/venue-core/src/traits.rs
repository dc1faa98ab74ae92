//! Core traits for the enrichment pipeline's seams.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable stores, caches and model backends, and
//! testability of the engine and orchestrator without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::models::*;

// =============================================================================
// STORE
// =============================================================================

/// The authoritative venue store.
#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Fetch up to `limit` rows to enrich.
    ///
    /// Without `overwrite`, only rows missing a city or a country qualify.
    /// With `overwrite`, every eligible row qualifies.
    async fn fetch_candidates(&self, limit: usize, overwrite: bool)
        -> Result<Vec<CandidateRecord>>;

    /// Apply a batch of intents as one atomic conditional update.
    ///
    /// Per field: the stored value is replaced only when the intent's value is
    /// non-empty and differs from it. Returns the number of rows whose stored
    /// state changed.
    async fn apply_conditional_update(&self, intents: &[UpdateIntent], overwrite: bool)
        -> Result<u64>;

    /// Number of eligible rows still missing a city or a country.
    async fn count_pending(&self) -> Result<u64>;

    /// Human-readable store identity (e.g. the qualified table name).
    fn describe(&self) -> String;
}

// =============================================================================
// CACHE
// =============================================================================

/// Durable fingerprint → extraction cache.
///
/// Implementations serialize their own writes; callers share one instance
/// across workers without external locking.
#[async_trait]
pub trait FingerprintCache: Send + Sync {
    /// Look up a previous result. Never touches the network.
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<ExtractionResult>>;

    /// Insert or replace the result for `fingerprint`; durable when this returns `Ok`.
    async fn store(&self, fingerprint: &Fingerprint, result: &ExtractionResult) -> Result<()>;

    /// Number of cached fingerprints.
    async fn len(&self) -> Result<u64>;
}

// =============================================================================
// INFERENCE
// =============================================================================

/// One schema-constrained chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredRequest {
    /// Fixed system instruction.
    pub system: String,
    /// Per-record user prompt.
    pub prompt: String,
    /// Name of the JSON schema (as sent in `response_format`).
    pub schema_name: String,
    /// The JSON schema the response must validate against.
    pub schema: JsonValue,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Backend that can run schema-constrained generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run the completion and return the raw message content.
    async fn generate_structured(&self, request: &StructuredRequest) -> Result<String>;

    /// Whether the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// One way of turning a record into a location guess.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short strategy name for logs ("model", "heuristic").
    fn name(&self) -> &'static str;

    /// Attempt an extraction. Errors are classified by [`crate::Error::is_transient`].
    async fn extract(&self, record: &CandidateRecord) -> Result<ExtractionResult>;
}

/// Answer produced by an [`ExtractionOracle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub result: ExtractionResult,
    /// Name of the strategy that produced `result`.
    pub strategy: &'static str,
    /// Set when the preferred strategy failed and a fallback answered.
    pub fallback_error: Option<String>,
}

/// Infallible extraction: always produces a result, possibly all-empty.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    async fn resolve(&self, record: &CandidateRecord) -> Resolution;

    /// Describes which strategies are active (e.g. "model+heuristic").
    fn mode(&self) -> String;
}
