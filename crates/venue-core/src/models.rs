//! Data model for venue enrichment.

use serde::{Deserialize, Serialize};

// =============================================================================
// CANDIDATE RECORDS
// =============================================================================

/// A venue row that still needs a city and/or country.
///
/// Immutable once fetched. Every attribute other than `id` is an optional
/// extraction signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Unique venue identifier in the store.
    pub id: String,
    pub name: Option<String>,
    pub alt_name: Option<String>,
    /// Free-text postal address, when the store carries one.
    pub address: Option<String>,
    pub website_url: Option<String>,
    pub domain: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
    pub ticket_vendor: Option<String>,
    pub ticket_vendor_source: Option<String>,
    /// Any other signal worth showing the model.
    pub notes: Option<String>,
}

impl CandidateRecord {
    /// Create a record with only an id; use the `with_*` setters for signals.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_alt_name(mut self, alt_name: impl Into<String>) -> Self {
        self.alt_name = Some(alt_name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_website_url(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_linkedin_url(mut self, url: impl Into<String>) -> Self {
        self.linkedin_url = Some(url.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_ticket_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.ticket_vendor = Some(vendor.into());
        self
    }

    /// Where the ticket vendor was found, e.g. a scraped page URL.
    pub fn with_ticket_vendor_source(mut self, source: impl Into<String>) -> Self {
        self.ticket_vendor_source = Some(source.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Structured location guess for one venue.
///
/// Empty `city`/`country` mean "unknown", not "no result".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub city: String,
    /// Canonical display form (see country normalization).
    pub country: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub evidence: String,
}

impl ExtractionResult {
    /// The all-empty result with zero confidence.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// True when neither city nor country is known.
    pub fn is_unknown(&self) -> bool {
        self.city.is_empty() && self.country.is_empty()
    }
}

/// Where a record's extraction result came from during a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Persisted fingerprint cache hit.
    Cache,
    /// Resolved earlier in the same batch.
    Memo,
    /// Fresh oracle call.
    Oracle,
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Proposed city/country for one venue, awaiting conditional persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateIntent {
    pub id: String,
    /// Empty means "leave the stored city as it is".
    pub city: String,
    /// Empty means "leave the stored country as it is".
    pub country: String,
}

impl UpdateIntent {
    pub fn new(id: impl Into<String>, city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            city: city.into(),
            country: country.into(),
        }
    }

    /// Build an intent for `id` from a resolved extraction.
    pub fn from_result(id: impl Into<String>, result: &ExtractionResult) -> Self {
        Self::new(id, result.city.clone(), result.country.clone())
    }
}

/// Per-batch enrichment counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentStats {
    pub processed: usize,
    pub from_cache: usize,
    pub from_memo: usize,
    pub oracle_calls: usize,
    /// Oracle calls where the model failed and the heuristic answered.
    pub fallbacks: usize,
    pub cache_read_failures: usize,
    pub cache_write_failures: usize,
}

impl EnrichmentStats {
    /// Fold another batch's counters into this one.
    pub fn absorb(&mut self, other: &EnrichmentStats) {
        self.processed += other.processed;
        self.from_cache += other.from_cache;
        self.from_memo += other.from_memo;
        self.oracle_calls += other.oracle_calls;
        self.fallbacks += other.fallbacks;
        self.cache_read_failures += other.cache_read_failures;
        self.cache_write_failures += other.cache_write_failures;
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Orchestrator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Fetching,
    Enriching,
    Persisting,
    Done,
}

/// Outcome of one fetch → enrich → persist round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    /// 1-based round number.
    pub round: usize,
    /// Candidates requested from the store.
    pub asked: usize,
    /// Candidates the store returned.
    pub fetched: usize,
    /// Rows whose stored value changed.
    pub affected: u64,
    pub stats: EnrichmentStats,
}

/// Terminal result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total_affected: u64,
    pub limit: usize,
    pub batch_size: usize,
    pub overwrite: bool,
    pub rounds: Vec<RoundReport>,
}
