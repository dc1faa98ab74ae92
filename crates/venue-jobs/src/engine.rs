//! Batch enrichment engine.
//!
//! Each record is resolved through cache → per-batch memo → oracle with at
//! most `concurrency` records in flight. The memo holds one `OnceCell` per
//! fingerprint, so records sharing content within a batch wait on a single
//! oracle call instead of issuing their own.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, trace, warn};

use venue_core::{
    defaults, CandidateRecord, EnrichmentEvent, EnrichmentStats, EventSink, ExtractionOracle,
    ExtractionResult, Fingerprint, FingerprintCache, ResolutionSource, UpdateIntent,
};

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum records resolved concurrently.
    pub concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::CONCURRENCY,
        }
    }
}

impl EngineConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Intents for one batch plus the counters gathered while producing them.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Exactly one intent per input record, in completion order.
    pub intents: Vec<UpdateIntent>,
    pub stats: EnrichmentStats,
}

type Memo = Mutex<HashMap<Fingerprint, Arc<OnceCell<ExtractionResult>>>>;

/// What happened to one record.
struct RecordOutcome {
    intent: UpdateIntent,
    source: ResolutionSource,
    fallback: bool,
    cache_read_failed: bool,
    cache_write_failed: bool,
}

/// Side effects of the oracle call made by the record that filled the memo cell.
#[derive(Default)]
struct FreshResolution {
    fallback: bool,
    cache_write_failed: bool,
}

/// Resolves batches of candidate records into update intents.
pub struct EnrichmentEngine {
    cache: Arc<dyn FingerprintCache>,
    oracle: Arc<dyn ExtractionOracle>,
    events: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl EnrichmentEngine {
    pub fn new(
        cache: Arc<dyn FingerprintCache>,
        oracle: Arc<dyn ExtractionOracle>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            cache,
            oracle,
            events,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn FingerprintCache> {
        &self.cache
    }

    pub fn oracle(&self) -> &Arc<dyn ExtractionOracle> {
        &self.oracle
    }

    /// One intent per record. Never fails.
    pub async fn enrich_batch(
        &self,
        records: &[CandidateRecord],
        overwrite: bool,
    ) -> Vec<UpdateIntent> {
        self.enrich_batch_with_stats(records, overwrite).await.intents
    }

    /// Like [`Self::enrich_batch`], also returning the batch counters.
    ///
    /// With `overwrite`, the cache is not consulted (it is still written).
    pub async fn enrich_batch_with_stats(
        &self,
        records: &[CandidateRecord],
        overwrite: bool,
    ) -> BatchOutcome {
        let start = Instant::now();
        let memo: Memo = Mutex::new(HashMap::new());
        let memo = &memo;

        // Owned records keep the batch future `Send` for any caller lifetime.
        let outcomes: Vec<RecordOutcome> = stream::iter(records.iter().cloned())
            .map(|record| async move { self.resolve_record(&record, overwrite, memo).await })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut stats = EnrichmentStats::default();
        let mut intents = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            stats.processed += 1;
            match outcome.source {
                ResolutionSource::Cache => stats.from_cache += 1,
                ResolutionSource::Memo => stats.from_memo += 1,
                ResolutionSource::Oracle => stats.oracle_calls += 1,
            }
            if outcome.fallback {
                stats.fallbacks += 1;
            }
            if outcome.cache_read_failed {
                stats.cache_read_failures += 1;
            }
            if outcome.cache_write_failed {
                stats.cache_write_failures += 1;
            }
            intents.push(outcome.intent);
        }

        info!(
            subsystem = "jobs",
            component = "engine",
            op = "enrich_batch",
            processed = stats.processed,
            from_cache = stats.from_cache,
            from_memo = stats.from_memo,
            oracle_calls = stats.oracle_calls,
            fallbacks = stats.fallbacks,
            overwrite,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch enriched"
        );
        self.events.emit(EnrichmentEvent::BatchEnriched { stats });

        BatchOutcome { intents, stats }
    }

    async fn resolve_record(
        &self,
        record: &CandidateRecord,
        overwrite: bool,
        memo: &Memo,
    ) -> RecordOutcome {
        let fingerprint = Fingerprint::of(record);
        let mut cache_read_failed = false;

        if !overwrite {
            match self.cache.lookup(&fingerprint).await {
                Ok(Some(result)) => {
                    trace!(
                        subsystem = "jobs",
                        component = "engine",
                        venue_id = %record.id,
                        fingerprint = %fingerprint.short(),
                        "Cache hit"
                    );
                    return self.finish(
                        record,
                        &fingerprint,
                        &result,
                        ResolutionSource::Cache,
                        false,
                        false,
                        false,
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        subsystem = "jobs",
                        component = "engine",
                        fingerprint = %fingerprint.short(),
                        error = %e,
                        "Cache read failed, treating as miss"
                    );
                    self.events.emit(EnrichmentEvent::CacheReadFailed {
                        fingerprint: fingerprint.to_string(),
                        error: e.to_string(),
                    });
                    cache_read_failed = true;
                }
            }
        }

        let cell = {
            let mut entries = memo.lock().await;
            entries
                .entry(fingerprint.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let mut fresh: Option<FreshResolution> = None;
        let slot = &mut fresh;
        let fingerprint_ref = &fingerprint;
        let result = cell
            .get_or_init(|| async move {
                let (result, resolution) = self.call_oracle(record, fingerprint_ref).await;
                *slot = Some(resolution);
                result
            })
            .await
            .clone();

        match fresh {
            Some(resolution) => self.finish(
                record,
                &fingerprint,
                &result,
                ResolutionSource::Oracle,
                resolution.fallback,
                cache_read_failed,
                resolution.cache_write_failed,
            ),
            None => {
                trace!(
                    subsystem = "jobs",
                    component = "engine",
                    venue_id = %record.id,
                    fingerprint = %fingerprint.short(),
                    "Memo hit"
                );
                self.finish(
                    record,
                    &fingerprint,
                    &result,
                    ResolutionSource::Memo,
                    false,
                    cache_read_failed,
                    false,
                )
            }
        }
    }

    /// Resolve through the oracle and write the result to the cache.
    async fn call_oracle(
        &self,
        record: &CandidateRecord,
        fingerprint: &Fingerprint,
    ) -> (ExtractionResult, FreshResolution) {
        let resolution = self.oracle.resolve(record).await;
        let mut fresh = FreshResolution::default();

        if let Some(error) = resolution.fallback_error {
            self.events.emit(EnrichmentEvent::OracleFallback {
                venue_id: record.id.clone(),
                error,
            });
            fresh.fallback = true;
        }

        if let Err(e) = self.cache.store(fingerprint, &resolution.result).await {
            warn!(
                subsystem = "jobs",
                component = "engine",
                fingerprint = %fingerprint.short(),
                error = %e,
                "Cache write failed"
            );
            self.events.emit(EnrichmentEvent::CacheWriteFailed {
                fingerprint: fingerprint.to_string(),
                error: e.to_string(),
            });
            fresh.cache_write_failed = true;
        }

        debug!(
            subsystem = "jobs",
            component = "engine",
            venue_id = %record.id,
            strategy = resolution.strategy,
            confidence = resolution.result.confidence,
            "Oracle resolved record"
        );
        (resolution.result, fresh)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        record: &CandidateRecord,
        fingerprint: &Fingerprint,
        result: &ExtractionResult,
        source: ResolutionSource,
        fallback: bool,
        cache_read_failed: bool,
        cache_write_failed: bool,
    ) -> RecordOutcome {
        self.events.emit(EnrichmentEvent::RecordResolved {
            venue_id: record.id.clone(),
            fingerprint: fingerprint.to_string(),
            source,
        });
        RecordOutcome {
            intent: UpdateIntent::from_result(record.id.clone(), result),
            source,
            fallback,
            cache_read_failed,
            cache_write_failed,
        }
    }
}
