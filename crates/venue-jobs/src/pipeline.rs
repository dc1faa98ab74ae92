//! Pipeline orchestrator: fetch → enrich → persist rounds until the
//! requested limit is covered or the store runs dry.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use venue_core::{
    defaults, EnrichmentEvent, EventSink, PipelineState, PipelineSummary, Result, RoundReport,
    VenueStore,
};
use venue_db::PersistenceGateway;

use crate::engine::EnrichmentEngine;

/// Number of rounds needed to cover `limit` records: `ceil(limit / batch_size)`, at least 1.
pub fn rounds_for(limit: usize, batch_size: usize) -> usize {
    let batch_size = batch_size.max(1);
    limit.div_ceil(batch_size).max(1)
}

/// Drives one pipeline run per call to [`PipelineOrchestrator::run`].
pub struct PipelineOrchestrator {
    store: Arc<dyn VenueStore>,
    engine: Arc<EnrichmentEngine>,
    gateway: PersistenceGateway,
    events: Arc<dyn EventSink>,
    batch_size: usize,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<dyn VenueStore>,
        engine: Arc<EnrichmentEngine>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let gateway = PersistenceGateway::new(store.clone());
        Self {
            store,
            engine,
            gateway,
            events,
            batch_size: defaults::BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn store(&self) -> &Arc<dyn VenueStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<EnrichmentEngine> {
        &self.engine
    }

    fn transition(&self, state: PipelineState) {
        debug!(
            subsystem = "jobs",
            component = "pipeline",
            state = ?state,
            "State transition"
        );
        self.events.emit(EnrichmentEvent::StateChanged { state });
    }

    /// Run rounds until `limit` records have been requested or no candidates remain.
    ///
    /// A store failure (fetch or persist) aborts the run and is returned;
    /// rounds already persisted stay persisted.
    pub async fn run(&self, limit: usize, overwrite: bool) -> Result<PipelineSummary> {
        let start = Instant::now();
        let rounds = rounds_for(limit, self.batch_size);
        let mut remaining = limit;
        let mut total_affected: u64 = 0;
        let mut reports = Vec::new();

        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "run",
            store = %self.store.describe(),
            limit,
            batch_size = self.batch_size,
            overwrite,
            rounds,
            "Pipeline run started"
        );
        self.transition(PipelineState::Idle);

        for round in 1..=rounds {
            let asked = self.batch_size.min(remaining);
            if asked == 0 {
                break;
            }

            self.transition(PipelineState::Fetching);
            self.events
                .emit(EnrichmentEvent::RoundStarted { round, asked });
            let candidates = self.store.fetch_candidates(asked, overwrite).await?;
            if candidates.is_empty() {
                debug!(
                    subsystem = "jobs",
                    component = "pipeline",
                    round,
                    "No candidates left"
                );
                break;
            }

            self.transition(PipelineState::Enriching);
            let outcome = self
                .engine
                .enrich_batch_with_stats(&candidates, overwrite)
                .await;

            self.transition(PipelineState::Persisting);
            let affected = self
                .gateway
                .apply_updates(&outcome.intents, overwrite)
                .await?;
            self.events.emit(EnrichmentEvent::RoundPersisted {
                round,
                submitted: outcome.intents.len(),
                affected,
            });

            info!(
                subsystem = "jobs",
                component = "pipeline",
                round,
                asked,
                fetched = candidates.len(),
                affected,
                "Round complete"
            );

            total_affected += affected;
            remaining -= asked;
            reports.push(RoundReport {
                round,
                asked,
                fetched: candidates.len(),
                affected,
                stats: outcome.stats,
            });
        }

        self.transition(PipelineState::Done);
        self.events.emit(EnrichmentEvent::RunCompleted {
            total_affected,
            rounds: reports.len(),
        });

        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "run",
            total_affected,
            rounds = reports.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Pipeline run complete"
        );

        Ok(PipelineSummary {
            total_affected,
            limit,
            batch_size: self.batch_size,
            overwrite,
            rounds: reports,
        })
    }
}
