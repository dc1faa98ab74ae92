//! Enrichment events and the sink they are emitted through.
//!
//! The engine and the orchestrator never log progress through a global. They
//! receive an [`EventSink`] at construction and emit [`EnrichmentEvent`]s into
//! it. [`EventBus`] fans events out to any number of subscribers over a
//! broadcast channel (API progress, tests); [`NoopSink`] discards them.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{EnrichmentStats, PipelineState, ResolutionSource};

/// Domain events emitted while a pipeline run progresses.
///
/// Serialized as JSON with a `type` tag, e.g.
/// `{"type":"RoundPersisted","round":1,"submitted":200,"affected":187}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum EnrichmentEvent {
    /// The orchestrator moved to a new state.
    StateChanged { state: PipelineState },
    /// A round began fetching up to `asked` candidates.
    RoundStarted { round: usize, asked: usize },
    /// One record received its result.
    RecordResolved {
        venue_id: String,
        fingerprint: String,
        source: ResolutionSource,
    },
    /// Reading the cache failed; the record was treated as a miss.
    CacheReadFailed { fingerprint: String, error: String },
    /// Writing the cache failed; the record still produced an intent.
    CacheWriteFailed { fingerprint: String, error: String },
    /// The model strategy failed and the heuristic answered instead.
    OracleFallback { venue_id: String, error: String },
    /// A batch finished enrichment.
    BatchEnriched { stats: EnrichmentStats },
    /// A round's intents were committed to the store.
    RoundPersisted {
        round: usize,
        submitted: usize,
        affected: u64,
    },
    /// The run reached `Done`.
    RunCompleted { total_affected: u64, rounds: usize },
}

impl EnrichmentEvent {
    /// Dot-namespaced event name (e.g. `"round.persisted"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "pipeline.state_changed",
            Self::RoundStarted { .. } => "round.started",
            Self::RecordResolved { .. } => "record.resolved",
            Self::CacheReadFailed { .. } => "cache.read_failed",
            Self::CacheWriteFailed { .. } => "cache.write_failed",
            Self::OracleFallback { .. } => "oracle.fallback",
            Self::BatchEnriched { .. } => "batch.enriched",
            Self::RoundPersisted { .. } => "round.persisted",
            Self::RunCompleted { .. } => "pipeline.completed",
        }
    }
}

/// Capability for emitting enrichment events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EnrichmentEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: EnrichmentEvent) {}
}

/// Broadcast-backed event bus.
///
/// Cheap to clone; every clone publishes into the same channel. Events sent
/// with no subscribers are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EnrichmentEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to receive events. Each subscriber gets its own independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EnrichmentEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: EnrichmentEvent) {
        tracing::trace!(
            event_type = event.event_type(),
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(event);
    }
}
