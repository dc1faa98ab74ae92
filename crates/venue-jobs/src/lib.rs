//! # venue-jobs
//!
//! Batch enrichment and the pipeline that drives it.
//!
//! This crate provides:
//! - `EnrichmentEngine`: cache → per-batch memo → oracle resolution with bounded concurrency
//! - `PipelineOrchestrator`: fetch → enrich → persist rounds with progress events
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use venue_db::{InMemoryVenueStore, SqliteFingerprintCache};
//! use venue_inference::Oracle;
//! use venue_jobs::{EnrichmentEngine, EventBus, PipelineOrchestrator};
//!
//! let store = Arc::new(InMemoryVenueStore::new("dry-run"));
//! let cache = Arc::new(SqliteFingerprintCache::open("./cache/venues.sqlite").await?);
//! let events = Arc::new(EventBus::default());
//!
//! let engine = Arc::new(EnrichmentEngine::new(
//!     cache,
//!     Arc::new(Oracle::heuristic_only()),
//!     events.clone(),
//! ));
//! let pipeline = PipelineOrchestrator::new(store, engine, events).with_batch_size(200);
//!
//! let summary = pipeline.run(1_000, false).await?;
//! println!("Updated {} rows", summary.total_affected);
//! ```

pub mod engine;
pub mod pipeline;

// Re-export core types
pub use venue_core::*;

pub use engine::{BatchOutcome, EngineConfig, EnrichmentEngine};
pub use pipeline::{rounds_for, PipelineOrchestrator};
