//! # venue-core
//!
//! Core types, traits, and abstractions for the venue enricher.
//!
//! This crate provides the data model (candidate records, extraction results,
//! update intents), content fingerprints, the error type, and the trait seams
//! that the storage, inference and job crates implement.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, rounds), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-record iteration (cache hits, memo hits) |

pub mod defaults;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EnrichmentEvent, EventBus, EventSink, NoopSink};
pub use fingerprint::{Fingerprint, FINGERPRINT_FIELDS};
pub use models::*;
pub use traits::*;
