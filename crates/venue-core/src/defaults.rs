//! Centralized default constants for the venue enricher.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates and the service binary reference these constants instead of
//! defining their own magic numbers.

use std::time::Duration;

// =============================================================================
// PIPELINE
// =============================================================================

/// Records fetched and persisted per round.
pub const BATCH_SIZE: usize = 200;

/// Concurrent oracle calls within one batch.
pub const CONCURRENCY: usize = 8;

/// Default number of records requested by one enrichment run.
pub const REQUEST_LIMIT: usize = 30_000;

/// Smallest accepted request limit.
pub const REQUEST_LIMIT_MIN: usize = 1;

/// Largest accepted request limit.
pub const REQUEST_LIMIT_MAX: usize = 100_000;

// =============================================================================
// EXTRACTION MODEL
// =============================================================================

/// Default generation model.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Completion token budget for one extraction.
pub const MAX_TOKENS: u32 = 160;

/// Version tag of the extraction prompt.
pub const PROMPT_VERSION: &str = "v1.0-city-country";

/// HTTP timeout for one model call in seconds.
pub const MODEL_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// RETRY
// =============================================================================

/// Delay before the first retry.
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on a single retry delay.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Total attempts, including the first call.
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

// =============================================================================
// CACHE
// =============================================================================

/// Location of the local fingerprint cache.
pub const CACHE_PATH: &str = "/tmp/enrichment_cache.sqlite";

/// SQLite busy timeout for concurrent cache writers.
pub const CACHE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled SQLite connections for the cache (readers share these, writes serialize).
pub const CACHE_MAX_CONNECTIONS: u32 = 4;

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast channel capacity for the enrichment event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8080;

