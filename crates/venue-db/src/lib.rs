//! # venue-db
//!
//! Storage layer for the venue enricher.
//!
//! This crate provides:
//! - PostgreSQL connection pool management
//! - `PgVenueStore`: candidate fetch and single-statement conditional update
//! - `SqliteFingerprintCache`: durable local fingerprint cache
//! - `InMemoryVenueStore`: reference store for dry runs and tests
//! - `PersistenceGateway`: intent normalization and batch commit
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use venue_db::{connect_pool, PersistenceGateway, PgVenueStore, PoolSettings, UpdateIntent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect_pool("postgres://localhost/venues", PoolSettings::default()).await?;
//!     let store = Arc::new(PgVenueStore::new(pool, "venues")?);
//!     let gateway = PersistenceGateway::new(store);
//!
//!     let affected = gateway
//!         .apply_updates(&[UpdateIntent::new("v1", "Austin", "United States")], false)
//!         .await?;
//!     println!("Updated {} rows", affected);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod gateway;
pub mod memory;
pub mod pool;
pub mod venues;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use venue_core::*;

pub use cache::{CacheConfig, SqliteFingerprintCache};
pub use gateway::PersistenceGateway;
pub use memory::{InMemoryVenueStore, VenueRow};
pub use pool::{connect_pool, log_pool_metrics, PoolSettings};
pub use venues::{quote_table_name, PgVenueStore};
