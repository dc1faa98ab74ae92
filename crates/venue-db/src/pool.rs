//! PostgreSQL pool for the venue store.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use venue_core::{Error, Result};

/// Pool sizing read from service settings.
///
/// The pipeline runs one fetch and one update per round, so a handful of
/// connections covers the store plus the `/stats` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolSettings {
    /// Zero values are raised to one connection and one second.
    pub fn new(max_connections: u32, acquire_timeout_secs: u64) -> Self {
        Self {
            max_connections: max_connections.max(1),
            acquire_timeout: Duration::from_secs(acquire_timeout_secs.max(1)),
        }
    }
}

/// Open a lazily-filled pool and verify one connection can be acquired.
pub async fn connect_pool(database_url: &str, settings: PoolSettings) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "connect",
        max_connections = settings.max_connections,
        acquire_timeout_secs = settings.acquire_timeout.as_secs(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database pool ready"
    );
    Ok(pool)
}

/// Log current pool health; warns when no idle connection is left.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    debug!(
        subsystem = "database",
        component = "pool",
        pool_size = size,
        pool_idle = idle,
        "Pool health"
    );

    if idle == 0 && size > 0 {
        warn!(
            subsystem = "database",
            component = "pool",
            pool_size = size,
            "Connection pool has no idle connections"
        );
    }
}
