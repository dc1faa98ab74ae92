//! SQLite-backed fingerprint cache.
//!
//! One `cache` table keyed by fingerprint hex. Entries are replaced on
//! re-resolution and never deleted. The database runs in WAL mode so readers
//! proceed while a write is in flight; writes from this process are
//! serialized by an internal lock, and `busy_timeout` covers other processes.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::FromRow;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use venue_core::{defaults, Error, ExtractionResult, Fingerprint, FingerprintCache, Result};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cache (
    key TEXT PRIMARY KEY,
    city TEXT,
    country TEXT,
    confidence REAL,
    evidence TEXT
)
"#;

#[derive(Debug, FromRow)]
struct CacheRow {
    city: Option<String>,
    country: Option<String>,
    confidence: Option<f64>,
    evidence: Option<String>,
}

impl From<CacheRow> for ExtractionResult {
    fn from(row: CacheRow) -> Self {
        ExtractionResult {
            city: row.city.unwrap_or_default(),
            country: row.country.unwrap_or_default(),
            confidence: row.confidence.unwrap_or(0.0),
            evidence: row.evidence.unwrap_or_default(),
        }
    }
}

/// SQLite cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub busy_timeout: Duration,
    pub max_connections: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::CACHE_PATH),
            busy_timeout: defaults::CACHE_BUSY_TIMEOUT,
            max_connections: defaults::CACHE_MAX_CONNECTIONS,
        }
    }
}

impl CacheConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

/// Durable [`FingerprintCache`] on a local SQLite file.
pub struct SqliteFingerprintCache {
    pool: SqlitePool,
    write_lock: Mutex<()>,
    location: String,
}

impl SqliteFingerprintCache {
    /// Open (creating if needed) the cache at `path` with default settings.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(CacheConfig::default().with_path(path.as_ref())).await
    }

    /// Open the cache described by `config`.
    pub async fn open_with_config(config: CacheConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| {
                Error::Cache(format!(
                    "Failed to open cache at {}: {}",
                    config.path.display(),
                    e
                ))
            })?;

        let cache = Self {
            pool,
            write_lock: Mutex::new(()),
            location: config.path.display().to_string(),
        };
        cache.init_schema().await?;

        info!(
            subsystem = "cache",
            component = "sqlite",
            op = "open",
            path = %cache.location,
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Fingerprint cache ready"
        );
        Ok(cache)
    }

    /// Private in-memory cache on a single pinned connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::Cache(e.to_string()))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::Cache(format!("Failed to open in-memory cache: {}", e)))?;

        let cache = Self {
            pool,
            write_lock: Mutex::new(()),
            location: ":memory:".to_string(),
        };
        cache.init_schema().await?;
        Ok(cache)
    }

    /// Where the cache lives (file path or `:memory:`).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Close the underlying pool, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Cache(format!("Failed to create cache table: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl FingerprintCache for SqliteFingerprintCache {
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<ExtractionResult>> {
        let row: Option<CacheRow> = sqlx::query_as(
            "SELECT city, country, confidence, evidence FROM cache WHERE key = ?",
        )
        .bind(fingerprint.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Cache(format!("Cache lookup failed: {}", e)))?;

        trace!(
            subsystem = "cache",
            component = "sqlite",
            fingerprint = %fingerprint.short(),
            hit = row.is_some(),
            "Cache lookup"
        );
        Ok(row.map(ExtractionResult::from))
    }

    async fn store(&self, fingerprint: &Fingerprint, result: &ExtractionResult) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        sqlx::query(
            r#"
            INSERT INTO cache (key, city, country, confidence, evidence)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                city = excluded.city,
                country = excluded.country,
                confidence = excluded.confidence,
                evidence = excluded.evidence
            "#,
        )
        .bind(fingerprint.as_str())
        .bind(&result.city)
        .bind(&result.country)
        .bind(result.confidence)
        .bind(&result.evidence)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Cache(format!("Cache write failed: {}", e)))?;

        debug!(
            subsystem = "cache",
            component = "sqlite",
            op = "store",
            fingerprint = %fingerprint.short(),
            "Cached extraction"
        );
        Ok(())
    }

    async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Cache(format!("Cache count failed: {}", e)))?;
        Ok(count.max(0) as u64)
    }
}
