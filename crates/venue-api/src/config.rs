//! Service configuration, read once from the environment at startup.

use std::path::PathBuf;

use venue_core::{defaults, Error, Result};
use venue_db::PoolSettings;
use venue_inference::openai::DEFAULT_OPENAI_URL;
use venue_inference::OpenAIConfig;
use venue_jobs::EngineConfig;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/venues";

/// Everything the service needs to wire the pipeline.
///
/// | Variable | Default |
/// |----------|---------|
/// | `DATABASE_URL` | `postgres://localhost/venues` |
/// | `DATABASE_MAX_CONNECTIONS` | `5` |
/// | `DATABASE_ACQUIRE_TIMEOUT` | `30` |
/// | `VENUE_TABLE` | (required) |
/// | `OPENAI_API_KEY` | (none: heuristic-only oracle) |
/// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
/// | `OPENAI_MODEL` | `gpt-4o-mini` |
/// | `OPENAI_MAX_TOKENS` | `160` |
/// | `OPENAI_TIMEOUT` | `60` |
/// | `BATCH_SIZE` | `200` |
/// | `CONCURRENCY` | `8` |
/// | `CACHE_PATH` | `/tmp/enrichment_cache.sqlite` |
/// | `HOST` | `0.0.0.0` |
/// | `PORT` | `8080` |
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub pool: PoolSettings,
    pub venue_table: String,
    pub openai: OpenAIConfig,
    pub max_tokens: u32,
    pub batch_size: usize,
    pub engine: EngineConfig,
    pub cache_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let venue_table = get("VENUE_TABLE")
            .ok_or_else(|| Error::Config("VENUE_TABLE must be set".to_string()))?;

        let openai = OpenAIConfig {
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            api_key: get("OPENAI_API_KEY"),
            model: get("OPENAI_MODEL").unwrap_or_else(|| defaults::GEN_MODEL.to_string()),
            timeout_seconds: parse_or(get("OPENAI_TIMEOUT"), defaults::MODEL_TIMEOUT_SECS),
        };

        let concurrency = parse_or(get("CONCURRENCY"), defaults::CONCURRENCY);
        let pool_defaults = PoolSettings::default();
        let pool = PoolSettings::new(
            parse_or(get("DATABASE_MAX_CONNECTIONS"), pool_defaults.max_connections),
            parse_or(
                get("DATABASE_ACQUIRE_TIMEOUT"),
                pool_defaults.acquire_timeout.as_secs(),
            ),
        );

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            pool,
            venue_table: venue_table.trim().to_string(),
            openai,
            max_tokens: parse_or(get("OPENAI_MAX_TOKENS"), defaults::MAX_TOKENS),
            batch_size: parse_or(get("BATCH_SIZE"), defaults::BATCH_SIZE).max(1),
            engine: EngineConfig::default().with_concurrency(concurrency),
            cache_path: get("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(defaults::CACHE_PATH)),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), defaults::SERVER_PORT),
        })
    }

    /// Whether a model credential is configured.
    pub fn has_model(&self) -> bool {
        self.openai.api_key.is_some()
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_table_is_config_error() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Settings::from_lookup(lookup(&[("VENUE_TABLE", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("VENUE_TABLE", "venues")])).unwrap();
        assert_eq!(settings.venue_table, "venues");
        assert_eq!(settings.batch_size, 200);
        assert_eq!(settings.engine.concurrency, 8);
        assert_eq!(settings.max_tokens, 160);
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.openai.model, "gpt-4o-mini");
        assert_eq!(settings.openai.base_url, DEFAULT_OPENAI_URL);
        assert_eq!(settings.pool, PoolSettings::default());
        assert_eq!(
            settings.cache_path,
            PathBuf::from("/tmp/enrichment_cache.sqlite")
        );
        assert!(!settings.has_model());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("VENUE_TABLE", "analytics.venues"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4.1-mini"),
            ("BATCH_SIZE", "50"),
            ("CONCURRENCY", "0"),
            ("PORT", "not-a-port"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("DATABASE_ACQUIRE_TIMEOUT", "0"),
        ]))
        .unwrap();
        assert_eq!(settings.pool.max_connections, 12);
        assert_eq!(settings.pool.acquire_timeout, std::time::Duration::from_secs(1));
        assert!(settings.has_model());
        assert_eq!(settings.openai.model, "gpt-4.1-mini");
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.engine.concurrency, 1);
        assert_eq!(settings.port, 8080);
    }
}
