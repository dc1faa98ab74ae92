use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use venue_api::{build_router, AppState, Settings};
use venue_core::{EnrichmentEvent, EventBus, ExtractionOracle, GenerationBackend};
use venue_db::{connect_pool, PgVenueStore, SqliteFingerprintCache};
use venue_inference::{OpenAIBackend, Oracle, RetryPolicy};
use venue_jobs::{EnrichmentEngine, PipelineOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "venue_api=debug,venue_jobs=info,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "venue_api=debug,venue_jobs=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("venue-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let settings = Settings::from_env()?;

    let pool = connect_pool(&settings.database_url, settings.pool).await?;
    let store = Arc::new(PgVenueStore::new(pool, &settings.venue_table)?);
    let cache = Arc::new(SqliteFingerprintCache::open(&settings.cache_path).await?);

    let oracle = build_oracle(&settings).await?;
    info!(
        subsystem = "api",
        oracle = %oracle.mode(),
        "Extraction oracle ready"
    );

    let events = Arc::new(EventBus::default());
    tokio::spawn(log_events(events.subscribe()));

    let engine = Arc::new(
        EnrichmentEngine::new(cache, oracle, events.clone()).with_config(settings.engine),
    );
    let pipeline = Arc::new(
        PipelineOrchestrator::new(store, engine, events).with_batch_size(settings.batch_size),
    );

    let model = settings.has_model().then(|| settings.openai.model.clone());
    let app = build_router(AppState::new(pipeline, model)).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    info!(
        %addr,
        table = %settings.venue_table,
        batch_size = settings.batch_size,
        concurrency = settings.engine.concurrency,
        "Starting server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Model-backed oracle when a credential is configured, heuristic-only otherwise.
async fn build_oracle(settings: &Settings) -> anyhow::Result<Arc<Oracle>> {
    if !settings.has_model() {
        warn!(
            subsystem = "api",
            "OPENAI_API_KEY not set, using heuristic extraction only"
        );
        return Ok(Arc::new(Oracle::heuristic_only()));
    }

    let backend = OpenAIBackend::new(settings.openai.clone())?;
    match backend.health_check().await {
        Ok(true) => debug!(subsystem = "api", "Generation backend reachable"),
        Ok(false) => warn!(
            subsystem = "api",
            base_url = %settings.openai.base_url,
            "Generation backend health check failed, requests will fall back when it is down"
        ),
        Err(e) => warn!(
            subsystem = "api",
            error = %e,
            "Generation backend health check errored"
        ),
    }

    Ok(Arc::new(Oracle::from_backend(
        Arc::new(backend),
        RetryPolicy::default(),
        settings.max_tokens,
    )))
}

/// Mirror pipeline events into the log.
async fn log_events(mut rx: broadcast::Receiver<EnrichmentEvent>) {
    loop {
        match rx.recv().await {
            Ok(event @ EnrichmentEvent::RecordResolved { .. }) => {
                tracing::trace!(event_type = event.event_type(), ?event, "Pipeline event");
            }
            Ok(event) => {
                debug!(event_type = event.event_type(), ?event, "Pipeline event");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event logger lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
