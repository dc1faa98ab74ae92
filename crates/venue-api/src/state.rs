use std::sync::Arc;

use tokio::sync::Mutex;
use venue_jobs::PipelineOrchestrator;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineOrchestrator>,
    /// Model name when a model backend is configured.
    pub model: Option<String>,
    /// Held for the duration of an enrichment run; one run at a time.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pipeline: Arc<PipelineOrchestrator>, model: Option<String>) -> Self {
        Self {
            pipeline,
            model,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
