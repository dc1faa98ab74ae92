//! HTTP handlers.

pub mod enrich;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use venue_core::{ExtractionOracle, FingerprintCache, VenueStore};

use crate::error::ApiError;
use crate::state::AppState;

pub use enrich::{enrich, EnrichParams, EnrichResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
    pub store: String,
    pub model: Option<String>,
    pub oracle: String,
    pub prompt_version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub pending: u64,
    pub cached_fingerprints: u64,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.pipeline.engine();
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        store: state.pipeline.store().describe(),
        model: state.model.clone(),
        oracle: engine.oracle().mode(),
        prompt_version: venue_inference::prompts::prompt_version(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let pending = state.pipeline.store().count_pending().await?;
    let cached_fingerprints = state.pipeline.engine().cache().len().await?;
    Ok(Json(StatsResponse {
        pending,
        cached_fingerprints,
    }))
}
