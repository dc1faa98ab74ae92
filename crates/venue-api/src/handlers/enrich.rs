use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use venue_core::{defaults, Error, RoundReport};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for `POST /enrich`.
#[derive(Debug, Deserialize)]
pub struct EnrichParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub overwrite: bool,
    /// Include per-round reports in the response.
    #[serde(default)]
    pub verbose: bool,
}

fn default_limit() -> usize {
    defaults::REQUEST_LIMIT
}

#[derive(Debug, Serialize)]
pub struct EnrichResponse {
    pub updated: u64,
    pub limit: usize,
    pub batch_size: usize,
    pub overwrite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<Vec<RoundReport>>,
}

pub async fn enrich(
    State(state): State<AppState>,
    Query(params): Query<EnrichParams>,
) -> Result<Json<EnrichResponse>, ApiError> {
    if !(defaults::REQUEST_LIMIT_MIN..=defaults::REQUEST_LIMIT_MAX).contains(&params.limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between {} and {}",
            defaults::REQUEST_LIMIT_MIN,
            defaults::REQUEST_LIMIT_MAX
        )));
    }

    let Ok(guard) = state.run_lock.clone().try_lock_owned() else {
        return Err(ApiError::Conflict(
            "An enrichment run is already in progress".to_string(),
        ));
    };

    info!(
        subsystem = "api",
        op = "enrich",
        limit = params.limit,
        overwrite = params.overwrite,
        "Enrichment requested"
    );

    // The run owns the lock and finishes even if the client disconnects.
    let pipeline = state.pipeline.clone();
    let (limit, overwrite) = (params.limit, params.overwrite);
    let run = tokio::spawn(async move {
        let _guard = guard;
        pipeline.run(limit, overwrite).await
    });

    let summary = run.await.map_err(|e| {
        ApiError::Internal(Error::Internal(format!("Enrichment task failed: {}", e)))
    })??;

    Ok(Json(EnrichResponse {
        updated: summary.total_affected,
        limit: summary.limit,
        batch_size: summary.batch_size,
        overwrite: summary.overwrite,
        rounds: params.verbose.then_some(summary.rounds),
    }))
}
