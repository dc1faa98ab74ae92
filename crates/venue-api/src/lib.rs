//! # venue-api
//!
//! HTTP front-end for the venue enricher.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /health` | Liveness plus store, model and oracle mode |
//! | `GET /stats` | Pending rows and cached fingerprint count |
//! | `POST /enrich?limit=&overwrite=&verbose=` | Run the pipeline once |

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use config::Settings;
pub use error::ApiError;
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::stats))
        .route("/enrich", post(handlers::enrich))
        .with_state(state)
}
