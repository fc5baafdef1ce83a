//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /health                 liveness + version                        │
//! │  GET  /api/quarters           offered quarters and the default         │
//! │  GET  /api/rates/{quarter}    rate table, origin, fallback warning      │
//! │  POST /api/calculate          parse + aggregate under the caller's tier │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod calculate;
mod health;
mod rates;

pub use calculate::{
    calculate, CalculateRequest, CalculateResponse, InputSource, RowPreview,
    UPLOAD_LOCKED_MESSAGE,
};
pub use health::{health, HealthResponse};
pub use rates::{get_rates, list_quarters, QuartersResponse, RateEntry, RatesResponse};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

/// Builds the application router.
pub fn router(state: SharedState) -> Router {
    let body_limit = state.config.max_body_bytes();

    Router::new()
        .route("/health", get(health))
        .route("/api/quarters", get(list_quarters))
        .route("/api/rates/{quarter}", get(get_rates))
        .route("/api/calculate", post(calculate))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
