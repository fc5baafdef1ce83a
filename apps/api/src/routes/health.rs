use axum::extract::State;
use axum::Json;
use serde::Serialize;
use ts_rs::TS;

use crate::state::SharedState;

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// False when only the built-in rate table is served.
    pub live_rates: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        live_rates: state.rates.has_live_source(),
    })
}
