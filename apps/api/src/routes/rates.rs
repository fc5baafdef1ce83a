//! Quarter and rate table lookups.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

use ifta_core::rates::format_rate;
use ifta_core::Quarter;
use ifta_rates::RateOrigin;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuartersResponse {
    pub quarters: Vec<Quarter>,
    pub default: Quarter,
}

/// One row of the rate table as shown to users.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RateEntry {
    pub jurisdiction: String,
    pub rate: f64,
    /// Three-decimal display form.
    pub rate_label: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RatesResponse {
    pub quarter: Quarter,
    #[ts(type = "\"live\" | \"builtin\" | \"fallback\"")]
    pub origin: RateOrigin,
    pub warning: Option<String>,
    /// Sorted by jurisdiction code.
    pub rates: Vec<RateEntry>,
}

/// Lists offered quarters.
pub async fn list_quarters(State(state): State<SharedState>) -> Json<QuartersResponse> {
    Json(QuartersResponse {
        quarters: state.config.quarters.clone(),
        default: state.config.default_quarter.clone(),
    })
}

/// Returns the rate table for a quarter.
///
/// ## Errors
/// - 404 `NOT_FOUND` for a quarter outside the offered set
///
/// A failed live fetch is not an error: the built-in table comes back with
/// `origin = "fallback"` and a warning.
pub async fn get_rates(
    State(state): State<SharedState>,
    Path(quarter): Path<String>,
) -> Result<Json<RatesResponse>, ApiError> {
    let quarter = Quarter::from(quarter);
    if !state.config.supports(&quarter) {
        return Err(ApiError::not_found("Quarter", quarter.as_str()));
    }

    let fetch = state.rates.get_rates(&quarter).await;
    debug!(%quarter, origin = %fetch.origin(), "Rates requested");

    let rates = fetch
        .table()
        .iter()
        .map(|(code, rate)| RateEntry {
            jurisdiction: code.to_string(),
            rate,
            rate_label: format_rate(rate),
        })
        .collect();

    Ok(Json(RatesResponse {
        quarter,
        origin: fetch.origin(),
        warning: fetch.warning().map(str::to_string),
        rates,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::entitlements::EntitlementStore;
    use crate::error::ErrorCode;
    use crate::state::AppState;
    use ifta_rates::RateProvider;
    use std::sync::Arc;

    fn state() -> SharedState {
        Arc::new(AppState::new(
            ApiConfig::default(),
            RateProvider::builtin(),
            EntitlementStore::new(),
        ))
    }

    #[tokio::test]
    async fn test_list_quarters() {
        let Json(body) = list_quarters(State(state())).await;
        assert_eq!(body.quarters.len(), 4);
        assert_eq!(body.default.as_str(), "2025-Q3");
    }

    #[tokio::test]
    async fn test_builtin_rates() {
        let Json(body) = get_rates(State(state()), Path("2025-Q1".to_string()))
            .await
            .unwrap();

        assert_eq!(body.quarter.as_str(), "2025-Q1");
        assert_eq!(body.origin, RateOrigin::Builtin);
        assert!(body.warning.is_none());
        assert_eq!(body.rates.len(), 59);

        let oregon = body.rates.iter().find(|r| r.jurisdiction == "OR").unwrap();
        assert_eq!(oregon.rate, 0.0);
        assert_eq!(oregon.rate_label, "0.000");

        // Sorted by code
        assert_eq!(body.rates[0].jurisdiction, "AB");
    }

    #[tokio::test]
    async fn test_unknown_quarter() {
        let err = get_rates(State(state()), Path("1999-Q1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
