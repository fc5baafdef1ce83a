//! # Calculate Endpoint
//!
//! Runs one full calculation for the caller.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/calculate  { text, quarter?, source? }                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  quarter offered? ──no──► 400 VALIDATION_ERROR                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  text within max_input_bytes? ──no──► 400 VALIDATION_ERROR              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  tier = entitlements(x-user-id)                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  source == upload && !tier.can_upload_files() ──► 403 FORBIDDEN         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  rates.get_rates(quarter) ──► Live | Builtin | Fallback(+warning)       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ifta_core::calculate(text, tier, table) ──► 200 CalculateResponse      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pasted and uploaded text are processed identically; `source` only gates
//! the paid-only upload feature.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use ifta_core::{
    AccessTier, Calculation, CalculationResult, Capabilities, ClassifiedRow, JurisdictionSummary,
    Quarter, TripRow,
};
use ifta_rates::{RateFetch, RateOrigin};

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::SharedState;

/// Shown when a non-paid caller tries to upload a file.
pub const UPLOAD_LOCKED_MESSAGE: &str = "File upload available after signing up for $1";

// =============================================================================
// Request / Response
// =============================================================================

/// How the text reached the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InputSource {
    #[default]
    Paste,
    Upload,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalculateRequest {
    /// Raw delimited text.
    pub text: String,

    /// Reporting quarter; the configured default when absent.
    #[serde(default)]
    pub quarter: Option<String>,

    #[serde(default)]
    pub source: InputSource,
}

/// One processed row, ready for the preview table.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RowPreview {
    pub line: usize,
    pub jurisdiction: String,
    pub miles: f64,
    /// As entered: gallons, or liters for Canadian provinces.
    pub quantity: f64,
    /// Normalized gallons; absent for unknown jurisdictions.
    pub gallons: Option<f64>,
    pub rate: Option<f64>,
    /// Three-decimal rate, or "unknown".
    pub rate_label: String,
    pub date: Option<String>,
    pub included: bool,
}

impl From<&ClassifiedRow> for RowPreview {
    fn from(classified: &ClassifiedRow) -> Self {
        RowPreview {
            line: classified.row.source_line,
            jurisdiction: classified.row.jurisdiction.clone(),
            miles: classified.row.miles,
            quantity: classified.row.quantity,
            gallons: classified.gallons(),
            rate: classified.rate(),
            rate_label: classified.rate_label(),
            date: classified.row.date.clone(),
            included: classified.is_included(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalculateResponse {
    pub quarter: Quarter,
    pub tier: AccessTier,
    pub capabilities: Capabilities,
    #[ts(type = "\"live\" | \"builtin\" | \"fallback\"")]
    pub rate_origin: RateOrigin,

    /// "Row N: ..." diagnostics in line order.
    pub errors: Vec<String>,

    /// Rate fallback, cap advisory, unknown jurisdictions, in that order.
    pub warnings: Vec<String>,

    pub result: CalculationResult,
    pub has_rows: bool,
    pub rows: Vec<RowPreview>,
    /// Rows dropped by the tier's row cap.
    pub over_cap: Vec<TripRow>,
    pub by_jurisdiction: Vec<JurisdictionSummary>,
}

impl CalculateResponse {
    fn build(quarter: Quarter, tier: AccessTier, fetch: &RateFetch, calc: Calculation) -> Self {
        let errors = calc.error_messages();
        let agg = calc.aggregation;

        let warnings = fetch
            .warning()
            .map(str::to_string)
            .into_iter()
            .chain(agg.cap_advisory.map(|a| a.to_string()))
            .chain(agg.unknown_advisory())
            .collect();

        CalculateResponse {
            quarter,
            tier,
            capabilities: tier.capabilities(),
            rate_origin: fetch.origin(),
            errors,
            warnings,
            result: agg.result,
            has_rows: agg.has_rows(),
            rows: agg.rows.iter().map(RowPreview::from).collect(),
            over_cap: agg.over_cap,
            by_jurisdiction: agg.by_jurisdiction,
        }
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Calculates the estimate for the caller's text.
///
/// ## Errors
/// - 400 `VALIDATION_ERROR`: quarter not offered, or text too large
/// - 401 `UNAUTHORIZED`: malformed `x-user-id`
/// - 403 `FORBIDDEN`: upload by a tier without file uploads
///
/// Everything else (bad rows, unknown jurisdictions, cap truncation, rate
/// fallback) is reported inside a 200 response.
pub async fn calculate(
    State(state): State<SharedState>,
    caller: Caller,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, ApiError> {
    let quarter = state.resolve_quarter(req.quarter.as_deref())?;

    let limit = state.config.max_input_bytes;
    if req.text.len() > limit {
        return Err(ApiError::validation(format!(
            "Input too large: {} bytes (limit {} bytes)",
            req.text.len(),
            limit
        )));
    }

    let tier = state.entitlements.tier_for(caller.id()).await;
    if req.source == InputSource::Upload && !tier.can_upload_files() {
        debug!(%tier, "Upload rejected for tier");
        return Err(ApiError::forbidden(UPLOAD_LOCKED_MESSAGE));
    }

    let fetch = state.rates.get_rates(&quarter).await;
    let calc = ifta_core::calculate(&req.text, tier, fetch.table());

    info!(
        %quarter,
        %tier,
        rate_origin = %fetch.origin(),
        rows = calc.aggregation.rows.len(),
        rejected = calc.errors.len(),
        over_cap = calc.aggregation.over_cap.len(),
        "Calculation complete"
    );

    Ok(Json(CalculateResponse::build(quarter, tier, &fetch, calc)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::entitlements::EntitlementStore;
    use crate::error::ErrorCode;
    use crate::state::AppState;
    use chrono::Utc;
    use ifta_rates::{RateProvider, RatesConfig, FALLBACK_WARNING};
    use std::sync::Arc;
    use uuid::Uuid;

    const PAID_USER: Uuid = Uuid::from_u128(0xA1);
    const FREE_USER: Uuid = Uuid::from_u128(0xB2);

    async fn state_with(config: ApiConfig, rates: RateProvider) -> SharedState {
        let entitlements = EntitlementStore::new();
        entitlements.mark_paid(PAID_USER, Utc::now()).await;
        Arc::new(AppState::new(config, rates, entitlements))
    }

    async fn state() -> SharedState {
        state_with(ApiConfig::default(), RateProvider::builtin()).await
    }

    fn paste(text: &str) -> Json<CalculateRequest> {
        Json(CalculateRequest {
            text: text.to_string(),
            quarter: None,
            source: InputSource::Paste,
        })
    }

    async fn run(
        state: &SharedState,
        caller: Caller,
        req: Json<CalculateRequest>,
    ) -> Result<CalculateResponse, ApiError> {
        calculate(State(state.clone()), caller, req)
            .await
            .map(|Json(body)| body)
    }

    #[tokio::test]
    async fn test_paid_caller_mixed_units() {
        let state = state().await;
        let body = run(&state, Caller::user(PAID_USER), paste("TX,1200,130\nON,500,190"))
            .await
            .unwrap();

        assert_eq!(body.tier, AccessTier::AuthenticatedPaid);
        assert_eq!(body.quarter.as_str(), "2025-Q3");
        assert_eq!(body.rate_origin, RateOrigin::Builtin);
        assert!(body.errors.is_empty());
        assert!(body.warnings.is_empty());
        assert!(body.has_rows);

        assert_eq!(body.result.total_miles, 1700.0);
        assert!((body.result.total_gallons - 180.19268).abs() < 1e-9);
        assert!((body.result.tax_owed - 47.43227436).abs() < 1e-9);

        let on = &body.rows[1];
        assert_eq!(on.jurisdiction, "ON");
        assert_eq!(on.quantity, 190.0);
        assert_eq!(on.rate_label, "0.427");
        assert!(on.included);
    }

    #[tokio::test]
    async fn test_anonymous_over_cap() {
        let state = state().await;
        let body = run(
            &state,
            Caller::anonymous(),
            paste("TX,100,10\nTX,200,20\nTX,300,30"),
        )
        .await
        .unwrap();

        assert_eq!(body.tier, AccessTier::Anonymous);
        assert_eq!(body.capabilities.row_limit, Some(2));
        assert_eq!(body.rows.len(), 2);
        assert_eq!(body.over_cap.len(), 1);
        assert_eq!(body.result.total_miles, 300.0);
        assert_eq!(body.warnings.len(), 1);
        assert!(body.warnings[0].starts_with("Demo limited to 2 rows"));
    }

    #[tokio::test]
    async fn test_unpaid_caller_gets_upgrade_wording() {
        let state = state().await;
        let body = run(
            &state,
            Caller::user(FREE_USER),
            paste("TX,100,10\nTX,200,20\nTX,300,30"),
        )
        .await
        .unwrap();

        assert_eq!(body.tier, AccessTier::AuthenticatedUnpaid);
        assert!(body.warnings[0].starts_with("Preview limited to 2 rows"));
        assert!(body.warnings[0].contains("Upgrade for $1"));
    }

    #[tokio::test]
    async fn test_unknown_jurisdiction_and_row_errors() {
        let state = state().await;
        let body = run(
            &state,
            Caller::user(PAID_USER),
            paste("ZZ,100,10\nTX,abc,10"),
        )
        .await
        .unwrap();

        assert_eq!(body.errors, vec!["Row 2: Invalid miles value"]);
        assert_eq!(
            body.warnings,
            vec!["Unknown jurisdictions: ZZ. These will be excluded from calculations."]
        );
        assert_eq!(body.rows.len(), 1);
        assert!(!body.rows[0].included);
        assert_eq!(body.rows[0].rate_label, "unknown");
        assert_eq!(body.result.mpg, 0.0);
    }

    #[tokio::test]
    async fn test_empty_text() {
        let state = state().await;
        let body = run(&state, Caller::anonymous(), paste("   ")).await.unwrap();

        assert!(!body.has_rows);
        assert!(body.errors.is_empty());
        assert_eq!(body.result, CalculationResult::default());
    }

    #[tokio::test]
    async fn test_upload_requires_payment() {
        let state = state().await;
        let upload = |text: &str| {
            Json(CalculateRequest {
                text: text.to_string(),
                quarter: None,
                source: InputSource::Upload,
            })
        };

        for caller in [Caller::anonymous(), Caller::user(FREE_USER)] {
            let err = run(&state, caller, upload("TX,1,1")).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::Forbidden);
            assert_eq!(err.message, UPLOAD_LOCKED_MESSAGE);
        }

        let body = run(&state, Caller::user(PAID_USER), upload("TX,1,1"))
            .await
            .unwrap();
        assert_eq!(body.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_quarter() {
        let state = state().await;
        let req = Json(CalculateRequest {
            text: "TX,1,1".into(),
            quarter: Some("2019-Q1".into()),
            source: InputSource::Paste,
        });

        let err = run(&state, Caller::anonymous(), req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_input_size_limit() {
        let config = ApiConfig {
            max_input_bytes: 8,
            ..ApiConfig::default()
        };
        let state = state_with(config, RateProvider::builtin()).await;

        let err = run(&state, Caller::anonymous(), paste("TX,100,10\nTX,1,1"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_live_source_failure_falls_back() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut rates_config = RatesConfig::default();
        rates_config.source.url = Some(format!("http://{}/rates/{{quarter}}", addr));
        let rates = RateProvider::from_config(&rates_config).unwrap();
        let state = state_with(ApiConfig::default(), rates).await;

        let body = run(&state, Caller::user(PAID_USER), paste("TX,1200,130"))
            .await
            .unwrap();

        assert_eq!(body.rate_origin, RateOrigin::Fallback);
        assert_eq!(body.warnings, vec![FALLBACK_WARNING]);
        assert!((body.result.tax_owed - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_request_defaults() {
        let req: CalculateRequest = serde_json::from_str(r#"{"text":"TX,1,1"}"#).unwrap();
        assert_eq!(req.source, InputSource::Paste);
        assert!(req.quarter.is_none());

        let req: CalculateRequest =
            serde_json::from_str(r#"{"text":"","quarter":"2025-Q1","source":"upload"}"#)
                .unwrap();
        assert_eq!(req.source, InputSource::Upload);
    }

    #[tokio::test]
    async fn test_response_is_camel_case() {
        let state = state().await;
        let body = run(&state, Caller::anonymous(), paste("TX,1,1")).await.unwrap();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["hasRows"], true);
        assert_eq!(json["rateOrigin"], "builtin");
        assert_eq!(json["tier"], "anonymous");
        assert!(json["byJurisdiction"].is_array());
        assert!(json["overCap"].is_array());
        assert_eq!(json["rows"][0]["rateLabel"], "0.200");
    }
}
