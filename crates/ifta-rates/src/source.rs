//! # Rate Sources
//!
//! Where live rate tables come from.
//!
//! ## Wire Format
//! ```text
//! GET https://rates.example.com/ifta/2025-Q3.json
//!
//! 200 OK
//! {
//!   "quarter": "2025-Q3",          optional; must match when present
//!   "rates": { "TX": 0.20, "ON": 0.427, "OR": 0 }
//! }
//! ```
//!
//! Codes are trimmed and uppercased. A negative rate, a non-numeric rate,
//! or an empty `rates` map makes the whole payload malformed: a partial
//! table is never returned.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use ifta_core::{Quarter, RateTable};

use crate::config::{validate_url_template, QUARTER_PLACEHOLDER};
use crate::error::{RatesError, RatesResult};

/// Longest response body echoed back in a `Server` error.
const MAX_ERROR_BODY: usize = 512;

// =============================================================================
// Rate Source Trait
// =============================================================================

/// A source of live rate tables.
///
/// Implementations do not time out or fall back themselves; the
/// [`RateProvider`](crate::RateProvider) wraps every call in both.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the table for `quarter`.
    async fn fetch(&self, quarter: &Quarter) -> RatesResult<RateTable>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

// =============================================================================
// HTTP Source
// =============================================================================

#[derive(Debug, Deserialize)]
struct RatePayload {
    #[serde(default)]
    quarter: Option<String>,
    rates: BTreeMap<String, f64>,
}

/// Fetches rate tables over HTTP from a URL template.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    url_template: String,
}

impl HttpRateSource {
    /// Creates a source for `url_template`, which must contain `{quarter}`.
    pub fn new(url_template: impl Into<String>) -> RatesResult<Self> {
        let url_template = url_template.into();
        validate_url_template(&url_template)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("ifta-quickcalc/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url_template,
        })
    }

    /// URL for `quarter`.
    pub fn url_for(&self, quarter: &Quarter) -> String {
        self.url_template
            .replace(QUARTER_PLACEHOLDER, quarter.as_str())
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch(&self, quarter: &Quarter) -> RatesResult<RateTable> {
        let url = self.url_for(quarter);
        debug!(url = %url, %quarter, "Fetching live rates");

        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(RatesError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        decode_payload(quarter, &body)
    }

    fn describe(&self) -> String {
        format!("http({})", self.url_template)
    }
}

/// Decodes and validates a rate payload for `quarter`.
pub fn decode_payload(quarter: &Quarter, body: &str) -> RatesResult<RateTable> {
    let payload: RatePayload = serde_json::from_str(body)?;

    if let Some(label) = payload.quarter {
        let label = Quarter::new(label);
        if &label != quarter {
            return Err(RatesError::QuarterMismatch {
                expected: quarter.to_string(),
                actual: label.to_string(),
            });
        }
    }

    Ok(RateTable::new(quarter.clone(), payload.rates)?)
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
