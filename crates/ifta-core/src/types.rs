//! # Domain Types
//!
//! Core domain types used throughout IFTA QuickCalc.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    TripRow      │   │   AccessTier    │   │  CalculationResult  │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  jurisdiction   │   │  Anonymous      │   │  total_miles        │   │
//! │  │  miles          │   │  AuthUnpaid     │   │  total_gallons      │   │
//! │  │  quantity       │   │  AuthPaid       │   │  mpg                │   │
//! │  │  source_line    │   │                 │   │  tax_owed           │   │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────────┘   │
//! │                                 │                                       │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────────┐   │
//! │  │    Quarter      │   │     RowCap      │   │    Capabilities     │   │
//! │  │  "2025-Q3"      │   │  Limited(2)     │   │  upload, download   │   │
//! │  │  (opaque tag)   │   │  Unlimited      │   │                     │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::FREE_ROW_LIMIT;

// =============================================================================
// Quarter
// =============================================================================

/// Reporting quarter tag, e.g. `"2025-Q3"`.
///
/// The core treats the tag as opaque: it only selects a rate table. Callers
/// that offer a fixed set of quarters validate membership themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quarter(String);

impl Quarter {
    /// Creates a quarter tag, trimming surrounding whitespace.
    pub fn new(tag: impl AsRef<str>) -> Self {
        Quarter(tag.as_ref().trim().to_string())
    }

    /// Returns the tag as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Quarter {
    fn from(tag: &str) -> Self {
        Quarter::new(tag)
    }
}

impl From<String> for Quarter {
    fn from(tag: String) -> Self {
        Quarter::new(tag)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Trip Row
// =============================================================================

/// One validated input record.
///
/// ## Invariant
/// A `TripRow` only exists if its line passed structural and numeric
/// validation in [`crate::parser::parse`]. Rejected lines only ever produce
/// a [`crate::RowError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TripRow {
    /// Uppercase jurisdiction code (US state, Canadian province, or DC).
    pub jurisdiction: String,

    /// Miles driven in the jurisdiction (>= 0).
    pub miles: f64,

    /// Fuel purchased, in the jurisdiction's native unit (>= 0).
    /// Gallons for US/DC, liters for Canadian provinces.
    pub quantity: f64,

    /// 1-based line position in the input batch.
    pub source_line: usize,

    /// Optional 4th column, kept verbatim for display.
    pub date: Option<String>,
}

// =============================================================================
// Row Cap
// =============================================================================

/// Maximum number of rows a calculation will process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "kind", content = "rows")]
#[ts(export)]
pub enum RowCap {
    /// Only the first `n` rows are processed.
    Limited(usize),
    /// Every row is processed.
    Unlimited,
}

impl RowCap {
    /// Returns the numeric limit, or `None` when unlimited.
    pub fn limit(&self) -> Option<usize> {
        match self {
            RowCap::Limited(n) => Some(*n),
            RowCap::Unlimited => None,
        }
    }

    /// Returns true if `count` rows exceed this cap.
    pub fn is_exceeded_by(&self, count: usize) -> bool {
        self.limit().is_some_and(|n| count > n)
    }
}

// =============================================================================
// Access Tier
// =============================================================================

/// The caller's entitlement level.
///
/// ## Derivation
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  identity?  ──no──►  Anonymous            cap: 2 rows                   │
/// │     │                                                                   │
/// │    yes                                                                  │
/// │     │                                                                   │
/// │  paid_at?   ──no──►  AuthenticatedUnpaid  cap: 2 rows                   │
/// │     │                                                                   │
/// │    yes ────────────►  AuthenticatedPaid   cap: none, upload, downloads  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AccessTier {
    /// No authenticated identity.
    #[default]
    Anonymous,
    /// Signed in, no payment recorded.
    AuthenticatedUnpaid,
    /// Signed in with a recorded one-time payment.
    AuthenticatedPaid,
}

impl AccessTier {
    /// Derives the tier from the auth/payment collaborator's view of a caller.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use ifta_core::AccessTier;
    ///
    /// assert_eq!(AccessTier::from_marker(false, None), AccessTier::Anonymous);
    /// assert_eq!(AccessTier::from_marker(true, None), AccessTier::AuthenticatedUnpaid);
    /// assert_eq!(
    ///     AccessTier::from_marker(true, Some(Utc::now())),
    ///     AccessTier::AuthenticatedPaid
    /// );
    /// ```
    pub fn from_marker(authenticated: bool, paid_at: Option<DateTime<Utc>>) -> Self {
        match (authenticated, paid_at) {
            (false, _) => AccessTier::Anonymous,
            (true, None) => AccessTier::AuthenticatedUnpaid,
            (true, Some(_)) => AccessTier::AuthenticatedPaid,
        }
    }

    /// Row-processing cap for this tier.
    pub fn row_cap(&self) -> RowCap {
        match self {
            AccessTier::Anonymous | AccessTier::AuthenticatedUnpaid => {
                RowCap::Limited(FREE_ROW_LIMIT)
            }
            AccessTier::AuthenticatedPaid => RowCap::Unlimited,
        }
    }

    /// Returns true if the caller has paid.
    pub fn is_paid(&self) -> bool {
        matches!(self, AccessTier::AuthenticatedPaid)
    }

    /// File uploads are a paid feature; pasting is always allowed.
    pub fn can_upload_files(&self) -> bool {
        self.is_paid()
    }

    /// Report downloads are a paid feature.
    pub fn can_download_reports(&self) -> bool {
        self.is_paid()
    }

    /// Feature summary for rendering.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            row_limit: self.row_cap().limit(),
            file_upload: self.can_upload_files(),
            report_download: self.can_download_reports(),
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTier::Anonymous => write!(f, "anonymous"),
            AccessTier::AuthenticatedUnpaid => write!(f, "authenticated_unpaid"),
            AccessTier::AuthenticatedPaid => write!(f, "authenticated_paid"),
        }
    }
}

/// What a tier unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Capabilities {
    /// Row limit, `None` when unlimited.
    pub row_limit: Option<usize>,
    pub file_upload: bool,
    pub report_download: bool,
}

// =============================================================================
// Calculation Result
// =============================================================================

/// Aggregate totals over the included rows.
///
/// Derived on every calculation and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalculationResult {
    /// Sum of miles over rows with a known rate.
    pub total_miles: f64,

    /// Sum of normalized gallons over rows with a known rate.
    pub total_gallons: f64,

    /// `total_miles / total_gallons`, or 0 when no gallons were counted.
    pub mpg: f64,

    /// Sum of `gallons * rate`, in dollars.
    pub tax_owed: f64,
}

impl CalculationResult {
    /// Builds a result from accumulated totals, guarding the mpg division.
    pub fn from_totals(total_miles: f64, total_gallons: f64, tax_owed: f64) -> Self {
        let mpg = if total_gallons > 0.0 {
            total_miles / total_gallons
        } else {
            0.0
        };

        CalculationResult {
            total_miles,
            total_gallons,
            mpg,
            tax_owed,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_trims() {
        let quarter = Quarter::from("  2025-Q1 ");
        assert_eq!(quarter.as_str(), "2025-Q1");
        assert_eq!(quarter.to_string(), "2025-Q1");
    }

    #[test]
    fn test_tier_caps() {
        assert_eq!(AccessTier::Anonymous.row_cap(), RowCap::Limited(2));
        assert_eq!(AccessTier::AuthenticatedUnpaid.row_cap(), RowCap::Limited(2));
        assert_eq!(AccessTier::AuthenticatedPaid.row_cap(), RowCap::Unlimited);
    }

    #[test]
    fn test_row_cap_exceeded() {
        assert!(!RowCap::Limited(2).is_exceeded_by(2));
        assert!(RowCap::Limited(2).is_exceeded_by(3));
        assert!(!RowCap::Unlimited.is_exceeded_by(usize::MAX));
    }

    #[test]
    fn test_tier_from_marker_ignores_marker_without_identity() {
        let tier = AccessTier::from_marker(false, Some(Utc::now()));
        assert_eq!(tier, AccessTier::Anonymous);
    }

    #[test]
    fn test_capabilities() {
        let free = AccessTier::AuthenticatedUnpaid.capabilities();
        assert_eq!(free.row_limit, Some(2));
        assert!(!free.file_upload);
        assert!(!free.report_download);

        let paid = AccessTier::AuthenticatedPaid.capabilities();
        assert_eq!(paid.row_limit, None);
        assert!(paid.file_upload);
        assert!(paid.report_download);
    }

    #[test]
    fn test_tier_serde_names() {
        let json = serde_json::to_string(&AccessTier::AuthenticatedUnpaid).unwrap();
        assert_eq!(json, "\"authenticated_unpaid\"");
        assert_eq!(AccessTier::AuthenticatedPaid.to_string(), "authenticated_paid");
    }

    #[test]
    fn test_mpg_guard() {
        let result = CalculationResult::from_totals(100.0, 0.0, 0.0);
        assert_eq!(result.mpg, 0.0);

        let result = CalculationResult::from_totals(100.0, 20.0, 4.0);
        assert_eq!(result.mpg, 5.0);
    }
}
