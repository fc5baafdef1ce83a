//! # Aggregation Engine
//!
//! Applies the row cap, classifies rows against the rate table, normalizes
//! fuel to gallons and sums miles, gallons and tax.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        aggregate(rows, rates, cap)                      │
//! │                                                                         │
//! │  rows ──► cap ──┬──► first N rows ──► rate lookup ──┬──► Included      │
//! │                 │                                   │    gallons, tax   │
//! │                 │                                   │    counted        │
//! │                 │                                   │                   │
//! │                 │                                   └──► Unknown        │
//! │                 │                                        listed, never  │
//! │                 │                                        counted        │
//! │                 │                                                       │
//! │                 └──► rows after N ──► over_cap + CapAdvisory            │
//! │                                                                         │
//! │  mpg = total_gallons > 0 ? total_miles / total_gallons : 0              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is pure: identical inputs give bit-identical outputs, and
//! nothing outside the returned [`Aggregation`] is touched.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use ts_rs::TS;

use crate::rates::{format_rate, RateTable};
use crate::types::{AccessTier, CalculationResult, RowCap, TripRow};
use crate::units::to_gallons;

// =============================================================================
// Row Classification
// =============================================================================

/// How a processed row was treated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
#[ts(export)]
pub enum RowStatus {
    /// The jurisdiction has a rate; the row counts toward every total.
    Included {
        /// Dollars per gallon.
        rate: f64,
        /// Quantity normalized to US gallons.
        gallons: f64,
        /// `gallons * rate`.
        tax: f64,
    },
    /// The jurisdiction is absent from the rate table; excluded from totals.
    UnknownJurisdiction,
}

/// A processed row together with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClassifiedRow {
    pub row: TripRow,
    pub status: RowStatus,
}

impl ClassifiedRow {
    /// Returns true if the row contributes to the totals.
    pub fn is_included(&self) -> bool {
        matches!(self.status, RowStatus::Included { .. })
    }

    /// Rate applied to this row, if its jurisdiction is known.
    pub fn rate(&self) -> Option<f64> {
        match self.status {
            RowStatus::Included { rate, .. } => Some(rate),
            RowStatus::UnknownJurisdiction => None,
        }
    }

    /// Normalized gallons, if the row was included.
    pub fn gallons(&self) -> Option<f64> {
        match self.status {
            RowStatus::Included { gallons, .. } => Some(gallons),
            RowStatus::UnknownJurisdiction => None,
        }
    }

    /// Rate as shown in the preview table: three decimals or `"unknown"`.
    pub fn rate_label(&self) -> String {
        self.rate().map_or_else(|| "unknown".to_string(), format_rate)
    }
}

/// Totals for one known jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct JurisdictionSummary {
    pub jurisdiction: String,
    pub miles: f64,
    pub gallons: f64,
    pub rate: f64,
    pub tax: f64,
}

// =============================================================================
// Cap Advisory
// =============================================================================

/// Advisory produced when rows were dropped by the row cap.
///
/// ## Wording
/// The cap value is the same for every free tier; only the call to action
/// differs:
/// ```text
/// Anonymous:            Demo limited to 2 rows (1 row not processed). Sign up for $1 ...
/// AuthenticatedUnpaid:  Preview limited to 2 rows (1 row not processed). Upgrade for $1 ...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CapAdvisory {
    /// Rows kept.
    pub limit: usize,
    /// Rows dropped after the limit.
    pub dropped: usize,
    /// Tier used to pick the wording, when known.
    pub tier: Option<AccessTier>,
}

impl fmt::Display for CapAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.dropped == 1 { "row" } else { "rows" };

        match self.tier {
            Some(AccessTier::Anonymous) => write!(
                f,
                "Demo limited to {} rows ({} {} not processed). \
                 Sign up for $1 to process unlimited data.",
                self.limit, self.dropped, noun
            ),
            Some(AccessTier::AuthenticatedUnpaid) => write!(
                f,
                "Preview limited to {} rows ({} {} not processed). \
                 Upgrade for $1 to process unlimited data.",
                self.limit, self.dropped, noun
            ),
            _ => write!(
                f,
                "Processing limited to {} rows ({} {} not processed).",
                self.limit, self.dropped, noun
            ),
        }
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Everything a caller needs to render a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Aggregation {
    /// Totals over included rows.
    pub result: CalculationResult,

    /// Rows within the cap, in original order, each classified.
    pub rows: Vec<ClassifiedRow>,

    /// Rows beyond the cap, in original order. Never counted.
    pub over_cap: Vec<TripRow>,

    /// Per-jurisdiction totals for included rows, sorted by code.
    pub by_jurisdiction: Vec<JurisdictionSummary>,

    /// Present when `over_cap` is non-empty.
    pub cap_advisory: Option<CapAdvisory>,
}

impl Aggregation {
    /// Returns true if at least one row was processed.
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Rows that contributed to the totals.
    pub fn included(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.rows.iter().filter(|r| r.is_included())
    }

    /// Rows whose jurisdiction is not in the rate table.
    pub fn unknown(&self) -> impl Iterator<Item = &TripRow> {
        self.rows
            .iter()
            .filter(|r| !r.is_included())
            .map(|r| &r.row)
    }

    /// Distinct unknown jurisdiction codes in first-seen order.
    pub fn unknown_jurisdictions(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for row in self.unknown() {
            if !codes.contains(&row.jurisdiction) {
                codes.push(row.jurisdiction.clone());
            }
        }
        codes
    }

    /// User-facing advisory listing unknown jurisdictions, if any.
    pub fn unknown_advisory(&self) -> Option<String> {
        let codes = self.unknown_jurisdictions();
        if codes.is_empty() {
            return None;
        }

        Some(format!(
            "Unknown jurisdictions: {}. These will be excluded from calculations.",
            codes.join(", ")
        ))
    }

    /// Attaches tier-specific wording to the cap advisory.
    pub fn with_tier_wording(mut self, tier: AccessTier) -> Self {
        if let Some(advisory) = self.cap_advisory.as_mut() {
            advisory.tier = Some(tier);
        }
        self
    }
}

/// Aggregates validated rows against a rate table under a row cap.
///
/// ## Rules
/// 1. Rows beyond the cap are moved to `over_cap` (stable prefix kept)
/// 2. Unknown jurisdictions are listed but excluded from every sum
/// 3. Canadian quantities are liters and converted to gallons
/// 4. `tax_owed` sums `gallons * rate` over included rows
///
/// ## Example
/// ```rust
/// use ifta_core::{aggregate, parse, RateTable, RowCap};
///
/// let rates = RateTable::new("2025-Q3".into(), [("TX", 0.20), ("ON", 0.427)]).unwrap();
/// let rows = parse("TX,1200,130\nON,500,190").rows;
/// let agg = aggregate(&rows, &rates, RowCap::Unlimited);
///
/// assert_eq!(agg.result.total_miles, 1700.0);
/// assert!((agg.result.total_gallons - 180.19268).abs() < 1e-9);
/// assert!((agg.result.tax_owed - 47.43227436).abs() < 1e-9);
/// ```
pub fn aggregate(rows: &[TripRow], rates: &RateTable, cap: RowCap) -> Aggregation {
    let keep = cap.limit().map_or(rows.len(), |n| n.min(rows.len()));
    let (kept, dropped) = rows.split_at(keep);

    let mut total_miles = 0.0;
    let mut total_gallons = 0.0;
    let mut tax_owed = 0.0;
    let mut classified = Vec::with_capacity(kept.len());
    let mut summaries: BTreeMap<&str, JurisdictionSummary> = BTreeMap::new();

    for row in kept {
        let status = match rates.get(&row.jurisdiction) {
            Some(rate) => {
                let gallons = to_gallons(&row.jurisdiction, row.quantity);
                let tax = gallons * rate;

                total_miles += row.miles;
                total_gallons += gallons;
                tax_owed += tax;

                let summary = summaries
                    .entry(row.jurisdiction.as_str())
                    .or_insert_with(|| JurisdictionSummary {
                        jurisdiction: row.jurisdiction.clone(),
                        miles: 0.0,
                        gallons: 0.0,
                        rate,
                        tax: 0.0,
                    });
                summary.miles += row.miles;
                summary.gallons += gallons;
                summary.tax += tax;

                RowStatus::Included { rate, gallons, tax }
            }
            None => RowStatus::UnknownJurisdiction,
        };

        classified.push(ClassifiedRow {
            row: row.clone(),
            status,
        });
    }

    let cap_advisory = cap.is_exceeded_by(rows.len()).then(|| CapAdvisory {
        limit: keep,
        dropped: dropped.len(),
        tier: None,
    });

    Aggregation {
        result: CalculationResult::from_totals(total_miles, total_gallons, tax_owed),
        rows: classified,
        over_cap: dropped.to_vec(),
        by_jurisdiction: summaries.into_values().collect(),
        cap_advisory,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
