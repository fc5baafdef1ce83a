//! # Rate Table
//!
//! Jurisdiction → fuel tax rate mapping for one reporting quarter, plus the
//! built-in fallback table.
//!
//! ## Known vs Unknown
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rates.get("TX") == Some(0.20)   known, taxed at $0.20/gal              │
//! │  rates.get("OR") == Some(0.0)    known, taxed at $0.00/gal (still counts│
//! │                                  toward miles and gallons)              │
//! │  rates.get("ZZ") == None         unknown, excluded from every sum       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fallback Coverage
//! The fallback table is compiled into the binary so a calculation never
//! waits on the network. It covers the 48 contiguous US states, DC, and the
//! 10 Canadian provinces.

use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Quarter;

// =============================================================================
// Fallback Table
// =============================================================================

/// Built-in rates in dollars per gallon.
pub const FALLBACK_RATES: [(&str, f64); 59] = [
    // US states (contiguous 48)
    ("AL", 0.29),
    ("AZ", 0.26),
    ("AR", 0.285),
    ("CA", 0.439),
    ("CO", 0.22),
    ("CT", 0.394),
    ("DE", 0.23),
    ("FL", 0.219),
    ("GA", 0.312),
    ("ID", 0.32),
    ("IL", 0.392),
    ("IN", 0.55),
    ("IA", 0.325),
    ("KS", 0.24),
    ("KY", 0.334),
    ("LA", 0.2),
    ("ME", 0.312),
    ("MD", 0.347),
    ("MA", 0.29),
    ("MI", 0.326),
    ("MN", 0.285),
    ("MS", 0.18),
    ("MO", 0.17),
    ("MT", 0.289),
    ("NE", 0.297),
    ("NV", 0.27),
    ("NH", 0.222),
    ("NJ", 0.383),
    ("NM", 0.21),
    ("NY", 0.33),
    ("NC", 0.38),
    ("ND", 0.23),
    ("OH", 0.47),
    ("OK", 0.2),
    ("OR", 0.0),
    ("PA", 0.409),
    ("RI", 0.34),
    ("SC", 0.28),
    ("SD", 0.28),
    ("TN", 0.27),
    ("TX", 0.2),
    ("UT", 0.285),
    ("VT", 0.32),
    ("VA", 0.282),
    ("WA", 0.494),
    ("WV", 0.357),
    ("WI", 0.329),
    ("WY", 0.24),
    // District of Columbia
    ("DC", 0.325),
    // Canadian provinces
    ("AB", 0.389),
    ("BC", 0.502),
    ("MB", 0.372),
    ("NB", 0.38),
    ("NL", 0.407),
    ("NS", 0.428),
    ("ON", 0.427),
    ("PE", 0.396),
    ("QC", 0.435),
    ("SK", 0.399),
];

// =============================================================================
// Rate Table
// =============================================================================

/// Immutable jurisdiction → rate mapping scoped to one quarter.
///
/// ## Invariant
/// Every present rate is finite and >= 0. Construction through
/// [`RateTable::new`] enforces this; there is no way to mutate a table after
/// it is built.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RateTable {
    quarter: Quarter,
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Builds a validated table.
    ///
    /// Codes are trimmed and uppercased. A later duplicate code replaces an
    /// earlier one.
    ///
    /// ## Example
    /// ```rust
    /// use ifta_core::RateTable;
    ///
    /// let table = RateTable::new("2025-Q1".into(), [("tx", 0.2), ("OR", 0.0)]).unwrap();
    /// assert_eq!(table.get("TX"), Some(0.2));
    /// assert_eq!(table.get("OR"), Some(0.0));
    /// assert_eq!(table.get("ZZ"), None);
    ///
    /// assert!(RateTable::new("2025-Q1".into(), [("TX", -1.0)]).is_err());
    /// ```
    pub fn new<I, K>(quarter: Quarter, entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut rates = BTreeMap::new();

        for (code, rate) in entries {
            let code = code.as_ref().trim().to_uppercase();

            if code.is_empty() {
                return Err(CoreError::EmptyJurisdiction);
            }

            if !rate.is_finite() || rate < 0.0 {
                return Err(CoreError::InvalidRate {
                    jurisdiction: code,
                    rate,
                });
            }

            rates.insert(code, rate);
        }

        if rates.is_empty() {
            return Err(CoreError::EmptyRateTable {
                quarter: quarter.to_string(),
            });
        }

        Ok(RateTable { quarter, rates })
    }

    /// The built-in table, labelled with `quarter`.
    pub fn fallback(quarter: Quarter) -> Self {
        let rates = FALLBACK_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();

        RateTable { quarter, rates }
    }

    /// Rate for `jurisdiction`, or `None` if the jurisdiction is unknown.
    #[inline]
    pub fn get(&self, jurisdiction: &str) -> Option<f64> {
        self.rates.get(jurisdiction).copied()
    }

    /// Returns true if `jurisdiction` has an entry (even a zero one).
    #[inline]
    pub fn contains(&self, jurisdiction: &str) -> bool {
        self.rates.contains_key(jurisdiction)
    }

    pub fn quarter(&self) -> &Quarter {
        &self.quarter
    }

    /// Number of jurisdictions in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Entries in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

/// Formats a rate for the preview table (three decimals).
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.3}")
}

// =============================================================================
// Unit Tests
// =============================================================================
