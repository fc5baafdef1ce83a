//! # Error Types
//!
//! Domain-specific error types for ifta-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ifta-core errors (this file)                                          │
//! │  ├── CoreError   - Rate table construction failures                    │
//! │  └── RowError    - Row-scoped parse diagnostics (non-fatal)            │
//! │                                                                         │
//! │  ifta-rates errors (separate crate)                                    │
//! │  └── RatesError  - Live fetch failures (recovered with fallback)       │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  └── ApiError    - What the frontend sees (serialized)                 │
//! │                                                                         │
//! │  NOT errors: unknown jurisdictions, cap truncation (classifications)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Row diagnostics render exactly the text shown to the user
//! 3. Errors are enum variants, never String

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while building domain values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A rate was negative, NaN or infinite.
    #[error("Invalid rate for {jurisdiction}: {rate}")]
    InvalidRate { jurisdiction: String, rate: f64 },

    /// A jurisdiction code was empty after trimming.
    #[error("Rate table contains an empty jurisdiction code")]
    EmptyJurisdiction,

    /// A rate table had no entries at all.
    #[error("Rate table for {quarter} has no entries")]
    EmptyRateTable { quarter: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Row Error
// =============================================================================

/// Why a line was rejected by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RowErrorKind {
    /// Fewer than three delimited columns.
    MissingColumns,
    /// First column empty after trimming.
    MissingJurisdiction,
    /// Second column not a finite, non-negative number.
    InvalidMiles,
    /// Third column not a finite, non-negative number.
    InvalidQuantity,
}

/// A row-scoped, non-fatal parse diagnostic.
///
/// ## Display
/// The `Display` output is the exact message shown to the user:
/// ```text
/// Row 3: Missing required columns (jurisdiction, miles, quantity)
/// Row 4: Missing jurisdiction
/// Row 5: Invalid miles value
/// Row 6: Invalid quantity value
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
#[error("Row {line}: {}", .kind.message())]
pub struct RowError {
    /// 1-based line number.
    pub line: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(line: usize, kind: RowErrorKind) -> Self {
        RowError { line, kind }
    }
}

impl RowErrorKind {
    /// User-facing description without the row prefix.
    pub fn message(&self) -> &'static str {
        match self {
            RowErrorKind::MissingColumns => {
                "Missing required columns (jurisdiction, miles, quantity)"
            }
            RowErrorKind::MissingJurisdiction => "Missing jurisdiction",
            RowErrorKind::InvalidMiles => "Invalid miles value",
            RowErrorKind::InvalidQuantity => "Invalid quantity value",
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
    fn test_row_error_messages() {
        let err = RowError::new(1, RowErrorKind::MissingColumns);
        assert_eq!(
            err.to_string(),
            "Row 1: Missing required columns (jurisdiction, miles, quantity)"
        );

        let err = RowError::new(7, RowErrorKind::InvalidQuantity);
        assert_eq!(err.to_string(), "Row 7: Invalid quantity value");
    }

    #[test]
    fn test_core_error_messages() {
        let err = CoreError::InvalidRate {
            jurisdiction: "TX".to_string(),
            rate: -0.5,
        };
        assert_eq!(err.to_string(), "Invalid rate for TX: -0.5");

        let err = CoreError::EmptyRateTable {
            quarter: "2025-Q1".to_string(),
        };
        assert_eq!(err.to_string(), "Rate table for 2025-Q1 has no entries");
    }

    #[test]
    fn test_row_error_serializes_kind() {
        let err = RowError::new(2, RowErrorKind::InvalidMiles);
        let json = serde_json::to_value(err).unwrap();
        assert_eq!(json["line"], 2);
        assert_eq!(json["kind"], "invalid_miles");
    }
}
