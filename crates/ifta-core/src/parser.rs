//! # Parser Module
//!
//! Turns pasted or uploaded trip text into validated [`TripRow`]s.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Per-Line Classification                            │
//! │                                                                         │
//! │  "TX,1200,130,2025-07-12"                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  split on , or \t ──► < 3 tokens? ──► "Missing required columns"       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  jurisdiction ──────► empty? ───────► "Missing jurisdiction"           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  miles ─────────────► NaN/neg? ─────► "Invalid miles value"            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  quantity ──────────► NaN/neg? ─────► "Invalid quantity value"         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TripRow (date column kept verbatim, never validated)                   │
//! │                                                                         │
//! │  Every line is classified independently; one bad line never stops     │
//! │  the rest of the batch.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ifta_core::parser::parse;
//!
//! let batch = parse("TX,1200,130\nON,500,190,2025-08-01\nTX,abc,10");
//! assert_eq!(batch.rows.len(), 2);
//! assert_eq!(batch.errors[0].to_string(), "Row 3: Invalid miles value");
//! ```

use serde::Serialize;

use crate::error::{RowError, RowErrorKind};
use crate::types::TripRow;

/// Column delimiters. Each line is tokenized on either character.
const DELIMITERS: [char; 2] = [',', '\t'];

/// Parser output: accepted rows plus diagnostics for rejected lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBatch {
    /// Accepted rows in original line order.
    pub rows: Vec<TripRow>,
    /// One diagnostic per rejected line, in line order.
    pub errors: Vec<RowError>,
}

impl ParsedBatch {
    /// Returns true if the input produced neither rows nor errors.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.errors.is_empty()
    }
}

/// Parses raw delimited text.
///
/// ## Rules
/// - Empty or whitespace-only input is a reset: no rows, no errors
/// - Surrounding whitespace of the whole input is trimmed before splitting
/// - Lines are split on `\n` or `\r\n`; blank lines are skipped
/// - Line numbers are 1-based physical positions, blank lines included
pub fn parse(text: &str) -> ParsedBatch {
    let text = text.trim();
    let mut batch = ParsedBatch::default();

    if text.is_empty() {
        return batch;
    }

    for (index, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.trim().is_empty() {
            continue;
        }

        match parse_line(line, index + 1) {
            Ok(row) => batch.rows.push(row),
            Err(err) => batch.errors.push(err),
        }
    }

    batch
}

/// Classifies a single non-blank line.
fn parse_line(line: &str, line_number: usize) -> Result<TripRow, RowError> {
    let reject = |kind| RowError::new(line_number, kind);
    let tokens: Vec<&str> = line.split(DELIMITERS).collect();

    if tokens.len() < 3 {
        return Err(reject(RowErrorKind::MissingColumns));
    }

    let jurisdiction = tokens[0].trim().to_uppercase();
    if jurisdiction.is_empty() {
        return Err(reject(RowErrorKind::MissingJurisdiction));
    }

    let miles = parse_amount(tokens[1]).ok_or_else(|| reject(RowErrorKind::InvalidMiles))?;
    let quantity =
        parse_amount(tokens[2]).ok_or_else(|| reject(RowErrorKind::InvalidQuantity))?;

    let date = tokens
        .get(3)
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(TripRow {
        jurisdiction,
        miles,
        quantity,
        source_line: line_number,
        date,
    })
}

/// Parses a non-negative, finite decimal amount.
///
/// `"inf"` and `"NaN"` parse as `f64` but are not amounts, so they are
/// rejected here along with negatives.
fn parse_amount(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(batch: &ParsedBatch) -> Vec<String> {
        batch.errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_empty_input_is_a_reset() {
        assert!(parse("").is_empty());
        assert!(parse("  \n\t\r\n  ").is_empty());
    }

    #[test]
    fn test_basic_rows() {
        let batch = parse("TX,1200,130\nON,500,190");
        assert!(batch.errors.is_empty());
        assert_eq!(batch.rows.len(), 2);

        let tx = &batch.rows[0];
        assert_eq!(tx.jurisdiction, "TX");
        assert_eq!(tx.miles, 1200.0);
        assert_eq!(tx.quantity, 130.0);
        assert_eq!(tx.source_line, 1);
        assert_eq!(tx.date, None);

        assert_eq!(batch.rows[1].source_line, 2);
    }

    #[test]
    fn test_crlf_and_tabs() {
        let batch = parse("tx\t1200\t130\r\non,500,190\r\n");
        assert!(batch.errors.is_empty());
        assert_eq!(batch.rows[0].jurisdiction, "TX");
        assert_eq!(batch.rows[1].jurisdiction, "ON");
        assert_eq!(batch.rows[1].quantity, 190.0);
    }

    #[test]
    fn test_mixed_delimiters_in_one_line() {
        let batch = parse("TX,1200\t130");
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].quantity, 130.0);
    }

    #[test]
    fn test_whitespace_around_tokens() {
        let batch = parse("  tx , 1200 ,  130 , 2025-07-12 ");
        let row = &batch.rows[0];
        assert_eq!(row.jurisdiction, "TX");
        assert_eq!(row.miles, 1200.0);
        assert_eq!(row.date.as_deref(), Some("2025-07-12"));
    }

    #[test]
    fn test_date_is_not_validated() {
        let batch = parse("TX,10,1,not-a-date");
        assert!(batch.errors.is_empty());
        assert_eq!(batch.rows[0].date.as_deref(), Some("not-a-date"));
    }

    #[test]
    fn test_missing_columns() {
        let batch = parse("TX,1200");
        assert!(batch.rows.is_empty());
        assert_eq!(
            messages(&batch),
            vec!["Row 1: Missing required columns (jurisdiction, miles, quantity)"]
        );
    }

    #[test]
    fn test_missing_jurisdiction() {
        let batch = parse(" ,1200,130");
        assert_eq!(messages(&batch), vec!["Row 1: Missing jurisdiction"]);
    }

    #[test]
    fn test_invalid_miles() {
        // Scenario: non-numeric miles drop the row.
        let batch = parse("TX,abc,10");
        assert!(batch.rows.is_empty());
        assert_eq!(messages(&batch), vec!["Row 1: Invalid miles value"]);

        assert_eq!(messages(&parse("TX,-5,10")), vec!["Row 1: Invalid miles value"]);
        assert_eq!(messages(&parse("TX,,10")), vec!["Row 1: Invalid miles value"]);
        assert_eq!(messages(&parse("TX,inf,10")), vec!["Row 1: Invalid miles value"]);
        assert_eq!(messages(&parse("TX,NaN,10")), vec!["Row 1: Invalid miles value"]);
    }

    #[test]
    fn test_invalid_quantity() {
        assert_eq!(messages(&parse("TX,10,-1")), vec!["Row 1: Invalid quantity value"]);
        assert_eq!(messages(&parse("TX,10,x")), vec!["Row 1: Invalid quantity value"]);
    }

    #[test]
    fn test_miles_checked_before_quantity() {
        assert_eq!(messages(&parse("TX,x,y")), vec!["Row 1: Invalid miles value"]);
    }

    #[test]
    fn test_zero_values_are_valid() {
        let batch = parse("OR,0,0");
        assert!(batch.errors.is_empty());
        assert_eq!(batch.rows[0].miles, 0.0);
    }

    #[test]
    fn test_decimal_and_exponent_amounts() {
        let batch = parse("TX,12.5,1e2");
        assert_eq!(batch.rows[0].miles, 12.5);
        assert_eq!(batch.rows[0].quantity, 100.0);
    }

    #[test]
    fn test_blank_lines_keep_physical_numbering() {
        let batch = parse("TX,100,10\n\n   \nTX,abc,10\nON,5,5");
        assert_eq!(messages(&batch), vec!["Row 4: Invalid miles value"]);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[1].source_line, 5);
    }

    #[test]
    fn test_errors_do_not_stop_processing() {
        let text = "bad\nTX,1,1\n,1,1\nTX,1,-1\nQC,2,2";
        let batch = parse(text);

        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[0].source_line, 2);
        assert_eq!(batch.rows[1].source_line, 5);
        assert_eq!(
            messages(&batch),
            vec![
                "Row 1: Missing required columns (jurisdiction, miles, quantity)",
                "Row 3: Missing jurisdiction",
                "Row 4: Invalid quantity value",
            ]
        );
    }

    #[test]
    fn test_extra_columns_ignored() {
        let batch = parse("TX,1,1,2025-01-01,extra,columns");
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].date.as_deref(), Some("2025-01-01"));
    }
}
