//! # ifta-core: Pure Calculation Logic for IFTA QuickCalc
//!
//! This crate is the **heart** of IFTA QuickCalc. It turns pasted or uploaded
//! trip data into fuel-tax estimates as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      IFTA QuickCalc Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (external)                          │   │
//! │  │    Quarter select ──► Paste/Upload ──► Preview ──► Results      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /api/calculate, /api/rates/{quarter}, /api/quarters          │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────┐  ┌────────────▼────────────────────┐  │
//! │  │  ifta-rates                 │  │  ★ ifta-core (THIS CRATE) ★     │  │
//! │  │  live fetch, timeout,       │  │                                 │  │
//! │  │  fallback, cache            │──►  parser ──► engine ──► result   │  │
//! │  └─────────────────────────────┘  │  rates (fallback), types        │  │
//! │                                   └─────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//! raw text ──► parser::parse ──► (rows, errors)
//!                                    │
//!             RateTable ─────────────┤
//!             AccessTier::row_cap ───┤
//!                                    ▼
//!                           engine::aggregate ──► Aggregation
//! ```
//!
//! ## Quick Start
//! ```rust
//! use ifta_core::{calculate, AccessTier, RateTable};
//!
//! let rates = RateTable::fallback("2025-Q3".into());
//! let calc = calculate("TX,1200,130\nON,500,190", AccessTier::AuthenticatedPaid, &rates);
//!
//! assert!(calc.errors.is_empty());
//! assert_eq!(calc.aggregation.result.total_miles, 1700.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod parser;
pub mod rates;
pub mod types;
pub mod units;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{
    aggregate, Aggregation, CapAdvisory, ClassifiedRow, JurisdictionSummary, RowStatus,
};
pub use error::{CoreError, CoreResult, RowError, RowErrorKind};
pub use parser::{parse, ParsedBatch};
pub use rates::RateTable;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Rows processed for tiers without a paid marker.
///
/// ## Business Reason
/// Enough to preview how the calculator works on real data without giving
/// away a full quarterly report.
pub const FREE_ROW_LIMIT: usize = 2;

/// Reporting quarters offered by the calculator.
pub const SUPPORTED_QUARTERS: [&str; 4] = ["2025-Q1", "2025-Q2", "2025-Q3", "2025-Q4"];

/// Quarter selected when the caller does not pick one.
pub const DEFAULT_QUARTER: &str = "2025-Q3";

// =============================================================================
// Pure Entry Point
// =============================================================================

/// Output of a full calculation pass.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    /// Row-scoped diagnostics from the parser, in line order.
    pub errors: Vec<RowError>,

    /// Aggregate result and row classification.
    pub aggregation: Aggregation,
}

impl Calculation {
    /// Diagnostic messages as shown to the user ("Row N: ...").
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Parses `text` and aggregates it against `rates` under the `tier` cap.
///
/// The surrounding application calls this on every input change (new text,
/// new quarter, new rate table, new tier). Nothing is cached between calls:
/// the same inputs always produce the same `Calculation`.
pub fn calculate(text: &str, tier: AccessTier, rates: &RateTable) -> Calculation {
    let batch = parse(text);
    let aggregation = aggregate(&batch.rows, rates, tier.row_cap()).with_tier_wording(tier);

    Calculation {
        errors: batch.errors,
        aggregation,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
