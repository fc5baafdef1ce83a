//! # Units Module
//!
//! Fuel volume normalization.
//!
//! ## Why Normalize?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MIXED UNITS IN ONE REPORT                                              │
//! │                                                                         │
//! │  Drivers record fuel in whatever unit the pump shows:                   │
//! │    TX pump: 130 gallons                                                 │
//! │    ON pump: 190 liters                                                  │
//! │                                                                         │
//! │  IFTA rates are per US gallon, so every quantity is converted          │
//! │  before it is summed or taxed:                                          │
//! │    190 L × 0.264172 = 50.19268 gal                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ifta_core::units::{to_gallons, FuelUnit};
//!
//! assert_eq!(FuelUnit::for_jurisdiction("TX"), FuelUnit::Gallons);
//! assert_eq!(FuelUnit::for_jurisdiction("ON"), FuelUnit::Liters);
//! assert_eq!(to_gallons("TX", 130.0), 130.0);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Constants
// =============================================================================

/// US gallons per liter.
pub const GALLONS_PER_LITER: f64 = 0.264172;

/// The ten Canadian provinces, whose fuel quantities are recorded in liters.
pub const PROVINCE_CODES: [&str; 10] = ["AB", "BC", "MB", "NB", "NL", "NS", "ON", "PE", "QC", "SK"];

/// Returns true if `code` is one of the ten Canadian provinces.
#[inline]
pub fn is_canadian_province(code: &str) -> bool {
    PROVINCE_CODES.contains(&code)
}

// =============================================================================
// Fuel Unit
// =============================================================================

/// Native unit of a jurisdiction's fuel quantity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FuelUnit {
    /// US gallons (US states and DC).
    Gallons,
    /// Liters (Canadian provinces).
    Liters,
}

impl FuelUnit {
    /// Unit used by `jurisdiction` (an uppercase code).
    pub fn for_jurisdiction(jurisdiction: &str) -> Self {
        if is_canadian_province(jurisdiction) {
            FuelUnit::Liters
        } else {
            FuelUnit::Gallons
        }
    }

    /// Converts `quantity` of this unit to US gallons.
    #[inline]
    pub fn to_gallons(&self, quantity: f64) -> f64 {
        match self {
            FuelUnit::Gallons => quantity,
            FuelUnit::Liters => quantity * GALLONS_PER_LITER,
        }
    }
}

/// Normalizes a quantity recorded in `jurisdiction` to US gallons.
#[inline]
pub fn to_gallons(jurisdiction: &str, quantity: f64) -> f64 {
    FuelUnit::for_jurisdiction(jurisdiction).to_gallons(quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_province_uses_liters() {
        for code in PROVINCE_CODES {
            assert_eq!(FuelUnit::for_jurisdiction(code), FuelUnit::Liters, "{code}");
        }
    }

    #[test]
    fn test_us_and_dc_use_gallons() {
        for code in ["TX", "OR", "DC", "WA", "ZZ"] {
            assert_eq!(FuelUnit::for_jurisdiction(code), FuelUnit::Gallons, "{code}");
        }
    }

    #[test]
    fn test_liters_conversion() {
        let gallons = to_gallons("ON", 190.0);
        assert!((gallons - 50.19268).abs() < 1e-9);
    }

    #[test]
    fn test_lowercase_is_not_a_province() {
        // Codes are uppercased by the parser before they get here.
        assert!(!is_canadian_province("on"));
    }
}
