//! # ifta-rates: Rate Table Provider for IFTA QuickCalc
//!
//! This crate supplies the per-quarter jurisdiction rate table to the
//! calculator. It is the only crate that talks to the network on behalf of
//! a calculation.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Rate Provider Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    RateProvider (provider.rs)                    │  │
//! │  │                                                                  │  │
//! │  │  get_rates(quarter) ──► RateFetch::{Live, Builtin, Fallback}     │  │
//! │  │  Bounded by a timeout, cached per quarter with a TTL             │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┴─────────────────────┐                  │
//! │         ▼                                           ▼                   │
//! │  ┌────────────────────────┐              ┌────────────────────────┐    │
//! │  │ dyn RateSource         │              │ ifta_core::RateTable   │    │
//! │  │ (source.rs)            │              │ ::fallback             │    │
//! │  │                        │              │                        │    │
//! │  │ HttpRateSource: GET    │              │ Compiled-in table,     │    │
//! │  │ {quarter} template     │              │ always available       │    │
//! │  └────────────────────────┘              └────────────────────────┘    │
//! │                                                                         │
//! │  RatesConfig (config.rs): rates.toml + IFTA_RATES_* overrides          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ifta_rates::{RateProvider, RatesConfig};
//!
//! let config = RatesConfig::load_or_default(None);
//! let provider = RateProvider::from_config(&config)?;
//!
//! let fetch = provider.get_rates(&"2025-Q3".into()).await;
//! if let Some(warning) = fetch.warning() {
//!     eprintln!("{warning}");
//! }
//! let calc = ifta_core::calculate(text, tier, fetch.table());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod provider;
pub mod source;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{CacheSettings, RatesConfig, SourceSettings};
pub use error::{RatesError, RatesResult};
pub use provider::{RateFetch, RateOrigin, RateProvider, FALLBACK_WARNING};
pub use source::{HttpRateSource, RateSource};
