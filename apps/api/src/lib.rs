//! # IFTA QuickCalc API
//!
//! HTTP service that binds the pure calculator to callers.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Components                                 │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  routes        │  │  identity      │  │  entitlements              ││
//! │  │                │  │                │  │                            ││
//! │  │ • health       │  │ • x-user-id    │  │ • user → paid_at           ││
//! │  │ • quarters     │  │   header       │  │ • tier derivation          ││
//! │  │ • rates        │  │ • Caller       │  │ • TOML file of markers     ││
//! │  │ • calculate    │  │   extractor    │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Collaborators                                │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  ifta-core   │  │  ifta-rates  │  │  Auth / payments         ││  │
//! │  │  │              │  │              │  │  (external)              ││  │
//! │  │  │ parse +      │  │ live rates,  │  │  gateway sets x-user-id, ││  │
//! │  │  │ aggregate    │  │ fallback     │  │  writes paid markers     ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables, see [`config`]. Rate source settings come from
//! `rates.toml` and `IFTA_RATES_*` (see `ifta_rates::RatesConfig`).

pub mod config;
pub mod entitlements;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

// Re-exports
pub use config::{ApiConfig, ConfigError};
pub use entitlements::{EntitlementError, EntitlementStore, PaidMarker};
pub use error::{ApiError, ErrorCode};
pub use identity::Caller;
pub use routes::router;
pub use state::{AppState, SharedState};
