//! # Shared Application State
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  Router::with_state(Arc<AppState>)                                      │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │  ApiConfig   │  │ RateProvider │  │ EntitlementStore │              │
//! │  │              │  │              │  │                  │              │
//! │  │  quarters,   │  │  RwLock'd    │  │  RwLock'd        │              │
//! │  │  limits      │  │  rate cache  │  │  paid markers    │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • ApiConfig: Read-only after initialization                           │
//! │  • RateProvider / EntitlementStore: internal tokio RwLock              │
//! │  • Calculation itself: pure, no shared state                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use ifta_core::Quarter;
use ifta_rates::RateProvider;

use crate::config::ApiConfig;
use crate::entitlements::EntitlementStore;
use crate::error::ApiError;

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    pub config: ApiConfig,
    pub rates: RateProvider,
    pub entitlements: EntitlementStore,
}

/// Handle passed to axum.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ApiConfig, rates: RateProvider, entitlements: EntitlementStore) -> Self {
        Self {
            config,
            rates,
            entitlements,
        }
    }

    /// Resolves a requested quarter, defaulting when absent or blank.
    pub fn resolve_quarter(&self, requested: Option<&str>) -> Result<Quarter, ApiError> {
        let quarter = match requested.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => Quarter::from(q),
            None => return Ok(self.config.default_quarter.clone()),
        };

        if self.config.supports(&quarter) {
            Ok(quarter)
        } else {
            Err(ApiError::unknown_quarter(quarter.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(
            ApiConfig::default(),
            RateProvider::builtin(),
            EntitlementStore::new(),
        )
    }

    #[test]
    fn test_resolve_quarter() {
        let state = state();
        assert_eq!(state.resolve_quarter(None).unwrap().as_str(), "2025-Q3");
        assert_eq!(state.resolve_quarter(Some("  ")).unwrap().as_str(), "2025-Q3");
        assert_eq!(
            state.resolve_quarter(Some("2025-Q1")).unwrap().as_str(),
            "2025-Q1"
        );
        assert!(state.resolve_quarter(Some("2019-Q1")).is_err());
    }
}
