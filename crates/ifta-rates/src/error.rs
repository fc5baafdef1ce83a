//! # Rate Provider Error Types
//!
//! Error types for rate table loading.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Rates Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  MalformedPayload       │ │
//! │  │  InvalidUrl     │  │  Server         │  │  QuarterMismatch        │ │
//! │  │  ConfigLoad     │  │  Timeout        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  None of these reach the calculation: the provider recovers every      │
//! │  fetch failure with the built-in table and a warning.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for rate operations.
pub type RatesResult<T> = Result<T, RatesError>;

/// Errors raised while configuring or fetching rate tables.
#[derive(Debug, Error)]
pub enum RatesError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid provider configuration.
    #[error("Invalid rates configuration: {0}")]
    InvalidConfig(String),

    /// Invalid source URL template.
    #[error("Invalid rates URL: {0}")]
    InvalidUrl(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load rates config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The HTTP request itself failed (connect, TLS, body read).
    #[error("Rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status.
    #[error("Rate source returned {status}: {body}")]
    Server { status: u16, body: String },

    /// No answer within the configured timeout.
    #[error("Rate source timed out after {0} ms")]
    Timeout(u64),

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// The body was not a usable rate table.
    #[error("Malformed rate payload: {0}")]
    MalformedPayload(String),

    /// The source labelled its table with a different quarter.
    #[error("Rate source returned {actual} for requested {expected}")]
    QuarterMismatch { expected: String, actual: String },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for RatesError {
    fn from(err: serde_json::Error) -> Self {
        RatesError::MalformedPayload(err.to_string())
    }
}

impl From<ifta_core::CoreError> for RatesError {
    fn from(err: ifta_core::CoreError) -> Self {
        RatesError::MalformedPayload(err.to_string())
    }
}

impl From<url::ParseError> for RatesError {
    fn from(err: url::ParseError) -> Self {
        RatesError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for RatesError {
    fn from(err: std::io::Error) -> Self {
        RatesError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for RatesError {
    fn from(err: toml::de::Error) -> Self {
        RatesError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl RatesError {
    /// Returns true if a later attempt may succeed.
    ///
    /// ## Retryable Errors
    /// - Transport failures and timeouts
    /// - 5xx and 429 responses
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Malformed payloads (the source has to be fixed)
    pub fn is_retryable(&self) -> bool {
        match self {
            RatesError::Http(_) | RatesError::Timeout(_) => true,
            RatesError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RatesError::InvalidConfig(_)
                | RatesError::InvalidUrl(_)
                | RatesError::ConfigLoadFailed(_)
        )
    }
}
