//! API server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                 | Default                          |
//! |--------------------------|----------------------------------|
//! | `IFTA_PORT`              | `8080`                           |
//! | `IFTA_BIND_ADDR`         | `0.0.0.0`                        |
//! | `IFTA_QUARTERS`          | `2025-Q1,2025-Q2,2025-Q3,2025-Q4`|
//! | `IFTA_DEFAULT_QUARTER`   | `2025-Q3`                        |
//! | `IFTA_RATES_CONFIG`      | platform `rates.toml`            |
//! | `IFTA_ENTITLEMENTS_FILE` | none (no paid users)             |
//! | `IFTA_MAX_INPUT_BYTES`   | `1048576`                        |

use std::env;
use std::path::PathBuf;

use ifta_core::{Quarter, DEFAULT_QUARTER, SUPPORTED_QUARTERS};

/// API server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// Quarters offered to callers, in display order
    pub quarters: Vec<Quarter>,

    /// Quarter used when a request does not name one
    pub default_quarter: Quarter,

    /// Explicit rates.toml path (None = platform config dir)
    pub rates_config: Option<PathBuf>,

    /// TOML file of paid markers
    pub entitlements_file: Option<PathBuf>,

    /// Largest accepted input text in bytes
    pub max_input_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: 8080,
            bind_addr: "0.0.0.0".to_string(),
            quarters: SUPPORTED_QUARTERS.iter().map(|q| Quarter::from(*q)).collect(),
            default_quarter: Quarter::from(DEFAULT_QUARTER),
            rates_config: None,
            entitlements_file: None,
            max_input_bytes: 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            port: match lookup("IFTA_PORT") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("IFTA_PORT".to_string()))?,
                None => defaults.port,
            },

            bind_addr: lookup("IFTA_BIND_ADDR").unwrap_or(defaults.bind_addr),

            quarters: match lookup("IFTA_QUARTERS") {
                Some(list) => list
                    .split(',')
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .map(Quarter::from)
                    .collect(),
                None => defaults.quarters,
            },

            default_quarter: lookup("IFTA_DEFAULT_QUARTER")
                .map(Quarter::from)
                .unwrap_or(defaults.default_quarter),

            rates_config: lookup("IFTA_RATES_CONFIG").map(PathBuf::from),

            entitlements_file: lookup("IFTA_ENTITLEMENTS_FILE").map(PathBuf::from),

            max_input_bytes: match lookup("IFTA_MAX_INPUT_BYTES") {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("IFTA_MAX_INPUT_BYTES".to_string()))?,
                None => defaults.max_input_bytes,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quarters.is_empty() {
            return Err(ConfigError::MissingRequired("IFTA_QUARTERS".to_string()));
        }

        if !self.supports(&self.default_quarter) {
            return Err(ConfigError::DefaultQuarterNotOffered(
                self.default_quarter.to_string(),
            ));
        }

        if self.max_input_bytes == 0 {
            return Err(ConfigError::InvalidValue("IFTA_MAX_INPUT_BYTES".to_string()));
        }

        Ok(())
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Returns true if `quarter` is offered.
    pub fn supports(&self, quarter: &Quarter) -> bool {
        self.quarters.contains(quarter)
    }

    /// Request body limit: JSON escaping can double the text, plus envelope.
    pub fn max_body_bytes(&self) -> usize {
        self.max_input_bytes
            .saturating_mul(2)
            .saturating_add(64 * 1024)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Default quarter {0} is not in the offered quarters")]
    DefaultQuarterNotOffered(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.quarters.len(), 4);
        assert_eq!(config.default_quarter.as_str(), "2025-Q3");
        assert_eq!(config.max_input_bytes, 1_048_576);
        assert!(config.entitlements_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("IFTA_PORT", "9000"),
            ("IFTA_BIND_ADDR", "127.0.0.1"),
            ("IFTA_QUARTERS", "2026-Q1, 2026-Q2"),
            ("IFTA_DEFAULT_QUARTER", "2026-Q2"),
            ("IFTA_ENTITLEMENTS_FILE", "/etc/ifta/paid.toml"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(
            config.quarters,
            vec![Quarter::from("2026-Q1"), Quarter::from("2026-Q2")]
        );
        assert!(config.supports(&Quarter::from("2026-Q2")));
        assert!(!config.supports(&Quarter::from("2025-Q3")));
        assert_eq!(
            config.entitlements_file,
            Some(PathBuf::from("/etc/ifta/paid.toml"))
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("IFTA_PORT", "http")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            load(&[("IFTA_MAX_INPUT_BYTES", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            load(&[("IFTA_QUARTERS", " , ")]),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_default_quarter_must_be_offered() {
        let err = load(&[("IFTA_DEFAULT_QUARTER", "2024-Q4")]).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultQuarterNotOffered(_)));
    }

    #[test]
    fn test_body_limit_covers_escaped_input() {
        let config = ApiConfig::default();
        assert!(config.max_body_bytes() > config.max_input_bytes * 2);
    }
}
