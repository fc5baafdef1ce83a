//! # Rates Configuration
//!
//! Configuration for the live rate source and the per-quarter cache.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     IFTA_RATES_URL=https://rates.example.com/ifta/{quarter}.json       │
//! │     IFTA_RATES_TIMEOUT_SECS=5                                          │
//! │     IFTA_RATES_CACHE_TTL_SECS=3600                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/ifta-quickcalc/rates.toml (Linux)                        │
//! │     ~/Library/Application Support/com.ifta.quickcalc/rates.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no live source (built-in table only), 5s timeout, 1h cache         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # rates.toml
//! [source]
//! url = "https://rates.example.com/ifta/{quarter}.json"
//! timeout_secs = 5
//!
//! [cache]
//! ttl_secs = 3600  # 0 disables caching
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{RatesError, RatesResult};

/// Placeholder replaced with the quarter tag in the source URL.
pub const QUARTER_PLACEHOLDER: &str = "{quarter}";

// =============================================================================
// Source Settings
// =============================================================================

/// Where live rates come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// URL template containing `{quarter}`.
    /// `None` means the built-in table is used without a network call.
    #[serde(default)]
    pub url: Option<String>,

    /// Upper bound on a single fetch (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// How long a live table is reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Time-to-live of a cached live table (seconds). 0 disables the cache.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            ttl_secs: default_ttl_secs(),
        }
    }
}

// =============================================================================
// Main Rates Configuration
// =============================================================================

/// Complete rate provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatesConfig {
    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl RatesConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (rates.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RatesResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading rates config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else if explicit {
                return Err(RatesError::ConfigLoadFailed(format!(
                    "config file not found: {}",
                    path.display()
                )));
            } else {
                debug!(?path, "Rates config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load rates config: {}. Using built-in rates only.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RatesResult<()> {
        if let Some(ref template) = self.source.url {
            validate_url_template(template)?;
        }

        if self.source.timeout_secs == 0 {
            return Err(RatesError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the process environment in
    /// production).
    ///
    /// An empty `IFTA_RATES_URL` disables the live source.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("IFTA_RATES_URL") {
            let url = url.trim();
            if url.is_empty() {
                debug!("Live rate source disabled from environment");
                self.source.url = None;
            } else {
                debug!(url = %url, "Overriding rates URL from environment");
                self.source.url = Some(url.to_string());
            }
        }

        if let Some(secs) = lookup("IFTA_RATES_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(s) => self.source.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid IFTA_RATES_TIMEOUT_SECS"),
            }
        }

        if let Some(secs) = lookup("IFTA_RATES_CACHE_TTL_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(s) => self.cache.ttl_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid IFTA_RATES_CACHE_TTL_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ifta", "quickcalc")
            .map(|dirs| dirs.config_dir().join("rates.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the source URL template if configured.
    pub fn source_url(&self) -> Option<&str> {
        self.source.url.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

/// Checks that `template` is an http(s) URL containing `{quarter}`.
pub fn validate_url_template(template: &str) -> RatesResult<()> {
    if !template.contains(QUARTER_PLACEHOLDER) {
        return Err(RatesError::InvalidUrl(format!(
            "Rates URL must contain {}, got: {}",
            QUARTER_PLACEHOLDER, template
        )));
    }

    let sample = template.replace(QUARTER_PLACEHOLDER, "2025-Q1");
    let parsed = url::Url::parse(&sample)?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(RatesError::InvalidUrl(format!(
            "Rates URL must use http:// or https://, got: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RatesConfig::default();
        assert_eq!(config.source_url(), None);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing() {
        let config: RatesConfig = toml::from_str(
            r#"
            [source]
            url = "https://rates.example.com/ifta/{quarter}.json"
            timeout_secs = 2

            [cache]
            ttl_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(
            config.source_url(),
            Some("https://rates.example.com/ifta/{quarter}.json")
        );
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.cache_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RatesConfig = toml::from_str("[cache]\nttl_secs = 60\n").unwrap();
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url_template("https://x.example/{quarter}").is_ok());
        assert!(validate_url_template("http://127.0.0.1:9000/rates/{quarter}").is_ok());

        // Missing placeholder
        assert!(validate_url_template("https://x.example/rates").is_err());
        // Wrong scheme
        assert!(validate_url_template("ftp://x.example/{quarter}").is_err());
        // Not a URL
        assert!(validate_url_template("{quarter}").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = RatesConfig::default();
        config.source.timeout_secs = 0;
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RatesConfig::default();
        config.apply_overrides(env(&[
            ("IFTA_RATES_URL", "https://r.example/{quarter}"),
            ("IFTA_RATES_TIMEOUT_SECS", "3"),
            ("IFTA_RATES_CACHE_TTL_SECS", "0"),
        ]));

        assert_eq!(config.source_url(), Some("https://r.example/{quarter}"));
        assert_eq!(config.source.timeout_secs, 3);
        assert_eq!(config.cache.ttl_secs, 0);
    }

    #[test]
    fn test_empty_env_url_disables_source() {
        let mut config = RatesConfig::default();
        config.source.url = Some("https://r.example/{quarter}".into());
        config.apply_overrides(env(&[("IFTA_RATES_URL", "  ")]));
        assert_eq!(config.source_url(), None);
    }

    #[test]
    fn test_invalid_env_numbers_ignored() {
        let mut config = RatesConfig::default();
        config.apply_overrides(env(&[("IFTA_RATES_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.source.timeout_secs, 5);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("ifta-rates-does-not-exist.toml");
        let err = RatesConfig::load(Some(path)).unwrap_err();
        assert!(err.is_config_error());
    }
}
