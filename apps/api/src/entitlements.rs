//! # Entitlement Store
//!
//! Paid markers per authenticated user.
//!
//! Payments and sign-in are handled by external collaborators. This store
//! only answers one question for the calculator: when (if ever) did this
//! user pay?
//!
//! ## File Format
//! Written by the payment collaborator, read at startup:
//! ```toml
//! [[paid]]
//! user_id = "550e8400-e29b-41d4-a716-446655440000"
//! paid_at = "2025-07-14T16:02:11Z"
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use ifta_core::AccessTier;

/// Failure to read the entitlements file.
#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("Failed to read entitlements file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse entitlements file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidMarker {
    pub user_id: Uuid,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct EntitlementFile {
    #[serde(default)]
    paid: Vec<PaidMarker>,
}

/// In-memory map of user → paid_at.
#[derive(Debug, Default)]
pub struct EntitlementStore {
    paid: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl EntitlementStore {
    /// Creates an empty store (nobody has paid).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from markers. The earliest marker per user wins.
    pub fn from_markers(markers: impl IntoIterator<Item = PaidMarker>) -> Self {
        let mut paid: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
        for marker in markers {
            paid.entry(marker.user_id)
                .and_modify(|at| *at = (*at).min(marker.paid_at))
                .or_insert(marker.paid_at);
        }

        Self {
            paid: RwLock::new(paid),
        }
    }

    /// Loads markers from a TOML file.
    pub fn load(path: &Path) -> Result<Self, EntitlementError> {
        let contents = std::fs::read_to_string(path)?;
        let store = Self::parse(&contents)?;
        info!(?path, "Loaded entitlements");
        Ok(store)
    }

    fn parse(contents: &str) -> Result<Self, EntitlementError> {
        let file: EntitlementFile = toml::from_str(contents)?;
        Ok(Self::from_markers(file.paid))
    }

    /// When `user` paid, if they did.
    pub async fn paid_at(&self, user: &Uuid) -> Option<DateTime<Utc>> {
        self.paid.read().await.get(user).copied()
    }

    /// Records a payment. An existing marker is kept; returns the effective
    /// timestamp.
    pub async fn mark_paid(&self, user: Uuid, at: DateTime<Utc>) -> DateTime<Utc> {
        let mut paid = self.paid.write().await;
        let effective = *paid.entry(user).or_insert(at);
        debug!(%user, paid_at = %effective, "Paid marker recorded");
        effective
    }

    /// Derives the caller's tier from an optional identity.
    pub async fn tier_for(&self, user: Option<&Uuid>) -> AccessTier {
        match user {
            None => AccessTier::Anonymous,
            Some(id) => AccessTier::from_marker(true, self.paid_at(id).await),
        }
    }

    /// Number of paid users.
    pub async fn len(&self) -> usize {
        self.paid.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.paid.read().await.is_empty()
    }
}
