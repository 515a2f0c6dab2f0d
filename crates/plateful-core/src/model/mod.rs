// ── Domain model ──
//
// Canonical types for the three cached collections. The id newtypes
// unify server-assigned ids and temporary optimistic ids behind a single
// interface; everything above the convert layer works in these terms.

mod record;

pub use record::{Category, ContentEntry, Product, Record};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ── Resource ────────────────────────────────────────────────────────

/// The three remote collections the dashboard manages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Categories,
    Products,
    Content,
}

// ── RecordId ────────────────────────────────────────────────────────

/// Monotonic counter backing temporary ids. Process-wide so two rapid
/// optimistic creates can never collide, unlike timestamp-based schemes.
static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(1);

const TEMP_PREFIX: &str = "temp-";

/// Identifier for any record in a cached collection.
///
/// Either a server-assigned id, or a temporary `temp-<n>` id carried by an
/// optimistic item until reconciliation replaces it with the real row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Mint a fresh temporary id for an optimistic item.
    pub fn temporary() -> Self {
        let token = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!("{TEMP_PREFIX}{token}"))
    }

    /// Returns `true` if this id was minted locally and has not yet been
    /// replaced by a server-assigned id.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── RestaurantId ────────────────────────────────────────────────────

/// The owning tenant for every cached collection and every remote call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(String);

impl RestaurantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RestaurantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RestaurantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
