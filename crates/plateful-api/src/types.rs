// Wire-level row types returned by the remote data store.
//
// These mirror the store's table schemas verbatim (snake_case JSON).
// plateful-core converts them into domain records; nothing above the
// convert layer should touch a *Row type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A menu category row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub sort_order: i64,
    /// Derived count of products in this category, maintained server-side.
    #[serde(default)]
    pub item_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A product row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    pub sort_order: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A promotional content / theme settings row.
///
/// `slot` names the dashboard surface the entry fills (e.g. `hero_banner`,
/// `theme`); the dashboard treats the body as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRow {
    pub id: String,
    pub restaurant_id: String,
    pub slot: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub sort_order: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Error body shape produced by PostgREST-style stores.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

fn default_true() -> bool {
    true
}
