// ── Cached records ──
//
// One domain type per remote collection, plus the `Record` enum that lets
// the cache and the optimistic transforms stay resource-agnostic. A record
// with `optimistic = true` always carries a temporary id: it exists only
// between an optimistic create and the reconciling refetch.

use serde::{Deserialize, Serialize};

use super::{RecordId, Resource, RestaurantId};

/// A menu category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i64,
    /// Derived count of products in this category. Adjusted optimistically
    /// by product mutations, authoritative after reconciliation.
    pub item_count: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optimistic: bool,
}

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub restaurant_id: RestaurantId,
    pub category_id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub available: bool,
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optimistic: bool,
}

/// A promotional content / theme settings entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub id: RecordId,
    pub restaurant_id: RestaurantId,
    /// Dashboard surface this entry fills (e.g. `hero_banner`, `theme`).
    pub slot: String,
    pub title: String,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optimistic: bool,
}

/// Uniform view over the three record types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Category(Category),
    Product(Product),
    Content(ContentEntry),
}

impl Record {
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Category(c) => &c.id,
            Self::Product(p) => &p.id,
            Self::Content(e) => &e.id,
        }
    }

    pub fn resource(&self) -> Resource {
        match self {
            Self::Category(_) => Resource::Categories,
            Self::Product(_) => Resource::Products,
            Self::Content(_) => Resource::Content,
        }
    }

    pub fn sort_order(&self) -> i64 {
        match self {
            Self::Category(c) => c.sort_order,
            Self::Product(p) => p.sort_order,
            Self::Content(e) => e.sort_order,
        }
    }

    pub fn set_sort_order(&mut self, sort_order: i64) {
        match self {
            Self::Category(c) => c.sort_order = sort_order,
            Self::Product(p) => p.sort_order = sort_order,
            Self::Content(e) => e.sort_order = sort_order,
        }
    }

    /// Returns `true` for locally-minted items awaiting reconciliation.
    pub fn optimistic(&self) -> bool {
        match self {
            Self::Category(c) => c.optimistic,
            Self::Product(p) => p.optimistic,
            Self::Content(e) => e.optimistic,
        }
    }

    pub fn as_category(&self) -> Option<&Category> {
        match self {
            Self::Category(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_product(&self) -> Option<&Product> {
        match self {
            Self::Product(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&ContentEntry> {
        match self {
            Self::Content(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Category> for Record {
    fn from(c: Category) -> Self {
        Self::Category(c)
    }
}

impl From<Product> for Record {
    fn from(p: Product) -> Self {
        Self::Product(p)
    }
}

impl From<ContentEntry> for Record {
    fn from(e: ContentEntry) -> Self {
        Self::Content(e)
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}
