// ── Wire row → domain record conversion ──
//
// Rows arrive from plateful-api exactly as the store serialized them.
// Everything converted here is server-confirmed, so `optimistic` is
// always false on this path.

use plateful_api::{CategoryRow, ContentRow, ProductRow};

use crate::model::{Category, ContentEntry, Product, Record};

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id.into(),
            restaurant_id: row.restaurant_id.into(),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            sort_order: row.sort_order,
            item_count: row.item_count,
            optimistic: false,
        }
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id.into(),
            restaurant_id: row.restaurant_id.into(),
            category_id: row.category_id.into(),
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            image_url: row.image_url,
            available: row.available,
            sort_order: row.sort_order,
            optimistic: false,
        }
    }
}

impl From<ContentRow> for ContentEntry {
    fn from(row: ContentRow) -> Self {
        Self {
            id: row.id.into(),
            restaurant_id: row.restaurant_id.into(),
            slot: row.slot,
            title: row.title,
            body: row.body,
            image_url: row.image_url,
            sort_order: row.sort_order,
            optimistic: false,
        }
    }
}

pub(crate) fn category_records(rows: Vec<CategoryRow>) -> Vec<Record> {
    rows.into_iter().map(|r| Category::from(r).into()).collect()
}

pub(crate) fn product_records(rows: Vec<ProductRow>) -> Vec<Record> {
    rows.into_iter().map(|r| Product::from(r).into()).collect()
}

pub(crate) fn content_records(rows: Vec<ContentRow>) -> Vec<Record> {
    rows.into_iter()
        .map(|r| ContentEntry::from(r).into())
        .collect()
}
