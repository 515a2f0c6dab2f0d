// ── Optimistic collection transforms ──
//
// Pure functions from collection to collection. The coordinator applies
// these inside the per-key critical section; nothing here touches the
// cache, the network, or the clock. Every transform is copy-on-write:
// the input slice is never mutated.

use tracing::trace;

use super::requests::{
    CreateCategoryRequest, CreateContentRequest, CreateProductRequest, UpdateCategoryRequest,
    UpdateContentRequest, UpdateProductRequest,
};
use crate::model::{Category, ContentEntry, Product, Record, RecordId, RestaurantId};

/// One speculative change to one cached collection.
///
/// A mutation expands into one or more ops, possibly across keys (the
/// cross-entity item-count adjustments); all ops of one mutation share a
/// snapshot/rollback unit.
#[derive(Debug, Clone)]
pub(crate) enum OptimisticOp {
    /// Insert a locally-minted record at the end of the collection.
    Insert(Record),
    /// Patch fields of an existing record in place (copy-on-write).
    Patch { id: RecordId, patch: Patch },
    /// Remove a record by id.
    Remove { id: RecordId },
    /// Remove every product belonging to a category (category-delete cascade).
    RemoveByCategory { category_id: RecordId },
    /// Rewrite `sort_order` to match the given id order. Ids not listed
    /// keep their relative order after the listed ones.
    Reorder { ordered_ids: Vec<RecordId> },
    /// Adjust a category's derived `item_count`, clamped at zero.
    AdjustItemCount { category_id: RecordId, delta: i64 },
}

/// Sparse field patch, one variant per record type.
#[derive(Debug, Clone)]
pub(crate) enum Patch {
    Category(UpdateCategoryRequest),
    Product(UpdateProductRequest),
    Content(UpdateContentRequest),
}

/// Apply one op, producing the next collection snapshot.
pub(crate) fn apply(records: &[Record], op: &OptimisticOp) -> Vec<Record> {
    match op {
        OptimisticOp::Insert(record) => {
            trace!(id = %record.id(), "optimistic insert");
            let mut next = records.to_vec();
            next.push(record.clone());
            next
        }
        OptimisticOp::Patch { id, patch } => records
            .iter()
            .map(|r| {
                if r.id() == id {
                    patched(r, patch)
                } else {
                    r.clone()
                }
            })
            .collect(),
        OptimisticOp::Remove { id } => records.iter().filter(|r| r.id() != id).cloned().collect(),
        OptimisticOp::RemoveByCategory { category_id } => records
            .iter()
            .filter(|r| r.as_product().is_none_or(|p| &p.category_id != category_id))
            .cloned()
            .collect(),
        OptimisticOp::Reorder { ordered_ids } => reorder(records, ordered_ids),
        OptimisticOp::AdjustItemCount { category_id, delta } => records
            .iter()
            .map(|r| match r.as_category() {
                Some(c) if &c.id == category_id => {
                    let mut c = c.clone();
                    c.item_count = (c.item_count + delta).max(0);
                    Record::Category(c)
                }
                _ => r.clone(),
            })
            .collect(),
    }
}

fn reorder(records: &[Record], ordered_ids: &[RecordId]) -> Vec<Record> {
    let position = |id: &RecordId| ordered_ids.iter().position(|o| o == id);

    let mut next = records.to_vec();
    // Listed ids first in list order, unlisted ones after in prior order.
    next.sort_by_key(|r| match position(r.id()) {
        Some(idx) => (0, idx, r.sort_order()),
        None => (1, 0, r.sort_order()),
    });
    let mut sort_order = 0i64;
    for record in &mut next {
        sort_order += 1;
        record.set_sort_order(sort_order);
    }
    next
}

fn patched(record: &Record, patch: &Patch) -> Record {
    match (record, patch) {
        (Record::Category(c), Patch::Category(p)) => {
            let mut c = c.clone();
            if let Some(name) = &p.name {
                c.name = name.clone();
            }
            if let Some(description) = &p.description {
                c.description = Some(description.clone());
            }
            if let Some(image_url) = &p.image_url {
                c.image_url = Some(image_url.clone());
            }
            Record::Category(c)
        }
        (Record::Product(r), Patch::Product(p)) => {
            let mut r = r.clone();
            if let Some(category_id) = &p.category_id {
                r.category_id = category_id.clone();
            }
            if let Some(name) = &p.name {
                r.name = name.clone();
            }
            if let Some(description) = &p.description {
                r.description = Some(description.clone());
            }
            if let Some(price_cents) = p.price_cents {
                r.price_cents = price_cents;
            }
            if let Some(image_url) = &p.image_url {
                r.image_url = Some(image_url.clone());
            }
            if let Some(available) = p.available {
                r.available = available;
            }
            Record::Product(r)
        }
        (Record::Content(e), Patch::Content(p)) => {
            let mut e = e.clone();
            if let Some(slot) = &p.slot {
                e.slot = slot.clone();
            }
            if let Some(title) = &p.title {
                e.title = title.clone();
            }
            if let Some(body) = &p.body {
                e.body = Some(body.clone());
            }
            if let Some(image_url) = &p.image_url {
                e.image_url = Some(image_url.clone());
            }
            Record::Content(e)
        }
        // Patch kind never mismatches the record kind for a given key;
        // if it somehow does, leave the record untouched.
        (other, _) => other.clone(),
    }
}

// ── Optimistic item builders ────────────────────────────────────────

fn next_sort_order(records: &[Record]) -> i64 {
    records.iter().map(Record::sort_order).max().unwrap_or(0) + 1
}

/// Build the speculative category a create shows before the server confirms.
pub(crate) fn speculative_category(
    restaurant: &RestaurantId,
    request: &CreateCategoryRequest,
    existing: &[Record],
) -> Category {
    Category {
        id: RecordId::temporary(),
        restaurant_id: restaurant.clone(),
        name: request.name.clone(),
        description: request.description.clone(),
        image_url: request.image_url.clone(),
        sort_order: next_sort_order(existing),
        item_count: 0,
        optimistic: true,
    }
}

pub(crate) fn speculative_product(
    restaurant: &RestaurantId,
    request: &CreateProductRequest,
    existing: &[Record],
) -> Product {
    Product {
        id: RecordId::temporary(),
        restaurant_id: restaurant.clone(),
        category_id: request.category_id.clone(),
        name: request.name.clone(),
        description: request.description.clone(),
        price_cents: request.price_cents,
        image_url: request.image_url.clone(),
        available: request.available,
        sort_order: next_sort_order(existing),
        optimistic: true,
    }
}

pub(crate) fn speculative_content(
    restaurant: &RestaurantId,
    request: &CreateContentRequest,
    existing: &[Record],
) -> ContentEntry {
    ContentEntry {
        id: RecordId::temporary(),
        restaurant_id: restaurant.clone(),
        slot: request.slot.clone(),
        title: request.title.clone(),
        body: request.body.clone(),
        image_url: request.image_url.clone(),
        sort_order: next_sort_order(existing),
        optimistic: true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tenant() -> RestaurantId {
        RestaurantId::from("r1")
    }

    fn category(id: &str, name: &str, sort_order: i64, item_count: i64) -> Record {
        Record::Category(Category {
            id: RecordId::from(id),
            restaurant_id: tenant(),
            name: name.into(),
            description: None,
            image_url: None,
            sort_order,
            item_count,
            optimistic: false,
        })
    }

    fn product(id: &str, category_id: &str, sort_order: i64) -> Record {
        Record::Product(Product {
            id: RecordId::from(id),
            restaurant_id: tenant(),
            category_id: RecordId::from(category_id),
            name: format!("product {id}"),
            description: None,
            price_cents: 500,
            image_url: None,
            available: true,
            sort_order,
            optimistic: false,
        })
    }

    #[test]
    fn insert_appends_without_touching_input() {
        let existing = vec![category("c1", "Starters", 1, 2)];
        let speculative = speculative_category(
            &tenant(),
            &CreateCategoryRequest {
                name: "Desserts".into(),
                description: None,
                image_url: None,
            },
            &existing,
        );

        assert!(speculative.id.is_temporary());
        assert!(speculative.optimistic);
        assert_eq!(speculative.sort_order, 2);

        let next = apply(&existing, &OptimisticOp::Insert(speculative.into()));
        assert_eq!(next.len(), 2);
        assert_eq!(existing.len(), 1);
    }

    #[test]
    fn patch_changes_only_named_fields() {
        let existing = vec![category("c1", "Starters", 1, 2)];
        let op = OptimisticOp::Patch {
            id: RecordId::from("c1"),
            patch: Patch::Category(UpdateCategoryRequest {
                name: Some("Small Plates".into()),
                ..UpdateCategoryRequest::default()
            }),
        };

        let next = apply(&existing, &op);
        let patched = next[0].as_category().unwrap();
        assert_eq!(patched.name, "Small Plates");
        assert_eq!(patched.item_count, 2);
        assert_eq!(patched.sort_order, 1);
    }

    #[test]
    fn remove_by_category_cascades_products_only() {
        let existing = vec![
            product("p1", "c1", 1),
            product("p2", "c2", 2),
            product("p3", "c1", 3),
        ];
        let next = apply(
            &existing,
            &OptimisticOp::RemoveByCategory {
                category_id: RecordId::from("c1"),
            },
        );
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id().as_str(), "p2");
    }

    #[test]
    fn reorder_rewrites_sort_order_by_position() {
        let existing = vec![
            category("c1", "Starters", 1, 0),
            category("c2", "Mains", 2, 0),
            category("c3", "Desserts", 3, 0),
        ];
        let op = OptimisticOp::Reorder {
            ordered_ids: vec![RecordId::from("c3"), RecordId::from("c1")],
        };

        let next = apply(&existing, &op);
        let ids: Vec<&str> = next.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);
        let orders: Vec<i64> = next.iter().map(Record::sort_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn adjust_item_count_clamps_at_zero() {
        let existing = vec![category("c1", "Starters", 1, 1)];
        let op = OptimisticOp::AdjustItemCount {
            category_id: RecordId::from("c1"),
            delta: -5,
        };

        let next = apply(&existing, &op);
        assert_eq!(next[0].as_category().unwrap().item_count, 0);
    }
}
