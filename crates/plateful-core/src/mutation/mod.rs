// ── Mutation API ──
//
// All write operations are value objects: a `Mutation` names the kind,
// the tenant, and the typed payload. The coordinator derives both the
// optimistic cache transform and the remote call from the variant, so
// there are no caller-supplied closures to audit.

pub(crate) mod optimistic;
pub mod requests;

use crate::cache::QueryKey;
use crate::model::{Category, ContentEntry, Product, RecordId, Resource, RestaurantId};

pub use requests::{
    CreateCategoryRequest, CreateContentRequest, CreateProductRequest, UpdateCategoryRequest,
    UpdateContentRequest, UpdateProductRequest,
};

/// All possible write operations against the remote data store.
#[derive(Debug, Clone, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Mutation {
    // ── Category CRUD ────────────────────────────────────────────────
    CreateCategory {
        restaurant: RestaurantId,
        request: CreateCategoryRequest,
    },
    UpdateCategory {
        restaurant: RestaurantId,
        id: RecordId,
        update: UpdateCategoryRequest,
    },
    DeleteCategory {
        restaurant: RestaurantId,
        id: RecordId,
    },
    ReorderCategories {
        restaurant: RestaurantId,
        ordered_ids: Vec<RecordId>,
    },

    // ── Product CRUD ─────────────────────────────────────────────────
    CreateProduct {
        restaurant: RestaurantId,
        request: CreateProductRequest,
    },
    UpdateProduct {
        restaurant: RestaurantId,
        id: RecordId,
        update: UpdateProductRequest,
    },
    DeleteProduct {
        restaurant: RestaurantId,
        id: RecordId,
    },
    ReorderProducts {
        restaurant: RestaurantId,
        ordered_ids: Vec<RecordId>,
    },

    // ── Content CRUD ─────────────────────────────────────────────────
    CreateContent {
        restaurant: RestaurantId,
        request: CreateContentRequest,
    },
    UpdateContent {
        restaurant: RestaurantId,
        id: RecordId,
        update: UpdateContentRequest,
    },
    DeleteContent {
        restaurant: RestaurantId,
        id: RecordId,
    },
    ReorderContent {
        restaurant: RestaurantId,
        ordered_ids: Vec<RecordId>,
    },
}

impl Mutation {
    /// The tenant this mutation belongs to.
    pub fn restaurant(&self) -> &RestaurantId {
        match self {
            Self::CreateCategory { restaurant, .. }
            | Self::UpdateCategory { restaurant, .. }
            | Self::DeleteCategory { restaurant, .. }
            | Self::ReorderCategories { restaurant, .. }
            | Self::CreateProduct { restaurant, .. }
            | Self::UpdateProduct { restaurant, .. }
            | Self::DeleteProduct { restaurant, .. }
            | Self::ReorderProducts { restaurant, .. }
            | Self::CreateContent { restaurant, .. }
            | Self::UpdateContent { restaurant, .. }
            | Self::DeleteContent { restaurant, .. }
            | Self::ReorderContent { restaurant, .. } => restaurant,
        }
    }

    /// The resource whose collection this mutation primarily targets.
    pub fn resource(&self) -> Resource {
        match self {
            Self::CreateCategory { .. }
            | Self::UpdateCategory { .. }
            | Self::DeleteCategory { .. }
            | Self::ReorderCategories { .. } => Resource::Categories,
            Self::CreateProduct { .. }
            | Self::UpdateProduct { .. }
            | Self::DeleteProduct { .. }
            | Self::ReorderProducts { .. } => Resource::Products,
            Self::CreateContent { .. }
            | Self::UpdateContent { .. }
            | Self::DeleteContent { .. }
            | Self::ReorderContent { .. } => Resource::Content,
        }
    }

    /// The canonical cache key for the primary collection.
    pub(crate) fn primary_key(&self) -> QueryKey {
        QueryKey::new(self.resource(), self.restaurant().clone())
    }

    /// Every cache key this mutation's apply/snapshot/rollback unit covers.
    ///
    /// Product create/update/delete and category delete cross entities:
    /// they also adjust (or cascade into) the sibling collection, and that
    /// adjustment rolls back as part of the same transaction. Statically
    /// derivable from the variant, which keeps lock acquisition and batch
    /// snapshotting independent of cache contents.
    pub(crate) fn touched_keys(&self) -> Vec<QueryKey> {
        let restaurant = self.restaurant();
        match self {
            Self::CreateProduct { .. } | Self::UpdateProduct { .. } | Self::DeleteProduct { .. } => {
                vec![
                    QueryKey::products(restaurant),
                    QueryKey::categories(restaurant),
                ]
            }
            Self::DeleteCategory { .. } => vec![
                QueryKey::categories(restaurant),
                QueryKey::products(restaurant),
            ],
            _ => vec![self.primary_key()],
        }
    }

    /// Stable name for telemetry (`create_category`, `reorder_products`, …).
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Server-confirmed result of a settled mutation.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    Category(Category),
    Product(Product),
    Content(ContentEntry),
    Categories(Vec<Category>),
    Products(Vec<Product>),
    ContentEntries(Vec<ContentEntry>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> RestaurantId {
        RestaurantId::from("r1")
    }

    #[test]
    fn product_mutations_touch_both_collections() {
        let m = Mutation::DeleteProduct {
            restaurant: tenant(),
            id: RecordId::from("p1"),
        };
        let keys = m.touched_keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&QueryKey::products(&tenant())));
        assert!(keys.contains(&QueryKey::categories(&tenant())));
    }

    #[test]
    fn content_mutations_touch_one_collection() {
        let m = Mutation::DeleteContent {
            restaurant: tenant(),
            id: RecordId::from("e1"),
        };
        assert_eq!(m.touched_keys(), vec![QueryKey::content(&tenant())]);
    }

    #[test]
    fn kind_names_are_stable() {
        let m = Mutation::ReorderCategories {
            restaurant: tenant(),
            ordered_ids: vec![],
        };
        assert_eq!(m.kind(), "reorder_categories");
    }
}
