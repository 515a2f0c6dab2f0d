// ── Query keys ──
//
// Structured cache index: resource + tenant + optional sub-filter.
// Two keys are equal iff all segments compare equal in order, which the
// derived Eq/Hash/Ord give us for free. Malformed keys are unrepresentable;
// the constructors are the only way in.

use std::fmt;

use crate::model::{RecordId, Resource, RestaurantId};

/// Cache index for one remote collection view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    resource: Resource,
    restaurant: RestaurantId,
    /// Optional sub-filter segment. By convention a category id for
    /// products and a slot name for content; unfiltered keys carry `None`.
    filter: Option<String>,
}

impl QueryKey {
    pub fn new(resource: Resource, restaurant: RestaurantId) -> Self {
        Self {
            resource,
            restaurant,
            filter: None,
        }
    }

    pub fn with_filter(
        resource: Resource,
        restaurant: RestaurantId,
        filter: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            restaurant,
            filter: Some(filter.into()),
        }
    }

    /// The canonical categories key for a tenant.
    pub fn categories(restaurant: &RestaurantId) -> Self {
        Self::new(Resource::Categories, restaurant.clone())
    }

    /// The canonical (unfiltered) products key for a tenant.
    pub fn products(restaurant: &RestaurantId) -> Self {
        Self::new(Resource::Products, restaurant.clone())
    }

    /// Products of one category.
    pub fn products_in(restaurant: &RestaurantId, category_id: &RecordId) -> Self {
        Self::with_filter(
            Resource::Products,
            restaurant.clone(),
            category_id.as_str(),
        )
    }

    /// The canonical (unfiltered) content key for a tenant.
    pub fn content(restaurant: &RestaurantId) -> Self {
        Self::new(Resource::Content, restaurant.clone())
    }

    /// Content entries for one dashboard slot.
    pub fn content_slot(restaurant: &RestaurantId, slot: impl Into<String>) -> Self {
        Self::with_filter(Resource::Content, restaurant.clone(), slot)
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn restaurant(&self) -> &RestaurantId {
        &self.restaurant
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Returns `true` if `self` caches (a view of) the same collection as
    /// the given resource + tenant pair. Used for prefix invalidation.
    pub(crate) fn covers(&self, resource: Resource, restaurant: &RestaurantId) -> bool {
        self.resource == resource && &self.restaurant == restaurant
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource, self.restaurant)?;
        if let Some(filter) = &self.filter {
            write!(f, "?{filter}")?;
        }
        Ok(())
    }
}
