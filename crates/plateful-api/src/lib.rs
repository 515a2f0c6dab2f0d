// plateful-api: Async Rust client for the Plateful remote data store.
//
// Thin REST layer over the Backend-as-a-Service that persists restaurant
// dashboard data (categories, products, promotional content). Exposes the
// per-resource list/create/update/delete/reorder contract and the transport
// error taxonomy; plateful-core maps both into domain terms.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::StoreClient;
pub use error::{Error, FailureKind};
pub use transport::TransportConfig;
pub use types::{CategoryRow, ContentRow, ProductRow};
