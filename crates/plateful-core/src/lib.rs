//! Optimistic cache-synchronization core for the Plateful dashboard.
//!
//! This crate owns the client-side state layer between `plateful-api` and UI
//! consumers: a keyed collection cache with freshness tracking, and a mutation
//! coordinator that applies speculative writes immediately, tracks rollback
//! snapshots, and reconciles with server state on settlement.
//!
//! - **[`Coordinator`]** — Central facade. [`query()`](Coordinator::query)
//!   serves cached collections (stale-while-revalidate),
//!   [`mutate()`](Coordinator::mutate) runs one optimistic mutation through
//!   the apply → commit/rollback → reconcile protocol, and
//!   [`batch_mutate()`](Coordinator::batch_mutate) applies N mutations
//!   all-or-nothing with atomic rollback.
//!
//! - **[`QueryCache`]** — Keyed in-memory cache (`DashMap` +
//!   `tokio::sync::watch` channels). Maps a [`QueryKey`] (resource + tenant +
//!   optional filter) to the last-known collection snapshot plus freshness
//!   metadata. An explicit instance with controlled lifetime — no module-level
//!   singleton — so tests and multi-tenant hosts can run isolated caches.
//!
//! - **[`EntryStream`]** — Subscription handle vended by the cache. Exposes
//!   `current()` / `latest()` / `changed()` for reactive rendering.
//!
//! - **[`Mutation`]** — Typed mutation descriptors (create/update/delete/
//!   reorder per resource) replacing ad-hoc closures, so cross-entity side
//!   effects and batch atomicity stay auditable.
//!
//! - **Domain model** ([`model`]) — `Category`, `Product`, `ContentEntry`
//!   unified under [`Record`], with temp-id tracking for optimistic creates.

pub mod cache;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod mutation;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheEntry, EntryStatus, QueryCache, QueryKey};
pub use config::CoreConfig;
pub use coordinator::{Coordinator, MutationOptions};
pub use error::{BatchError, CoreError};
pub use mutation::requests::*;
pub use mutation::{Mutation, MutationOutcome};
pub use stream::EntryStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{Category, ContentEntry, Product, Record, RecordId, Resource, RestaurantId};
