// ── Keyed collection cache ──
//
// Single source of truth for "last known" collection state per QueryKey,
// with freshness-based refetch avoidance and push-based change notification.

mod entry;
mod key;
mod store;

pub use entry::{CacheEntry, EntryStatus};
pub use key::QueryKey;
pub use store::QueryCache;
