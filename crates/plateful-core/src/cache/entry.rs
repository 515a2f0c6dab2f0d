// ── Cache entries ──
//
// Per-key snapshot plus freshness metadata. `data` is only ever replaced
// wholesale (`Arc` swap) — readers holding a reference never see a
// partially-updated collection.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::Record;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Data present and inside the stale window.
    Fresh,
    /// Data may be present but a refetch is due (explicit invalidation or
    /// stale window elapsed). Stale data is still served synchronously.
    Stale,
    /// A fetch is in flight. Existing data keeps being served.
    Fetching,
    /// The most recent fetch failed; prior data (if any) is retained.
    Error,
}

/// The last-known state for one `QueryKey`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The collection snapshot, `None` before the first successful fetch.
    pub data: Option<Arc<Vec<Record>>>,
    /// When `data` was last confirmed or replaced.
    pub fetched_at: Option<DateTime<Utc>>,
    pub status: EntryStatus,
}

impl CacheEntry {
    /// The state a key has before anything was fetched for it.
    pub fn empty() -> Self {
        Self {
            data: None,
            fetched_at: None,
            status: EntryStatus::Stale,
        }
    }

    /// The collection snapshot, empty if nothing was ever fetched.
    pub fn records(&self) -> Arc<Vec<Record>> {
        self.data.clone().unwrap_or_default()
    }

    /// Effective status at `now`: a `Fresh` entry degrades to `Stale` once
    /// the window elapses, without any write to the entry.
    pub fn status_at(&self, now: DateTime<Utc>, stale_window: Duration) -> EntryStatus {
        if self.status == EntryStatus::Fresh && !self.is_fresh_at(now, stale_window) {
            EntryStatus::Stale
        } else {
            self.status
        }
    }

    /// Freshness rule: fresh iff marked fresh and `now - fetched_at`
    /// is inside the stale window.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, stale_window: Duration) -> bool {
        if self.status != EntryStatus::Fresh {
            return false;
        }
        let Some(fetched_at) = self.fetched_at else {
            return false;
        };
        let age = now.signed_duration_since(fetched_at);
        let Ok(window) = chrono::Duration::from_std(stale_window) else {
            return false;
        };
        age >= chrono::Duration::zero() && age < window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, RecordId, RestaurantId};

    const WINDOW: Duration = Duration::from_secs(300);

    fn entry_fetched_at(fetched_at: DateTime<Utc>) -> CacheEntry {
        let record = Record::Category(Category {
            id: RecordId::from("c1"),
            restaurant_id: RestaurantId::from("r1"),
            name: "Starters".into(),
            description: None,
            image_url: None,
            sort_order: 1,
            item_count: 0,
            optimistic: false,
        });
        CacheEntry {
            data: Some(Arc::new(vec![record])),
            fetched_at: Some(fetched_at),
            status: EntryStatus::Fresh,
        }
    }

    #[test]
    fn fresh_inside_window_stale_outside() {
        let fetched = Utc::now();
        let entry = entry_fetched_at(fetched);

        // T + window - ε is still fresh.
        let just_before = fetched + chrono::Duration::seconds(299);
        assert!(entry.is_fresh_at(just_before, WINDOW));
        assert_eq!(entry.status_at(just_before, WINDOW), EntryStatus::Fresh);

        // T + window + ε is stale.
        let just_after = fetched + chrono::Duration::seconds(301);
        assert!(!entry.is_fresh_at(just_after, WINDOW));
        assert_eq!(entry.status_at(just_after, WINDOW), EntryStatus::Stale);
    }

    #[test]
    fn explicit_stale_wins_over_recency() {
        let mut entry = entry_fetched_at(Utc::now());
        entry.status = EntryStatus::Stale;
        assert!(!entry.is_fresh_at(Utc::now(), WINDOW));
    }

    #[test]
    fn clock_skew_counts_as_stale() {
        // fetched_at in the future means the clock moved; don't trust it.
        let entry = entry_fetched_at(Utc::now() + chrono::Duration::seconds(60));
        assert!(!entry.is_fresh_at(Utc::now(), WINDOW));
    }

    #[test]
    fn empty_entry_is_stale_with_no_data() {
        let entry = CacheEntry::empty();
        assert_eq!(entry.status, EntryStatus::Stale);
        assert!(entry.records().is_empty());
        assert!(!entry.is_fresh_at(Utc::now(), WINDOW));
    }
}
