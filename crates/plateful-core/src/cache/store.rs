// ── Keyed query cache ──
//
// Concurrent map from QueryKey to reactive cache slots. Reads are
// wait-free; every write rebuilds the entry wholesale and broadcasts it
// through a `watch` channel. Only the mutation coordinator and the fetch
// path write here — all external consumers are read-only.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tracing::{debug, trace};

use super::entry::{CacheEntry, EntryStatus};
use super::key::QueryKey;
use crate::model::{Record, Resource, RestaurantId};
use crate::stream::EntryStream;

/// One reactive slot per known QueryKey.
struct KeySlot {
    /// Current entry, broadcast to subscribers on every write.
    entry: watch::Sender<CacheEntry>,
    /// Serializes snapshot/apply pairs for mutations touching this key.
    apply_lock: Arc<Mutex<()>>,
    /// Fetch epoch. `cancel_in_flight` bumps it; a fetch settling under an
    /// older epoch is discarded so a late read never clobbers a newer
    /// optimistic write.
    fetch_epoch: AtomicU64,
}

impl KeySlot {
    fn new() -> Self {
        let (entry, _) = watch::channel(CacheEntry::empty());
        Self {
            entry,
            apply_lock: Arc::new(Mutex::new(())),
            fetch_epoch: AtomicU64::new(0),
        }
    }
}

/// Keyed in-memory cache for collection snapshots.
///
/// An explicit instance with controlled lifetime — inject one per
/// coordinator (or per test); there is no global cache.
pub struct QueryCache {
    slots: DashMap<QueryKey, Arc<KeySlot>>,
    stale_window: Duration,
}

impl QueryCache {
    pub fn new(stale_window: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            stale_window,
        }
    }

    /// Pure lookup. `None` for a key that was never touched; never an error.
    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.slots.get(key).map(|slot| slot.entry.borrow().clone())
    }

    /// Lookup with the empty-entry default, for callers that treat unknown
    /// keys as "empty collection, stale".
    pub fn read(&self, key: &QueryKey) -> CacheEntry {
        self.get(key).unwrap_or_else(CacheEntry::empty)
    }

    /// Replace the entry's data wholesale: stamps `fetched_at = now`, marks
    /// the entry fresh, and notifies subscribers.
    pub fn set(&self, key: &QueryKey, data: Vec<Record>) {
        trace!(key = %key, len = data.len(), "cache set");
        self.slot(key).entry.send_modify(|entry| {
            entry.data = Some(Arc::new(data));
            entry.fetched_at = Some(Utc::now());
            entry.status = EntryStatus::Fresh;
        });
    }

    /// Restore an entry to a previously captured state (rollback path).
    /// Data and freshness metadata come back exactly as snapshotted.
    pub(crate) fn restore(&self, key: &QueryKey, snapshot: CacheEntry) {
        trace!(key = %key, "cache restore");
        self.slot(key).entry.send_modify(|entry| *entry = snapshot);
    }

    /// Mark the entry stale without clearing data — consumers keep seeing
    /// the old collection until a fresh fetch lands.
    pub fn invalidate(&self, key: &QueryKey) {
        self.slot(key).entry.send_modify(|entry| {
            entry.status = EntryStatus::Stale;
        });
    }

    /// Invalidate every key caching a view of the given collection,
    /// filtered siblings included.
    pub fn invalidate_resource(&self, resource: Resource, restaurant: &RestaurantId) {
        for slot in &self.slots {
            if slot.key().covers(resource, restaurant) {
                slot.value().entry.send_modify(|entry| {
                    entry.status = EntryStatus::Stale;
                });
            }
        }
    }

    /// Signal that any in-progress fetch for this key must be ignored when
    /// it completes. Required before every optimistic mutation begins.
    pub fn cancel_in_flight(&self, key: &QueryKey) {
        let slot = self.slot(key);
        let epoch = slot.fetch_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(key = %key, epoch, "cancelled in-flight fetches");
    }

    /// Subscribe to entry changes for a key. The slot is created on demand
    /// so subscribing before the first fetch is fine.
    pub fn subscribe(&self, key: &QueryKey) -> EntryStream {
        EntryStream::new(self.slot(key).entry.subscribe())
    }

    /// Effective status of a key at this instant (freshness window applied).
    pub fn status(&self, key: &QueryKey) -> EntryStatus {
        self.read(key).status_at(Utc::now(), self.stale_window)
    }

    /// Returns `true` if the key holds data inside the stale window.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.read(key).is_fresh_at(Utc::now(), self.stale_window)
    }

    pub fn stale_window(&self) -> Duration {
        self.stale_window
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ── Fetch protocol ──────────────────────────────────────────────

    /// Mark a fetch as started and capture the epoch it runs under.
    /// The entry keeps serving its current data while fetching.
    pub(crate) fn begin_fetch(&self, key: &QueryKey) -> u64 {
        let slot = self.slot(key);
        slot.entry.send_modify(|entry| {
            entry.status = EntryStatus::Fetching;
        });
        slot.fetch_epoch.load(Ordering::SeqCst)
    }

    /// Settle a fetch started under `epoch`. Returns `false` (and leaves the
    /// entry untouched) if the epoch moved on — a newer optimistic write or
    /// fetch superseded this one.
    pub(crate) fn complete_fetch(
        &self,
        key: &QueryKey,
        epoch: u64,
        result: Result<Vec<Record>, String>,
    ) -> bool {
        let slot = self.slot(key);
        if slot.fetch_epoch.load(Ordering::SeqCst) != epoch {
            debug!(key = %key, epoch, "discarding fetch settled under a stale epoch");
            return false;
        }
        slot.entry.send_modify(|entry| match result {
            Ok(data) => {
                entry.data = Some(Arc::new(data));
                entry.fetched_at = Some(Utc::now());
                entry.status = EntryStatus::Fresh;
            }
            Err(message) => {
                debug!(key = %key, error = %message, "fetch failed; retaining prior data");
                entry.status = EntryStatus::Error;
            }
        });
        true
    }

    /// Per-key mutual exclusion handle for the coordinator's snapshot/apply
    /// critical section.
    pub(crate) fn apply_lock(&self, key: &QueryKey) -> Arc<Mutex<()>> {
        Arc::clone(&self.slot(key).apply_lock)
    }

    fn slot(&self, key: &QueryKey) -> Arc<KeySlot> {
        Arc::clone(
            &self
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(KeySlot::new())),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Category, RecordId};

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(300))
    }

    fn tenant() -> RestaurantId {
        RestaurantId::from("r1")
    }

    fn category(id: &str, name: &str) -> Record {
        Record::Category(Category {
            id: RecordId::from(id),
            restaurant_id: tenant(),
            name: name.into(),
            description: None,
            image_url: None,
            sort_order: 1,
            item_count: 0,
            optimistic: false,
        })
    }

    #[test]
    fn get_returns_none_for_unknown_key() {
        let cache = cache();
        assert!(cache.get(&QueryKey::categories(&tenant())).is_none());
    }

    #[test]
    fn set_makes_entry_fresh_and_readable() {
        let cache = cache();
        let key = QueryKey::categories(&tenant());

        cache.set(&key, vec![category("c1", "Starters")]);

        let entry = cache.get(&key).unwrap();
        assert_eq!(entry.status, EntryStatus::Fresh);
        assert_eq!(entry.records().len(), 1);
        assert!(cache.is_fresh(&key));
    }

    #[test]
    fn invalidate_keeps_data_but_marks_stale() {
        let cache = cache();
        let key = QueryKey::categories(&tenant());
        cache.set(&key, vec![category("c1", "Starters")]);

        cache.invalidate(&key);

        let entry = cache.get(&key).unwrap();
        assert_eq!(entry.status, EntryStatus::Stale);
        assert_eq!(entry.records().len(), 1, "stale-while-revalidate keeps data");
    }

    #[test]
    fn invalidate_resource_covers_filtered_siblings() {
        let cache = cache();
        let unfiltered = QueryKey::products(&tenant());
        let filtered = QueryKey::products_in(&tenant(), &RecordId::from("c1"));
        let other = QueryKey::categories(&tenant());
        cache.set(&unfiltered, vec![]);
        cache.set(&filtered, vec![]);
        cache.set(&other, vec![]);

        cache.invalidate_resource(Resource::Products, &tenant());

        assert_eq!(cache.get(&unfiltered).unwrap().status, EntryStatus::Stale);
        assert_eq!(cache.get(&filtered).unwrap().status, EntryStatus::Stale);
        assert_eq!(cache.get(&other).unwrap().status, EntryStatus::Fresh);
    }

    #[test]
    fn cancelled_fetch_is_discarded_on_completion() {
        let cache = cache();
        let key = QueryKey::categories(&tenant());

        let epoch = cache.begin_fetch(&key);
        // An optimistic mutation starts while the fetch is in flight.
        cache.cancel_in_flight(&key);
        cache.set(&key, vec![category("temp-1", "Desserts")]);

        // The stale fetch finally lands — it must not clobber the write.
        let applied = cache.complete_fetch(&key, epoch, Ok(vec![category("c1", "Old")]));

        assert!(!applied);
        let records = cache.read(&key).records();
        assert_eq!(records[0].id().as_str(), "temp-1");
    }

    #[test]
    fn current_fetch_applies_and_refreshes() {
        let cache = cache();
        let key = QueryKey::categories(&tenant());

        let epoch = cache.begin_fetch(&key);
        assert_eq!(cache.read(&key).status, EntryStatus::Fetching);

        let applied = cache.complete_fetch(&key, epoch, Ok(vec![category("c1", "Starters")]));
        assert!(applied);
        assert!(cache.is_fresh(&key));
    }

    #[test]
    fn failed_fetch_retains_prior_data() {
        let cache = cache();
        let key = QueryKey::categories(&tenant());
        cache.set(&key, vec![category("c1", "Starters")]);

        let epoch = cache.begin_fetch(&key);
        let applied = cache.complete_fetch(&key, epoch, Err("boom".into()));

        assert!(applied);
        let entry = cache.get(&key).unwrap();
        assert_eq!(entry.status, EntryStatus::Error);
        assert_eq!(entry.records().len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_writes() {
        let cache = cache();
        let key = QueryKey::categories(&tenant());
        let mut stream = cache.subscribe(&key);

        assert!(stream.current().data.is_none());

        cache.set(&key, vec![category("c1", "Starters")]);
        let entry = stream.changed().await.unwrap();
        assert_eq!(entry.records().len(), 1);
    }

    #[tokio::test]
    async fn stream_adapter_yields_current_entry_then_writes() {
        use futures::StreamExt;

        let cache = cache();
        let key = QueryKey::categories(&tenant());
        let mut stream = cache.subscribe(&key).into_stream();

        // The adapter yields the entry as of subscription first.
        let initial = stream.next().await.unwrap();
        assert!(initial.data.is_none());

        cache.set(&key, vec![category("c1", "Starters")]);
        let updated = stream.next().await.unwrap();
        assert_eq!(updated.records().len(), 1);
        assert_eq!(updated.status, EntryStatus::Fresh);
    }
}
