// ── Mutation coordination ──
//
// Full lifecycle for reads and writes against the remote data store.
// Reads go through the keyed cache with stale-while-revalidate; writes run
// the apply → commit/rollback → reconcile protocol, single or batched.
//
// Scheduling model: cache reads/writes are synchronous; the only
// suspension points are the remote calls and the per-key lock used to
// serialize snapshot/apply pairs. Logical races (lost updates across
// interleaved optimistic windows) are prevented by that lock plus the
// fetch-epoch check in the cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use plateful_api::{StoreClient, TransportConfig};

use crate::cache::{CacheEntry, EntryStatus, QueryCache, QueryKey};
use crate::config::CoreConfig;
use crate::convert;
use crate::error::{BatchError, CoreError};
use crate::model::{Category, ContentEntry, Product, Record, Resource, RestaurantId};
use crate::mutation::optimistic::{self, OptimisticOp, Patch};
use crate::mutation::{Mutation, MutationOutcome};
use crate::stream::EntryStream;

/// Per-mutation tuning.
#[derive(Debug, Clone, Copy)]
pub struct MutationOptions {
    /// Restore the pre-mutation snapshot if the remote call fails.
    /// On `false`, the optimistic state is retained and only the
    /// reconciling invalidation cleans it up.
    pub rollback_on_error: bool,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            rollback_on_error: true,
        }
    }
}

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Owns the keyed cache and
/// the store client; all writes to the cache flow through here or through
/// the cache's own fetch path.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoreConfig,
    cache: Arc<QueryCache>,
    client: StoreClient,
    /// Cancels background refresh tasks on shutdown.
    cancel: CancellationToken,
}

impl Coordinator {
    /// Create a coordinator with its own isolated cache.
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
        };
        let client = StoreClient::new(config.base_url.clone(), &config.service_key, &transport)?;
        let cache = Arc::new(QueryCache::new(config.stale_window));

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                cache,
                client,
                cancel: CancellationToken::new(),
            }),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// The underlying cache. External consumers use it read-only.
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    /// Subscribe to entry changes for a key.
    pub fn subscribe(&self, key: &QueryKey) -> EntryStream {
        self.inner.cache.subscribe(key)
    }

    /// Stop background refresh tasks. In-flight mutations still settle.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ── Read path ────────────────────────────────────────────────────

    /// Read a collection with stale-while-revalidate semantics.
    ///
    /// Fresh data returns synchronously. Stale data also returns
    /// synchronously, with a background refetch scheduled. Only a key
    /// that has never been fetched blocks on the network.
    pub async fn query(&self, key: &QueryKey) -> Result<Arc<Vec<Record>>, CoreError> {
        let cache = &self.inner.cache;
        let entry = cache.read(key);
        let status = entry.status_at(Utc::now(), cache.stale_window());

        match (entry.data, status) {
            (Some(data), EntryStatus::Fresh | EntryStatus::Fetching) => Ok(data),
            (Some(data), _) => {
                self.spawn_refresh(key.clone());
                Ok(data)
            }
            (None, _) => self.refresh(key).await,
        }
    }

    /// Force a foreground refetch for a key.
    ///
    /// If a newer optimistic write supersedes the fetch while it is in
    /// flight, the late result is discarded and the current cache state is
    /// returned instead.
    pub async fn refresh(&self, key: &QueryKey) -> Result<Arc<Vec<Record>>, CoreError> {
        let cache = &self.inner.cache;
        let epoch = cache.begin_fetch(key);

        match self.fetch_collection(key).await {
            Ok(records) => {
                if cache.complete_fetch(key, epoch, Ok(records)) {
                    debug!(key = %key, "refetch applied");
                }
                Ok(cache.read(key).records())
            }
            Err(err) => {
                let _ = cache.complete_fetch(key, epoch, Err(err.to_string()));
                Err(err)
            }
        }
    }

    fn spawn_refresh(&self, key: QueryKey) {
        // One in-flight refresh per key is enough.
        if self.inner.cache.read(&key).status == EntryStatus::Fetching {
            return;
        }
        let this = self.clone();
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                result = this.refresh(&key) => {
                    if let Err(err) = result {
                        warn!(key = %key, error = %err, "background refresh failed");
                    }
                }
            }
        });
    }

    async fn fetch_collection(&self, key: &QueryKey) -> Result<Vec<Record>, CoreError> {
        let client = &self.inner.client;
        let restaurant = key.restaurant().as_str();
        let records = match key.resource() {
            Resource::Categories => {
                convert::category_records(client.list_categories(restaurant).await?)
            }
            Resource::Products => {
                convert::product_records(client.list_products(restaurant, key.filter()).await?)
            }
            Resource::Content => {
                convert::content_records(client.list_content(restaurant, key.filter()).await?)
            }
        };
        Ok(records)
    }

    // ── Single mutation ──────────────────────────────────────────────

    /// Execute one optimistic mutation with the default options
    /// (rollback on error).
    pub async fn mutate(&self, mutation: Mutation) -> Result<MutationOutcome, CoreError> {
        self.mutate_with(mutation, MutationOptions::default()).await
    }

    /// Execute one optimistic mutation.
    ///
    /// Protocol: cancel in-flight fetches for every touched key, snapshot
    /// and apply inside the per-key critical section, settle the remote
    /// call, then commit (keep optimistic state) or roll back (restore
    /// every snapshot). The reconciling invalidation runs exactly once on
    /// every path, and failures re-raise only after rollback completed.
    pub async fn mutate_with(
        &self,
        mutation: Mutation,
        options: MutationOptions,
    ) -> Result<MutationOutcome, CoreError> {
        let cache = &self.inner.cache;
        let kind = mutation.kind();
        // BTreeSet gives a stable lock order across concurrent mutations.
        let touched: BTreeSet<QueryKey> = mutation.touched_keys().into_iter().collect();
        info!(kind, key = %mutation.primary_key(), "mutation start");

        for key in &touched {
            cache.cancel_in_flight(key);
        }

        // Snapshot/apply is the critical section: a second mutation on the
        // same key must snapshot *after* this apply, never interleaved,
        // or its rollback would lose this update.
        let mut guards = Vec::with_capacity(touched.len());
        for key in &touched {
            guards.push(cache.apply_lock(key).lock_owned().await);
        }
        let snapshots: Vec<(QueryKey, CacheEntry)> =
            touched.iter().map(|k| (k.clone(), cache.read(k))).collect();
        for (key, op) in plan_ops(&mutation, cache) {
            let next = optimistic::apply(&cache.read(&key).records(), &op);
            cache.set(&key, next);
        }
        drop(guards);

        // The only suspension point of the mutation itself.
        let result = self.execute_remote(mutation).await;

        match &result {
            Ok(_) => info!(kind, "mutation committed"),
            Err(err) => {
                if options.rollback_on_error {
                    self.restore_snapshots(snapshots).await;
                    warn!(kind, error = %err, "mutation rolled back");
                } else {
                    warn!(kind, error = %err, "mutation failed; optimistic state retained");
                }
            }
        }

        // Reconcile: schedule a refetch regardless of outcome, covering
        // filtered sibling keys of every touched collection.
        self.invalidate_touched(&touched);

        result
    }

    // ── Batch mutations ──────────────────────────────────────────────

    /// Apply N mutations all-or-nothing.
    ///
    /// All snapshots are taken before any apply, so overlapping keys roll
    /// back to a consistent pre-batch state. Remote calls settle
    /// concurrently without short-circuiting; if any fail, every touched
    /// key is restored — including keys whose own calls succeeded — and
    /// the aggregate error preserves per-mutation outcomes in submission
    /// order.
    pub async fn batch_mutate(
        &self,
        mutations: Vec<Mutation>,
    ) -> Result<Vec<MutationOutcome>, CoreError> {
        if mutations.is_empty() {
            return Ok(Vec::new());
        }
        let cache = &self.inner.cache;
        let total = mutations.len();
        let touched: BTreeSet<QueryKey> =
            mutations.iter().flat_map(Mutation::touched_keys).collect();
        info!(total, keys = touched.len(), "batch mutation start");

        for key in &touched {
            cache.cancel_in_flight(key);
        }

        let mut guards = Vec::with_capacity(touched.len());
        for key in &touched {
            guards.push(cache.apply_lock(key).lock_owned().await);
        }
        let snapshots: Vec<(QueryKey, CacheEntry)> =
            touched.iter().map(|k| (k.clone(), cache.read(k))).collect();
        for mutation in &mutations {
            for (key, op) in plan_ops(mutation, cache) {
                let next = optimistic::apply(&cache.read(&key).records(), &op);
                cache.set(&key, next);
            }
        }
        drop(guards);

        // Wait for all to settle; partial completion must be known before
        // the rollback decision.
        let outcomes: Vec<Result<MutationOutcome, CoreError>> =
            join_all(mutations.into_iter().map(|m| self.execute_remote(m))).await;

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        let result = if failed > 0 {
            self.restore_snapshots(snapshots).await;
            warn!(failed, total, "batch mutation rolled back");
            Err(CoreError::Batch(BatchError { outcomes }))
        } else {
            info!(total, "batch mutation committed");
            outcomes.into_iter().collect()
        };

        self.invalidate_touched(&touched);

        result
    }

    // ── Shared internals ─────────────────────────────────────────────

    /// Restore snapshots under the same per-key locks (and the same order)
    /// the apply path uses, so a rollback never interleaves with another
    /// mutation's snapshot/apply pair.
    ///
    /// The restore is a plain rewind: a concurrent mutation that applied
    /// after this snapshot was taken — even one that already committed —
    /// is rewound along with it. The invalidation that follows every
    /// settlement schedules the refetch that brings the key back to
    /// server truth.
    async fn restore_snapshots(&self, snapshots: Vec<(QueryKey, CacheEntry)>) {
        let cache = &self.inner.cache;
        let mut guards = Vec::with_capacity(snapshots.len());
        for (key, _) in &snapshots {
            guards.push(cache.apply_lock(key).lock_owned().await);
        }
        for (key, snapshot) in snapshots {
            cache.restore(&key, snapshot);
        }
    }

    fn invalidate_touched(&self, touched: &BTreeSet<QueryKey>) {
        let collections: BTreeSet<(Resource, RestaurantId)> = touched
            .iter()
            .map(|k| (k.resource(), k.restaurant().clone()))
            .collect();
        for (resource, restaurant) in collections {
            self.inner.cache.invalidate_resource(resource, &restaurant);
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn execute_remote(&self, mutation: Mutation) -> Result<MutationOutcome, CoreError> {
        let client = &self.inner.client;
        let outcome = match mutation {
            Mutation::CreateCategory {
                restaurant,
                request,
            } => MutationOutcome::Category(
                client
                    .create_category(restaurant.as_str(), &request)
                    .await?
                    .into(),
            ),
            Mutation::UpdateCategory { id, update, .. } => MutationOutcome::Category(
                client.update_category(id.as_str(), &update).await?.into(),
            ),
            Mutation::DeleteCategory { id, .. } => {
                MutationOutcome::Category(client.delete_category(id.as_str()).await?.into())
            }
            Mutation::ReorderCategories {
                restaurant,
                ordered_ids,
            } => MutationOutcome::Categories(
                client
                    .reorder_categories(restaurant.as_str(), &raw_ids(&ordered_ids))
                    .await?
                    .into_iter()
                    .map(Category::from)
                    .collect(),
            ),

            Mutation::CreateProduct {
                restaurant,
                request,
            } => MutationOutcome::Product(
                client
                    .create_product(restaurant.as_str(), &request)
                    .await?
                    .into(),
            ),
            Mutation::UpdateProduct { id, update, .. } => {
                MutationOutcome::Product(client.update_product(id.as_str(), &update).await?.into())
            }
            Mutation::DeleteProduct { id, .. } => {
                MutationOutcome::Product(client.delete_product(id.as_str()).await?.into())
            }
            Mutation::ReorderProducts {
                restaurant,
                ordered_ids,
            } => MutationOutcome::Products(
                client
                    .reorder_products(restaurant.as_str(), &raw_ids(&ordered_ids))
                    .await?
                    .into_iter()
                    .map(Product::from)
                    .collect(),
            ),

            Mutation::CreateContent {
                restaurant,
                request,
            } => MutationOutcome::Content(
                client
                    .create_content(restaurant.as_str(), &request)
                    .await?
                    .into(),
            ),
            Mutation::UpdateContent { id, update, .. } => {
                MutationOutcome::Content(client.update_content(id.as_str(), &update).await?.into())
            }
            Mutation::DeleteContent { id, .. } => {
                MutationOutcome::Content(client.delete_content(id.as_str()).await?.into())
            }
            Mutation::ReorderContent {
                restaurant,
                ordered_ids,
            } => MutationOutcome::ContentEntries(
                client
                    .reorder_content(restaurant.as_str(), &raw_ids(&ordered_ids))
                    .await?
                    .into_iter()
                    .map(ContentEntry::from)
                    .collect(),
            ),
        };
        Ok(outcome)
    }
}

fn raw_ids(ids: &[crate::model::RecordId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_owned()).collect()
}

// ── Optimistic planning ──────────────────────────────────────────────

/// Expand a mutation into its optimistic ops, keyed by the cache entry
/// each applies to. Called inside the per-key critical section so lookups
/// (e.g. a deleted product's parent category) see the serialized state.
#[allow(clippy::too_many_lines)]
fn plan_ops(mutation: &Mutation, cache: &QueryCache) -> Vec<(QueryKey, OptimisticOp)> {
    let restaurant = mutation.restaurant();
    let categories = QueryKey::categories(restaurant);
    let products = QueryKey::products(restaurant);
    let content = QueryKey::content(restaurant);

    match mutation {
        // ── Categories ───────────────────────────────────────────────
        Mutation::CreateCategory { request, .. } => {
            let existing = cache.read(&categories).records();
            let record = optimistic::speculative_category(restaurant, request, &existing);
            vec![(categories, OptimisticOp::Insert(record.into()))]
        }
        Mutation::UpdateCategory { id, update, .. } => vec![(
            categories,
            OptimisticOp::Patch {
                id: id.clone(),
                patch: Patch::Category(update.clone()),
            },
        )],
        Mutation::DeleteCategory { id, .. } => vec![
            // Cascade first so a rollback restores products before the
            // category row reappears.
            (
                products,
                OptimisticOp::RemoveByCategory {
                    category_id: id.clone(),
                },
            ),
            (categories, OptimisticOp::Remove { id: id.clone() }),
        ],
        Mutation::ReorderCategories { ordered_ids, .. } => vec![(
            categories,
            OptimisticOp::Reorder {
                ordered_ids: ordered_ids.clone(),
            },
        )],

        // ── Products ─────────────────────────────────────────────────
        Mutation::CreateProduct { request, .. } => {
            let existing = cache.read(&products).records();
            let record = optimistic::speculative_product(restaurant, request, &existing);
            vec![
                (products, OptimisticOp::Insert(record.into())),
                (
                    categories,
                    OptimisticOp::AdjustItemCount {
                        category_id: request.category_id.clone(),
                        delta: 1,
                    },
                ),
            ]
        }
        Mutation::UpdateProduct { id, update, .. } => {
            let mut ops = vec![(
                products.clone(),
                OptimisticOp::Patch {
                    id: id.clone(),
                    patch: Patch::Product(update.clone()),
                },
            )];
            // Category moves shift the derived counts on both sides.
            if let Some(new_category) = &update.category_id {
                let current = cache.read(&products).records();
                let old_category = current
                    .iter()
                    .find(|r| r.id() == id)
                    .and_then(|r| r.as_product())
                    .map(|p| p.category_id.clone());
                if let Some(old_category) = old_category {
                    if &old_category != new_category {
                        ops.push((
                            categories.clone(),
                            OptimisticOp::AdjustItemCount {
                                category_id: old_category,
                                delta: -1,
                            },
                        ));
                        ops.push((
                            categories,
                            OptimisticOp::AdjustItemCount {
                                category_id: new_category.clone(),
                                delta: 1,
                            },
                        ));
                    }
                }
            }
            ops
        }
        Mutation::DeleteProduct { id, .. } => {
            let current = cache.read(&products).records();
            let parent = current
                .iter()
                .find(|r| r.id() == id)
                .and_then(|r| r.as_product())
                .map(|p| p.category_id.clone());

            let mut ops = vec![(products, OptimisticOp::Remove { id: id.clone() })];
            if let Some(category_id) = parent {
                ops.push((
                    categories,
                    OptimisticOp::AdjustItemCount {
                        category_id,
                        delta: -1,
                    },
                ));
            }
            ops
        }
        Mutation::ReorderProducts { ordered_ids, .. } => vec![(
            products,
            OptimisticOp::Reorder {
                ordered_ids: ordered_ids.clone(),
            },
        )],

        // ── Content ──────────────────────────────────────────────────
        Mutation::CreateContent { request, .. } => {
            let existing = cache.read(&content).records();
            let record = optimistic::speculative_content(restaurant, request, &existing);
            vec![(content, OptimisticOp::Insert(record.into()))]
        }
        Mutation::UpdateContent { id, update, .. } => vec![(
            content,
            OptimisticOp::Patch {
                id: id.clone(),
                patch: Patch::Content(update.clone()),
            },
        )],
        Mutation::DeleteContent { id, .. } => {
            vec![(content, OptimisticOp::Remove { id: id.clone() })]
        }
        Mutation::ReorderContent { ordered_ids, .. } => vec![(
            content,
            OptimisticOp::Reorder {
                ordered_ids: ordered_ids.clone(),
            },
        )],
    }
}
