//! Catalog Synchronizer
//!
//! Keeps a local cache of the product collection consistent with the remote
//! source of truth. Mutations are pessimistic: the cache changes only after
//! the remote source confirms.

use super::events::{CatalogEvent, CatalogOperation};
use super::filter::{filter_products, CategoryFilter};
use super::stats::CatalogStats;
use super::validation::ProductDraft;
use crate::auth::SessionManager;
use crate::{ApplicationConfig, ApplicationError, ApplicationResult};
use catalog_core::{bounded, performance::measure_async, AuthToken, CatalogRemote, Product};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Result of a `load_all` that reached the remote source successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The cache now holds `count` products
    Applied { ticket: u64, count: usize },
    /// A newer load or a confirmed mutation had already been applied; this
    /// response was dropped
    Stale { ticket: u64, newest: u64 },
}

#[derive(Default)]
struct CatalogCache {
    products: Vec<Product>,
    /// Ticket of the newest change applied so far, load or mutation
    applied_ticket: u64,
}

type LockMap = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

/// Counts a load as in flight until dropped, even when the load is cancelled
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Exclusive hold on one product id; the map entry goes with the last holder
struct MutationGuard<'a> {
    locks: &'a LockMap,
    id: String,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        let mut locks = lock_map(self.locks);
        if locks
            .get(&self.id)
            .map_or(false, |lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

fn lock_map(locks: &LockMap) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
    // The map holds no invariant a panicking holder could break
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct CatalogSynchronizer {
    remote: Arc<dyn CatalogRemote>,
    session: Arc<SessionManager>,
    config: ApplicationConfig,
    cache: RwLock<CatalogCache>,
    next_ticket: AtomicU64,
    loads_in_flight: AtomicUsize,
    mutation_locks: LockMap,
    events: broadcast::Sender<CatalogEvent>,
}

impl CatalogSynchronizer {
    pub fn new(
        remote: Arc<dyn CatalogRemote>,
        session: Arc<SessionManager>,
        config: ApplicationConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            remote,
            session,
            config,
            cache: RwLock::new(CatalogCache::default()),
            next_ticket: AtomicU64::new(1),
            loads_in_flight: AtomicUsize::new(0),
            mutation_locks: StdMutex::new(HashMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the cached products, in cache order
    pub async fn products(&self) -> Vec<Product> {
        self.cache.read().await.products.clone()
    }

    pub async fn cached(&self, id: &str) -> Option<Product> {
        self.cache
            .read()
            .await
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Cached products matching the search text and category
    pub async fn filtered(&self, search: &str, category: CategoryFilter) -> Vec<Product> {
        filter_products(&self.cache.read().await.products, search, category)
    }

    pub async fn stats(&self) -> CatalogStats {
        CatalogStats::compute(
            &self.cache.read().await.products,
            self.config.low_stock_threshold,
        )
    }

    /// Whether any load is in flight
    pub fn is_loading(&self) -> bool {
        self.loads_in_flight.load(Ordering::SeqCst) > 0
    }

    /// Product ids currently holding or awaiting a mutation lock
    pub fn locked_ids(&self) -> usize {
        lock_map(&self.mutation_locks).len()
    }

    /// Fetch the full collection and replace the cache with it
    ///
    /// A response issued before the newest applied load or confirmed mutation
    /// is discarded. On failure the cache keeps its previous contents.
    pub async fn load_all(&self) -> ApplicationResult<LoadOutcome> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let loading = LoadingGuard::enter(&self.loads_in_flight);
        debug!(ticket, "Loading catalog");

        let result = self.fetch_all().await;
        drop(loading);

        let products = match result {
            Ok(products) => products,
            Err(e) => {
                warn!(ticket, error = %e, "Catalog load failed");
                self.notify_failure(CatalogOperation::Load, None, &e);
                return Err(e);
            }
        };

        let outcome = {
            let mut cache = self.cache.write().await;
            if ticket < cache.applied_ticket {
                LoadOutcome::Stale {
                    ticket,
                    newest: cache.applied_ticket,
                }
            } else {
                let count = products.len();
                cache.products = products;
                cache.applied_ticket = ticket;
                LoadOutcome::Applied { ticket, count }
            }
        };

        match outcome {
            LoadOutcome::Applied { ticket, count } => {
                info!(ticket, count, "Catalog loaded");
                self.emit(CatalogEvent::Loaded { ticket, count });
            }
            LoadOutcome::Stale { ticket, newest } => {
                info!(ticket, newest, "Discarding stale catalog load");
                self.emit(CatalogEvent::LoadDiscarded { ticket, newest });
            }
        }
        Ok(outcome)
    }

    /// Fetch one product; a cached copy is refreshed with the result
    pub async fn get(&self, id: &str) -> ApplicationResult<Product> {
        let token = self.token()?;
        let product = self
            .remote_call("get_product", self.remote.get_product(&token, id))
            .await
            .map_err(|e| {
                self.notify_failure(CatalogOperation::Get, Some(id), &e);
                e
            })?;

        let mut cache = self.cache.write().await;
        if let Some(slot) = cache.products.iter_mut().find(|p| p.id == id) {
            *slot = product.clone();
        }
        Ok(product)
    }

    /// Validate and create a product; the server record is prepended
    pub async fn create(&self, draft: &ProductDraft) -> ApplicationResult<Product> {
        let input = draft.validate().map_err(ApplicationError::Validation)?;
        let token = self.token()?;

        let product = self
            .remote_call("create_product", self.remote.create_product(&token, &input))
            .await
            .map_err(|e| {
                self.notify_failure(CatalogOperation::Create, None, &e);
                e
            })?;

        {
            let mut cache = self.cache.write().await;
            cache.products.retain(|p| p.id != product.id);
            cache.products.insert(0, product.clone());
            cache.applied_ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        }

        info!(id = %product.id, "Product created");
        self.emit(CatalogEvent::Created {
            id: product.id.clone(),
        });
        Ok(product)
    }

    /// Validate and update a cached product in place
    ///
    /// An id absent from the cache fails locally without a network call.
    pub async fn update(&self, id: &str, draft: &ProductDraft) -> ApplicationResult<Product> {
        let _guard = self.lock_id(id).await;
        self.update_locked(id, draft).await
    }

    async fn update_locked(&self, id: &str, draft: &ProductDraft) -> ApplicationResult<Product> {
        if self.cached(id).await.is_none() {
            return Err(ApplicationError::not_found(format!(
                "Product {} is not in the catalog",
                id
            )));
        }

        let input = draft.validate().map_err(ApplicationError::Validation)?;
        let token = self.token()?;

        let product = self
            .remote_call(
                "update_product",
                self.remote.update_product(&token, id, &input),
            )
            .await
            .and_then(|product| {
                if product.id == id {
                    Ok(product)
                } else {
                    Err(ApplicationError::Remote {
                        message: format!(
                            "Update of product {} answered with product {}",
                            id, product.id
                        ),
                        status: None,
                    })
                }
            })
            .map_err(|e| {
                self.notify_failure(CatalogOperation::Update, Some(id), &e);
                e
            })?;

        {
            let mut cache = self.cache.write().await;
            match cache.products.iter_mut().find(|p| p.id == id) {
                Some(slot) => *slot = product.clone(),
                None => debug!(id, "Updated product left the cache while in flight"),
            }
            cache.applied_ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        }

        info!(id, "Product updated");
        self.emit(CatalogEvent::Updated { id: id.to_string() });
        Ok(product)
    }

    /// Delete a product; the cache entry goes only once the remote confirms
    pub async fn delete(&self, id: &str) -> ApplicationResult<()> {
        let _guard = self.lock_id(id).await;
        self.delete_locked(id).await
    }

    async fn delete_locked(&self, id: &str) -> ApplicationResult<()> {
        let token = self.token()?;

        self.remote_call("delete_product", self.remote.delete_product(&token, id))
            .await
            .map_err(|e| {
                self.notify_failure(CatalogOperation::Delete, Some(id), &e);
                e
            })?;

        {
            let mut cache = self.cache.write().await;
            cache.products.retain(|p| p.id != id);
            cache.applied_ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        }

        info!(id, "Product deleted");
        self.emit(CatalogEvent::Deleted { id: id.to_string() });
        Ok(())
    }

    async fn fetch_all(&self) -> ApplicationResult<Vec<Product>> {
        let token = self.token()?;
        self.remote_call("list_products", self.remote.list_products(&token))
            .await
    }

    fn token(&self) -> ApplicationResult<AuthToken> {
        self.session
            .token()
            .ok_or_else(|| ApplicationError::authentication("Not signed in"))
    }

    async fn remote_call<F, T>(&self, operation: &str, call: F) -> ApplicationResult<T>
    where
        F: std::future::Future<Output = catalog_core::CatalogResult<T>>,
    {
        measure_async(
            operation,
            bounded(call, self.config.remote_timeout_ms, operation),
        )
        .await
        .map_err(ApplicationError::from)
    }

    async fn lock_id(&self, id: &str) -> Option<MutationGuard<'_>> {
        if !self.config.serialize_mutations {
            return None;
        }

        let lock = {
            let mut locks = lock_map(&self.mutation_locks);
            // Entries nobody holds or awaits are left over from cancelled calls
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id.to_string()).or_default().clone()
        };
        // Built before waiting so a cancelled wait still prunes the entry
        let mut guard = MutationGuard {
            locks: &self.mutation_locks,
            id: id.to_string(),
            held: None,
        };
        guard.held = Some(lock.lock_owned().await);
        Some(guard)
    }

    fn notify_failure(&self, operation: CatalogOperation, id: Option<&str>, error: &ApplicationError) {
        self.emit(CatalogEvent::Failed {
            operation,
            id: id.map(str::to_string),
            message: error.to_string(),
        });
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
