//! In-memory catalog backend
//!
//! Mirrors the API semantics (server-assigned ids and timestamps, 404 on
//! unknown ids, bearer check) without a network. Used by `--mock` and tests.

use async_trait::async_trait;
use catalog_core::{
    authentication_error, not_found_error, remote_error, AuthToken, Authenticator, CatalogError,
    CatalogRemote, CatalogResult, Credentials, ErrorContext, Product, ProductInput,
};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::seed::seed_products;

pub const MOCK_EMAIL: &str = "user@example.com";
pub const MOCK_PASSWORD: &str = "password123";
pub const MOCK_TOKEN: &str = "mock-session-token";

const COMPONENT: &str = "mock_remote";

/// A failure to inject into the next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Non-success HTTP status
    Status(u16),
    Network,
    Timeout,
}

impl MockFailure {
    fn into_error(self, operation: &str) -> CatalogError {
        match self {
            MockFailure::Status(401) | MockFailure::Status(403) => {
                authentication_error!("Unauthorized", COMPONENT)
            }
            MockFailure::Status(404) => not_found_error!(operation, COMPONENT),
            MockFailure::Status(status) => remote_error!("Injected failure", COMPONENT, status),
            MockFailure::Network => CatalogError::Network {
                message: "Injected connection failure".to_string(),
                source: None,
                context: ErrorContext::new(COMPONENT).with_operation(operation),
            },
            MockFailure::Timeout => CatalogError::Timeout {
                operation: operation.to_string(),
                duration_ms: 0,
                context: ErrorContext::new(COMPONENT).with_operation(operation),
            },
        }
    }
}

/// Per-operation call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCallCounts {
    pub authenticate: usize,
    pub list: usize,
    pub get: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

impl MockCallCounts {
    pub fn total(&self) -> usize {
        self.authenticate + self.list + self.get + self.create + self.update + self.delete
    }
}

#[derive(Default)]
struct Counters {
    authenticate: AtomicUsize,
    list: AtomicUsize,
    get: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

/// In-memory catalog backend
pub struct MockCatalogRemote {
    products: RwLock<Vec<Product>>,
    failures: Mutex<VecDeque<MockFailure>>,
    latency_ms: AtomicU64,
    counters: Counters,
}

impl Default for MockCatalogRemote {
    fn default() -> Self {
        Self::with_products(Vec::new())
    }
}

impl MockCatalogRemote {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            failures: Mutex::new(VecDeque::new()),
            latency_ms: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    /// Backend holding the built-in catalog
    pub fn seeded() -> Self {
        Self::with_products(seed_products())
    }

    /// Queue a failure; queued failures are consumed one per call, in order
    pub async fn fail_next(&self, failure: MockFailure) {
        self.failures.lock().await.push_back(failure);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> MockCallCounts {
        MockCallCounts {
            authenticate: self.counters.authenticate.load(Ordering::SeqCst),
            list: self.counters.list.load(Ordering::SeqCst),
            get: self.counters.get.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            update: self.counters.update.load(Ordering::SeqCst),
            delete: self.counters.delete.load(Ordering::SeqCst),
        }
    }

    /// Current server-side collection
    pub async fn snapshot(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    async fn enter(&self, counter: &AtomicUsize, operation: &str) -> CatalogResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        debug!(operation, "mock call");

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        match self.failures.lock().await.pop_front() {
            Some(failure) => Err(failure.into_error(operation)),
            None => Ok(()),
        }
    }

    fn check_token(token: &AuthToken) -> CatalogResult<()> {
        if token.as_str() == MOCK_TOKEN {
            Ok(())
        } else {
            Err(authentication_error!("Invalid or expired token", COMPONENT))
        }
    }

    fn build(id: String, input: &ProductInput, created_at: chrono::DateTime<Utc>) -> Product {
        Product {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            category: input.category,
            stock: input.stock,
            image: input.image.clone(),
            created_at,
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl Authenticator for MockCatalogRemote {
    async fn authenticate(&self, credentials: &Credentials) -> CatalogResult<AuthToken> {
        self.enter(&self.counters.authenticate, "login").await?;

        if credentials.email == MOCK_EMAIL && credentials.password == MOCK_PASSWORD {
            AuthToken::new(MOCK_TOKEN)
                .ok_or_else(|| authentication_error!("Token issuance failed", COMPONENT))
        } else {
            Err(authentication_error!("Invalid credentials", COMPONENT))
        }
    }
}

#[async_trait]
impl CatalogRemote for MockCatalogRemote {
    async fn list_products(&self, token: &AuthToken) -> CatalogResult<Vec<Product>> {
        self.enter(&self.counters.list, "list_products").await?;
        Self::check_token(token)?;
        Ok(self.snapshot().await)
    }

    async fn get_product(&self, token: &AuthToken, id: &str) -> CatalogResult<Product> {
        self.enter(&self.counters.get, "get_product").await?;
        Self::check_token(token)?;

        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| not_found_error!(format!("product {}", id), COMPONENT))
    }

    async fn create_product(
        &self,
        token: &AuthToken,
        input: &ProductInput,
    ) -> CatalogResult<Product> {
        self.enter(&self.counters.create, "create_product").await?;
        Self::check_token(token)?;

        let now = Utc::now();
        let product = Self::build(uuid::Uuid::new_v4().to_string(), input, now);
        // Newest first, the order the catalog view shows
        self.products.write().await.insert(0, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        token: &AuthToken,
        id: &str,
        input: &ProductInput,
    ) -> CatalogResult<Product> {
        self.enter(&self.counters.update, "update_product").await?;
        Self::check_token(token)?;

        let mut products = self.products.write().await;
        let slot = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found_error!(format!("product {}", id), COMPONENT))?;

        *slot = Self::build(slot.id.clone(), input, slot.created_at);
        Ok(slot.clone())
    }

    async fn delete_product(&self, token: &AuthToken, id: &str) -> CatalogResult<()> {
        self.enter(&self.counters.delete, "delete_product").await?;
        Self::check_token(token)?;

        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);

        if products.len() == before {
            return Err(not_found_error!(format!("product {}", id), COMPONENT));
        }
        Ok(())
    }
}
