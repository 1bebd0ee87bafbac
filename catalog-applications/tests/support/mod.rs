//! Shared fixtures for the application tests

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_applications::{
    ApplicationConfig, CatalogSynchronizer, MemoryTokenStore, ProductDraft, SessionManager,
};
use catalog_client::{MockCatalogRemote, MOCK_EMAIL, MOCK_PASSWORD};
use catalog_core::{AuthToken, CatalogRemote, CatalogResult, Product, ProductInput};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// A call that reached the remote: operation name and product id (if any)
pub type Entered = (&'static str, Option<String>);

/// Remote that reports every call as it arrives and can hold calls at a gate
/// until the test releases them; the actual work is done by a mock catalog
///
/// A held list call has already read the catalog, like a response that is
/// still on the wire.
pub struct ScriptedRemote {
    pub inner: MockCatalogRemote,
    gates: Mutex<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    entered: mpsc::UnboundedSender<Entered>,
    update_answer_id: Mutex<Option<String>>,
}

impl ScriptedRemote {
    pub fn new(inner: MockCatalogRemote) -> (Arc<Self>, mpsc::UnboundedReceiver<Entered>) {
        let (entered, rx) = mpsc::unbounded_channel();
        let remote = Arc::new(Self {
            inner,
            gates: Mutex::new(HashMap::new()),
            entered,
            update_answer_id: Mutex::new(None),
        });
        (remote, rx)
    }

    /// Hold the next call of `operation` until the returned sender fires
    pub fn gate(&self, operation: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(rx);
        tx
    }

    /// Answer every later update with a record carrying `id`
    pub fn answer_updates_with_id(&self, id: &str) {
        *self.update_answer_id.lock().unwrap() = Some(id.to_string());
    }

    async fn pass(&self, operation: &'static str, id: Option<&str>) {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front);
        let _ = self.entered.send((operation, id.map(str::to_string)));
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl CatalogRemote for ScriptedRemote {
    async fn list_products(&self, token: &AuthToken) -> CatalogResult<Vec<Product>> {
        let listed = self.inner.list_products(token).await;
        self.pass("list", None).await;
        listed
    }

    async fn get_product(&self, token: &AuthToken, id: &str) -> CatalogResult<Product> {
        self.pass("get", Some(id)).await;
        self.inner.get_product(token, id).await
    }

    async fn create_product(
        &self,
        token: &AuthToken,
        input: &ProductInput,
    ) -> CatalogResult<Product> {
        self.pass("create", None).await;
        self.inner.create_product(token, input).await
    }

    async fn update_product(
        &self,
        token: &AuthToken,
        id: &str,
        input: &ProductInput,
    ) -> CatalogResult<Product> {
        self.pass("update", Some(id)).await;
        let mut product = self.inner.update_product(token, id, input).await?;
        let answer_id = self.update_answer_id.lock().unwrap().clone();
        if let Some(answer_id) = answer_id {
            product.id = answer_id;
        }
        Ok(product)
    }

    async fn delete_product(&self, token: &AuthToken, id: &str) -> CatalogResult<()> {
        self.pass("delete", Some(id)).await;
        self.inner.delete_product(token, id).await
    }
}

pub fn draft(name: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        description: "Sturdy, well made and built to last.".to_string(),
        price: 24.5,
        category: "books".to_string(),
        stock: 12,
        image: "https://example.com/item.jpg".to_string(),
    }
}

pub fn test_config() -> ApplicationConfig {
    ApplicationConfig {
        remote_timeout_ms: 2_000,
        ..ApplicationConfig::default()
    }
}

/// Session backed by the mock catalog's authenticator
pub fn session(mock: Arc<MockCatalogRemote>) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(mock, Arc::new(MemoryTokenStore::new())))
}

pub async fn signed_in(mock: Arc<MockCatalogRemote>) -> Arc<SessionManager> {
    let session = session(mock);
    session.login(MOCK_EMAIL, MOCK_PASSWORD).await.unwrap();
    session
}

/// Synchronizer over a seeded mock, signed in and loaded
pub async fn loaded_synchronizer() -> (Arc<CatalogSynchronizer>, Arc<MockCatalogRemote>) {
    let mock = Arc::new(MockCatalogRemote::seeded());
    let session = signed_in(mock.clone()).await;
    let sync = Arc::new(CatalogSynchronizer::new(
        mock.clone(),
        session,
        test_config(),
    ));
    sync.load_all().await.unwrap();
    (sync, mock)
}
