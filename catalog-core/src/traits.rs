//! Core trait definitions
//!
//! The remote source of truth is consumed through these contracts; the HTTP
//! client and the in-memory mock in `catalog-client` both implement them.

use crate::error::CatalogResult;
use crate::types::*;
use async_trait::async_trait;

/// Exchanges credentials for a bearer token
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> CatalogResult<AuthToken>;
}

/// Authoritative product collection
///
/// Every call carries the bearer token of the current session.
#[async_trait]
pub trait CatalogRemote: Send + Sync {
    /// Full product collection
    async fn list_products(&self, token: &AuthToken) -> CatalogResult<Vec<Product>>;

    /// Single product; a missing id yields `CatalogError::NotFound`
    async fn get_product(&self, token: &AuthToken, id: &str) -> CatalogResult<Product>;

    /// Create a product; the server assigns id and timestamps
    async fn create_product(&self, token: &AuthToken, input: &ProductInput)
        -> CatalogResult<Product>;

    /// Replace the fields of an existing product; the server recomputes `updated_at`
    async fn update_product(
        &self,
        token: &AuthToken,
        id: &str,
        input: &ProductInput,
    ) -> CatalogResult<Product>;

    async fn delete_product(&self, token: &AuthToken, id: &str) -> CatalogResult<()>;
}
