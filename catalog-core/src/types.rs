//! Core data type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed, closed set of product categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Electronics,
    Clothing,
    Home,
    Books,
    Beauty,
}

impl ProductCategory {
    /// Every category, in display order
    pub const ALL: [ProductCategory; 5] = [
        ProductCategory::Electronics,
        ProductCategory::Clothing,
        ProductCategory::Home,
        ProductCategory::Books,
        ProductCategory::Beauty,
    ];

    /// Wire / storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Electronics => "electronics",
            ProductCategory::Clothing => "clothing",
            ProductCategory::Home => "home",
            ProductCategory::Books => "books",
            ProductCategory::Beauty => "beauty",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProductCategory::Electronics => "Electronics",
            ProductCategory::Clothing => "Clothing",
            ProductCategory::Home => "Home & Living",
            ProductCategory::Books => "Books",
            ProductCategory::Beauty => "Beauty",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electronics" => Ok(ProductCategory::Electronics),
            "clothing" => Ok(ProductCategory::Clothing),
            "home" => Ok(ProductCategory::Home),
            "books" => Ok(ProductCategory::Books),
            "beauty" => Ok(ProductCategory::Beauty),
            _ => Err(format!("Unknown product category: {}", s)),
        }
    }
}

/// A catalog entry as held by the remote source of truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Server-assigned identifier, unique within the collection
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    pub stock: u32,
    /// Image URL
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Inventory value of this entry (price x stock)
    pub fn inventory_value(&self) -> f64 {
        self.price * f64::from(self.stock)
    }
}

/// Validated product fields, minus identifier and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: ProductCategory,
    pub stock: u32,
    pub image: String,
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category,
            stock: product.stock,
            image: product.image.clone(),
        }
    }
}

/// Sign-in credentials exchanged for an [`AuthToken`]
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque, non-empty bearer credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a raw token; empty or whitespace-only tokens are rejected
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl TryFrom<String> for AuthToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AuthToken::new(value).ok_or_else(|| "auth token must not be empty".to_string())
    }
}

impl From<AuthToken> for String {
    fn from(token: AuthToken) -> Self {
        token.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<{} chars>)", self.0.len())
    }
}

/// Which remote collaborator backs the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteMode {
    /// HTTP API
    Http,
    /// In-memory catalog seeded with built-in data
    Mock,
}

impl FromStr for RemoteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(RemoteMode::Http),
            "mock" => Ok(RemoteMode::Mock),
            _ => Err(format!("Unknown remote mode: {}", s)),
        }
    }
}

/// Workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the catalog API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub mode: RemoteMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Location of the persisted token document
    pub storage_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Entries with stock below this count as low stock
    pub low_stock_threshold: u32,
    /// Serialize mutations that target the same product id
    pub serialize_mutations: bool,
}
