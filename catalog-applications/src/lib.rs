//! Catalog Applications - Session, navigation and catalog synchronization
//!
//! This crate holds the application layer of the catalog admin:
//!
//! - Session management with a persisted bearer token
//! - Route guarding for protected views
//! - Catalog synchronization against the remote source of truth, with
//!   validation, filtering and dashboard statistics
//!
//! ## Architecture
//!
//! - **Core** (catalog-core): data model, collaborator traits, infrastructure
//! - **Client** (catalog-client): HTTP and in-memory collaborators
//! - **Applications** (this crate): stateful services built on the traits
//! - **Presentation** (catalog-cli): user interface

pub mod auth;
pub mod catalog;

pub use auth::{
    FileTokenStore, GuardDecision, MemoryTokenStore, Route, RouteGuard, SessionManager,
    SessionState, StoredSession, TokenStore,
};
pub use catalog::{
    filter_products, validate_credentials, CatalogEvent, CatalogOperation, CatalogStats,
    CatalogSynchronizer, CategoryFilter, FieldViolation, LoadOutcome, ProductDraft,
    ValidationErrors,
};

use catalog_core::{CatalogConfig, CatalogError};

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Non-success answer from the remote source, including remote
    /// not-found and undecodable responses
    #[error("Remote error: {message}")]
    Remote {
        message: String,
        status: Option<u16>,
    },

    /// Transport failure, including timeouts
    #[error("Network error: {message}")]
    Network { message: String },

    /// Entry absent from the local cache
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

impl ApplicationError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Remote and network failures are handled identically by callers
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::Network { .. })
    }

    /// The product does not exist, locally or on the remote source
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Remote {
                    status: Some(404),
                    ..
                }
        )
    }

    /// Re-issuing the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Remote { status, .. } => status.map_or(true, |s| s >= 500),
            Self::Validation(_)
            | Self::Authentication { .. }
            | Self::NotFound { .. }
            | Self::Config { .. }
            | Self::Storage { .. }
            | Self::Internal { .. }
            | Self::Io(_)
            | Self::Serialization(_) => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authentication { .. } => "authentication",
            Self::Remote { .. } => "remote",
            Self::Network { .. } => "network",
            Self::NotFound { .. } => "not_found",
            Self::Config { .. } => "config",
            Self::Storage { .. } => "storage",
            Self::Internal { .. } => "internal",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Message suitable for showing to the person at the keyboard
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => format!("Please fix the highlighted fields: {}", errors),
            Self::Authentication { message } => message.clone(),
            Self::Remote {
                status: Some(404), ..
            } => "The product no longer exists. Reload the catalog.".to_string(),
            Self::Remote { message, .. } | Self::Network { message } => {
                format!("The catalog service could not complete the request: {}", message)
            }
            Self::NotFound { message } => message.clone(),
            Self::Config { message } => format!("Configuration problem: {}", message),
            Self::Storage { .. } | Self::Io(_) | Self::Serialization(_) => {
                "Local session storage could not be accessed.".to_string()
            }
            Self::Internal { .. } => "An unexpected error occurred.".to_string(),
        }
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::Validation { message, field, .. } => Self::Validation(
                ValidationErrors::single(field.as_deref().unwrap_or("input"), message),
            ),
            CatalogError::Authentication { message, .. } => Self::Authentication { message },
            CatalogError::Remote {
                message, status, ..
            } => Self::Remote { message, status },
            CatalogError::NotFound { resource, .. } => Self::Remote {
                message: format!("{} not found", resource),
                status: Some(404),
            },
            CatalogError::Decode { message, .. } => Self::Remote {
                message: format!("Unexpected response: {}", message),
                status: None,
            },
            CatalogError::Network { message, .. } => Self::Network { message },
            CatalogError::Timeout {
                operation,
                duration_ms,
                ..
            } => Self::Network {
                message: format!("{} timed out after {} ms", operation, duration_ms),
            },
            CatalogError::Config { message, .. } => Self::Config { message },
            CatalogError::Storage { message, .. } => Self::Storage { message },
            CatalogError::Io(e) => Self::Io(e),
            CatalogError::Serialization(e) => Self::Serialization(e),
            CatalogError::Internal { message, .. } => Self::Internal { message },
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    /// Bound on every remote call, in milliseconds
    pub remote_timeout_ms: u64,
    /// Entries with stock below this count as low stock
    pub low_stock_threshold: u32,
    /// Serialize mutations that target the same product id
    pub serialize_mutations: bool,
    /// Capacity of the catalog event channel
    pub event_capacity: usize,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::from(&CatalogConfig::default())
    }
}

impl From<&CatalogConfig> for ApplicationConfig {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            remote_timeout_ms: config.timeout_ms(),
            low_stock_threshold: config.catalog.low_stock_threshold,
            serialize_mutations: config.catalog.serialize_mutations,
            event_capacity: 256,
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        ApplicationConfig, ApplicationError, ApplicationResult, CatalogSynchronizer,
        CategoryFilter, GuardDecision, ProductDraft, Route, RouteGuard, SessionManager,
    };
}
