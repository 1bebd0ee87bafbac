//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the catalog workspace
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Remote error: {message}")]
    Remote {
        message: String,
        status: Option<u16>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Decode error: {message}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl CatalogError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            CatalogError::Validation { context, .. } => Some(context),
            CatalogError::Authentication { context, .. } => Some(context),
            CatalogError::Remote { context, .. } => Some(context),
            CatalogError::NotFound { context, .. } => Some(context),
            CatalogError::Network { context, .. } => Some(context),
            CatalogError::Timeout { context, .. } => Some(context),
            CatalogError::Decode { context, .. } => Some(context),
            CatalogError::Config { context, .. } => Some(context),
            CatalogError::Storage { context, .. } => Some(context),
            CatalogError::Internal { context, .. } => Some(context),
            CatalogError::Io(_) | CatalogError::Serialization(_) => None,
        }
    }

    /// Check if error is recoverable by re-issuing the same operation
    pub fn is_recoverable(&self) -> bool {
        match self {
            CatalogError::Network { .. } => true,
            CatalogError::Timeout { .. } => true,
            CatalogError::Remote { status, .. } => status.map_or(true, |s| s >= 500),
            CatalogError::Authentication { .. } => false,
            CatalogError::Config { .. } => false,
            CatalogError::Validation { .. } => false,
            CatalogError::NotFound { .. } => false,
            CatalogError::Decode { .. } => false,
            _ => false,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            CatalogError::Internal { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            CatalogError::Config { .. } | CatalogError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            CatalogError::Network { .. } | CatalogError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network or timeout error (may be recoverable)"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! remote_error {
    ($msg:expr, $component:expr) => {
        $crate::CatalogError::Remote {
            message: $msg.to_string(),
            status: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $status:expr) => {
        $crate::CatalogError::Remote {
            message: $msg.to_string(),
            status: Some($status),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::CatalogError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'catalog config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::CatalogError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::CatalogError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Reload the catalog; the product may have been removed"),
        }
    };
}

#[macro_export]
macro_rules! authentication_error {
    ($msg:expr, $component:expr) => {
        $crate::CatalogError::Authentication {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component).with_suggestion("Sign in again"),
        }
    };
}
