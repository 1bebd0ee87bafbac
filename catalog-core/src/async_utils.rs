//! Async utilities
//!
//! Bounded waiting for remote calls

use crate::error::{CatalogError, CatalogResult, ErrorContext};
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Timeout wrapper for async operations
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> CatalogResult<T>
where
    F: std::future::Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => {
            warn!(operation = operation_name, timeout_ms, "Operation timed out");
            Err(CatalogError::Timeout {
                operation: operation_name.to_string(),
                duration_ms: timeout_ms,
                context: ErrorContext::new("async_utils")
                    .with_operation("timeout")
                    .with_metadata("timeout_ms", &timeout_ms.to_string())
                    .with_suggestion("Check network connectivity")
                    .with_suggestion("Verify the catalog API is reachable"),
            })
        }
    }
}

/// Run a fallible remote call under a timeout, folding the elapsed case into
/// the same error channel as the call itself
pub async fn bounded<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> CatalogResult<T>
where
    F: std::future::Future<Output = CatalogResult<T>>,
{
    with_timeout(future, timeout_ms, operation_name).await?
}
