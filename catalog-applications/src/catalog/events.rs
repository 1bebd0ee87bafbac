//! Catalog change notifications

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOperation {
    Load,
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CatalogOperation::Load => "load",
            CatalogOperation::Get => "get",
            CatalogOperation::Create => "create",
            CatalogOperation::Update => "update",
            CatalogOperation::Delete => "delete",
        })
    }
}

/// Broadcast after every change to, or failed attempt on, the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    /// A load replaced the cache
    Loaded { ticket: u64, count: usize },
    /// A load resolved after a newer one had already been applied
    LoadDiscarded { ticket: u64, newest: u64 },
    Created { id: String },
    Updated { id: String },
    Deleted { id: String },
    Failed {
        operation: CatalogOperation,
        id: Option<String>,
        message: String,
    },
}
