//! Catalog
//!
//! Local cache of the product collection and everything derived from it.

pub mod events;
pub mod filter;
pub mod stats;
pub mod synchronizer;
pub mod validation;

pub use events::{CatalogEvent, CatalogOperation};
pub use filter::{filter_products, CategoryFilter};
pub use stats::CatalogStats;
pub use synchronizer::{CatalogSynchronizer, LoadOutcome};
pub use validation::{validate_credentials, FieldViolation, ProductDraft, ValidationErrors};
