//! Catalog Client - Remote collaborators for the catalog admin
//!
//! Talks to the catalog HTTP API, or serves an in-memory catalog seeded with
//! built-in data when no backend is available

pub mod api;
pub mod seed;

pub use api::*;
pub use seed::*;
