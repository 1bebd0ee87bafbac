//! Authentication
//!
//! Session lifecycle, token persistence and route guarding.

pub mod guard;
pub mod session;
pub mod token_store;

pub use guard::{GuardDecision, Route, RouteGuard};
pub use session::{SessionManager, SessionState, SIGN_IN_FAILED};
pub use token_store::{FileTokenStore, MemoryTokenStore, StoredSession, TokenStore};
