//! Session Manager
//!
//! Single writer of the session token and its persistent storage. Readers get
//! the last known state synchronously or subscribe to changes.

use super::token_store::{StoredSession, TokenStore};
use crate::catalog::validate_credentials;
use crate::{ApplicationError, ApplicationResult};
use catalog_core::{bounded, AuthToken, Authenticator, Credentials};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Message of every failed sign-in, whatever the cause
pub const SIGN_IN_FAILED: &str = "Sign-in failed";

const DEFAULT_LOGIN_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(AuthToken),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn token(&self) -> Option<&AuthToken> {
        match self {
            SessionState::Authenticated(token) => Some(token),
            SessionState::Unauthenticated => None,
        }
    }
}

pub struct SessionManager {
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    login_timeout_ms: u64,
}

impl SessionManager {
    /// Create a manager in the unauthenticated state; call `restore` next
    pub fn new(authenticator: Arc<dyn Authenticator>, store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            authenticator,
            store,
            state,
            login_timeout_ms: DEFAULT_LOGIN_TIMEOUT_MS,
        }
    }

    pub fn with_login_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.login_timeout_ms = timeout_ms;
        self
    }

    /// Derive the session from persistent storage
    ///
    /// Never fails. Unreadable storage, or storage holding only the legacy
    /// flag, is cleared and leaves the session unauthenticated.
    pub async fn restore(&self) -> SessionState {
        let restored = match self.store.load().await {
            Ok(StoredSession::Token(token)) => SessionState::Authenticated(token),
            Ok(StoredSession::Empty) => SessionState::Unauthenticated,
            Ok(StoredSession::LegacyFlag) => {
                info!("Ignoring legacy authentication flag without a token");
                self.clear_storage().await;
                SessionState::Unauthenticated
            }
            Err(e) => {
                warn!(error = %e, "Session storage unreadable, starting signed out");
                self.clear_storage().await;
                SessionState::Unauthenticated
            }
        };

        debug!(authenticated = restored.is_authenticated(), "Session restored");
        self.state.send_replace(restored.clone());
        restored
    }

    /// Exchange credentials for a token and persist it
    ///
    /// Credentials that fail the sign-in form rules are rejected per field
    /// before any authentication call. Every other failure leaves state and
    /// storage untouched and is reported as the same authentication error.
    pub async fn login(&self, email: &str, password: &str) -> ApplicationResult<()> {
        let credentials = Credentials::new(email.trim(), password);
        validate_credentials(&credentials).map_err(ApplicationError::Validation)?;

        let token = bounded(
            self.authenticator.authenticate(&credentials),
            self.login_timeout_ms,
            "login",
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "Authentication failed");
            ApplicationError::authentication(SIGN_IN_FAILED)
        })?;

        self.store.save(&token).await.map_err(|e| {
            warn!(error = %e, "Could not persist session token");
            ApplicationError::authentication(SIGN_IN_FAILED)
        })?;

        self.state.send_replace(SessionState::Authenticated(token));
        info!(email = %credentials.email, "Signed in");
        Ok(())
    }

    /// Clear storage and state; idempotent and infallible
    pub async fn logout(&self) {
        self.clear_storage().await;
        let previous = self.state.send_replace(SessionState::Unauthenticated);
        if previous.is_authenticated() {
            info!("Signed out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.state.borrow().token().cloned()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    async fn clear_storage(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear session storage");
        }
    }
}
