//! Token persistence
//!
//! The session token lives in a small JSON key-value document, the CLI's
//! equivalent of browser local storage. Other keys in the document are
//! preserved.

use crate::{ApplicationError, ApplicationResult};
use async_trait::async_trait;
use catalog_core::AuthToken;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "authToken";
/// Key of the boolean flag written by older clients
pub const LEGACY_FLAG_KEY: &str = "isAuthenticated";

/// What persistent storage holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSession {
    Token(AuthToken),
    /// Only the legacy flag is present; it does not authenticate
    LegacyFlag,
    Empty,
}

impl StoredSession {
    fn from_entries(token: Option<&str>, legacy_flag: bool) -> Self {
        match token.and_then(AuthToken::new) {
            Some(token) => StoredSession::Token(token),
            None if legacy_flag => StoredSession::LegacyFlag,
            None => StoredSession::Empty,
        }
    }
}

/// Persistence backend for the session token
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the stored session; unreadable storage is an error
    async fn load(&self) -> ApplicationResult<StoredSession>;

    /// Persist the token, dropping any legacy flag
    async fn save(&self, token: &AuthToken) -> ApplicationResult<()>;

    /// Remove the token and the legacy flag; clearing empty storage succeeds
    async fn clear(&self) -> ApplicationResult<()>;
}

/// Token document on disk
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> ApplicationResult<Option<Map<String, Value>>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ApplicationError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Some(Map::new()));
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(ApplicationError::storage(format!(
                "Session document {} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> ApplicationResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json_data = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, json_data).await?;
        Ok(())
    }

    async fn remove_file(&self) -> ApplicationResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApplicationError::Io(e)),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> ApplicationResult<StoredSession> {
        let Some(document) = self.read_document().await? else {
            return Ok(StoredSession::Empty);
        };

        let stored = StoredSession::from_entries(
            document.get(TOKEN_KEY).and_then(Value::as_str),
            document.contains_key(LEGACY_FLAG_KEY),
        );
        debug!(path = %self.path.display(), ?stored, "Loaded session document");
        Ok(stored)
    }

    async fn save(&self, token: &AuthToken) -> ApplicationResult<()> {
        // A corrupt document is replaced rather than blocking sign-in
        let mut document = self.read_document().await.ok().flatten().unwrap_or_default();
        document.insert(TOKEN_KEY.to_string(), Value::String(token.as_str().to_string()));
        document.remove(LEGACY_FLAG_KEY);

        self.write_document(&document).await?;
        debug!(path = %self.path.display(), "Saved session token");
        Ok(())
    }

    async fn clear(&self) -> ApplicationResult<()> {
        let mut document = match self.read_document().await {
            Ok(Some(document)) => document,
            Ok(None) => return Ok(()),
            Err(_) => return self.remove_file().await,
        };

        document.remove(TOKEN_KEY);
        document.remove(LEGACY_FLAG_KEY);

        if document.is_empty() {
            self.remove_file().await?;
        } else {
            self.write_document(&document).await?;
        }
        debug!(path = %self.path.display(), "Cleared session token");
        Ok(())
    }
}

/// In-process token storage
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a raw entry, e.g. a legacy flag
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store
            .entries
            .get_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// Make subsequent `save` and `clear` calls fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    fn check_writable(&self) -> ApplicationResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(ApplicationError::storage("Token storage is read-only"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> ApplicationResult<StoredSession> {
        let entries = self.entries.read().await;
        Ok(StoredSession::from_entries(
            entries.get(TOKEN_KEY).map(String::as_str),
            entries.contains_key(LEGACY_FLAG_KEY),
        ))
    }

    async fn save(&self, token: &AuthToken) -> ApplicationResult<()> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        entries.insert(TOKEN_KEY.to_string(), token.as_str().to_string());
        entries.remove(LEGACY_FLAG_KEY);
        Ok(())
    }

    async fn clear(&self) -> ApplicationResult<()> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        entries.remove(TOKEN_KEY);
        entries.remove(LEGACY_FLAG_KEY);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token(raw: &str) -> AuthToken {
        AuthToken::new(raw).unwrap()
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/session.json"));

        assert_eq!(store.load().await.unwrap(), StoredSession::Empty);

        store.save(&token("abc")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), StoredSession::Token(token("abc")));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"authToken\": \"abc\""));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), StoredSession::Empty);
        assert!(!store.path().exists());

        // Idempotent
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn file_store_preserves_unrelated_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"theme":"dark","isAuthenticated":"true"}"#).unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.load().await.unwrap(), StoredSession::LegacyFlag);

        store.save(&token("t1")).await.unwrap();
        store.clear().await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("theme"));
        assert!(!raw.contains("isAuthenticated"));
        assert!(!raw.contains("authToken"));
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.load().await.is_err());

        store.clear().await.unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn empty_token_is_not_a_session() {
        let store = MemoryTokenStore::with_entry(TOKEN_KEY, "  ");
        let loaded = tokio_test::block_on(store.load()).unwrap();
        assert_eq!(loaded, StoredSession::Empty);
    }

    #[tokio::test]
    async fn memory_store_write_failures() {
        let store = MemoryTokenStore::new();
        store.set_fail_writes(true);
        assert!(store.save(&token("x")).await.is_err());
        assert_eq!(store.raw(TOKEN_KEY).await, None);
    }
}
