use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::User;

/// Key holding the bearer access token.
pub const ACCESS_TOKEN_KEY: &str = "auth.accessToken";

/// Key holding the (currently unused) refresh token.
pub const REFRESH_TOKEN_KEY: &str = "auth.refreshToken";

/// Key holding the JSON-serialized user snapshot.
pub const USER_KEY: &str = "auth.user";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize session data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Whatever subset of the session keys is currently persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

impl StoredSession {
    /// A session exists only when an access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }

    /// Build a session from raw key values. An unreadable user snapshot is dropped.
    pub(crate) fn from_raw(
        access_token: Option<String>,
        refresh_token: Option<String>,
        user_json: Option<String>,
    ) -> Self {
        let user = user_json.and_then(|raw| match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached user");
                None
            }
        });
        Self {
            access_token: access_token.filter(|t| !t.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            user,
        }
    }
}

/// Durable key-value persistence of the current authentication session.
///
/// Implementations must tolerate missing keys on every operation. `clear`
/// is idempotent and succeeds on an already-empty store.
pub trait SessionStore: Send + Sync {
    /// Persist a session. A `None` refresh token removes any stale one.
    fn save(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        user: &User,
    ) -> Result<(), SessionError>;

    /// Load whatever keys are present.
    fn load(&self) -> Result<StoredSession, SessionError>;

    /// Remove all session keys.
    fn clear(&self) -> Result<(), SessionError>;

    /// Current access token, if any.
    fn access_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.access_token)
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// Stores each key in its own file under a session directory.
///
/// Writes go through a temp file and rename. The access token is written
/// last and removed first, so a reader never sees a token without the user
/// snapshot that came with it.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn write_key(&self, key: &str, value: &str) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.key_path(key);
        let tmp = self.dir.join(format!(".{}.tmp", key));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read_key(&self, key: &str) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_key(&self, key: &str) -> Result<(), SessionError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        user: &User,
    ) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(user)?;
        self.write_key(USER_KEY, &user_json)?;
        match refresh_token {
            Some(token) => self.write_key(REFRESH_TOKEN_KEY, token)?,
            None => self.remove_key(REFRESH_TOKEN_KEY)?,
        }
        self.write_key(ACCESS_TOKEN_KEY, access_token)?;
        debug!(dir = %self.dir.display(), "Session saved");
        Ok(())
    }

    fn load(&self) -> Result<StoredSession, SessionError> {
        Ok(StoredSession::from_raw(
            self.read_key(ACCESS_TOKEN_KEY)?,
            self.read_key(REFRESH_TOKEN_KEY)?,
            self.read_key(USER_KEY)?,
        ))
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.remove_key(ACCESS_TOKEN_KEY)?;
        self.remove_key(REFRESH_TOKEN_KEY)?;
        self.remove_key(USER_KEY)?;
        debug!(dir = %self.dir.display(), "Session cleared");
        Ok(())
    }

    fn access_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.read_key(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<&'static str, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, String>> {
        // A poisoned map still holds plain strings; keep using it.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn save(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        user: &User,
    ) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(user)?;
        let mut entries = self.entries();
        entries.insert(USER_KEY, user_json);
        match refresh_token {
            Some(token) => entries.insert(REFRESH_TOKEN_KEY, token.to_string()),
            None => entries.remove(REFRESH_TOKEN_KEY),
        };
        entries.insert(ACCESS_TOKEN_KEY, access_token.to_string());
        Ok(())
    }

    fn load(&self) -> Result<StoredSession, SessionError> {
        let entries = self.entries();
        Ok(StoredSession::from_raw(
            entries.get(ACCESS_TOKEN_KEY).cloned(),
            entries.get(REFRESH_TOKEN_KEY).cloned(),
            entries.get(USER_KEY).cloned(),
        ))
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.entries().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let json = r#"{"id":"u1","name":"Maria","email":"maria@escola.br","role":"teacher"}"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_file_store_round_trip_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session"));
        store.save("abc", Some("refresh"), &user()).unwrap();

        // A fresh instance over the same directory sees the same session.
        let reopened = FileSessionStore::new(dir.path().join("session"));
        let session = reopened.load().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("abc"));
        assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(session.user, Some(user()));
        assert_eq!(reopened.access_token().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("never-created"));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());

        store.save("abc", None, &user()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_without_refresh_token_drops_stale_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.save("first", Some("old-refresh"), &user()).unwrap();
        store.save("second", None, &user()).unwrap();

        let session = store.load().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("second"));
        assert!(session.refresh_token.is_none());
    }

    #[test]
    fn test_missing_access_token_means_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.save("abc", None, &user()).unwrap();
        // Simulate a torn clear that only got as far as the token.
        std::fs::remove_file(dir.path().join(ACCESS_TOKEN_KEY)).unwrap();

        let session = store.load().unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user.is_some());
    }

    #[test]
    fn test_corrupt_user_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ACCESS_TOKEN_KEY), "abc").unwrap();
        std::fs::write(dir.path().join(USER_KEY), "undefined").unwrap();

        let store = FileSessionStore::new(dir.path().to_path_buf());
        let session = store.load().unwrap();
        assert!(session.is_authenticated());
        assert!(session.user.is_none());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.access_token().unwrap().is_none());
        store.clear().unwrap();

        store.save("abc", Some("r"), &user()).unwrap();
        let session = store.load().unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user.map(|u| u.id), Some("u1".to_string()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
