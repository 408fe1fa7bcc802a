use keyring::Entry;
use tracing::debug;

use super::session::{
    SessionError, SessionStore, StoredSession, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY,
};
use crate::models::User;

const SERVICE_NAME: &str = "conecta";

/// Session store backed by the OS keychain, one entry per session key.
///
/// Entries are opened once and reused, so every read and write for a key
/// goes through the same credential handle.
pub struct KeyringSessionStore {
    service: String,
    access_token: Entry,
    refresh_token: Entry,
    user: Entry,
}

impl KeyringSessionStore {
    pub fn new() -> Result<Self, SessionError> {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name (e.g. one per API environment).
    pub fn with_service(service: impl Into<String>) -> Result<Self, SessionError> {
        let service = service.into();
        Ok(Self {
            access_token: Entry::new(&service, ACCESS_TOKEN_KEY)?,
            refresh_token: Entry::new(&service, REFRESH_TOKEN_KEY)?,
            user: Entry::new(&service, USER_KEY)?,
            service,
        })
    }

    fn get(entry: &Entry) -> Result<Option<String>, SessionError> {
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(entry: &Entry) -> Result<(), SessionError> {
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for KeyringSessionStore {
    fn save(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        user: &User,
    ) -> Result<(), SessionError> {
        self.user.set_password(&serde_json::to_string(user)?)?;
        match refresh_token {
            Some(token) => self.refresh_token.set_password(token)?,
            None => Self::delete(&self.refresh_token)?,
        }
        self.access_token.set_password(access_token)?;
        debug!(service = %self.service, "Session saved to keychain");
        Ok(())
    }

    fn load(&self) -> Result<StoredSession, SessionError> {
        Ok(StoredSession::from_raw(
            Self::get(&self.access_token)?,
            Self::get(&self.refresh_token)?,
            Self::get(&self.user)?,
        ))
    }

    fn clear(&self) -> Result<(), SessionError> {
        Self::delete(&self.access_token)?;
        Self::delete(&self.refresh_token)?;
        Self::delete(&self.user)?;
        debug!(service = %self.service, "Session removed from keychain");
        Ok(())
    }

    fn access_token(&self) -> Result<Option<String>, SessionError> {
        Ok(Self::get(&self.access_token)?.filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user;

    // The mock backend keeps each credential inside its `Entry`, so these
    // tests only pass when the store reuses one entry per key.
    fn mock_store(service: &str) -> KeyringSessionStore {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringSessionStore::with_service(service).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let store = mock_store("conecta-test-roundtrip");
        store.save("abc", Some("r1"), &user("u1", "teacher")).unwrap();

        let session = store.load().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("abc"));
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert_eq!(session.user, Some(user("u1", "teacher")));
        assert_eq!(store.access_token().unwrap().as_deref(), Some("abc"));

        // Saving without a refresh token drops the stale one.
        store.save("def", None, &user("u1", "teacher")).unwrap();
        let session = store.load().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("def"));
        assert!(session.refresh_token.is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = mock_store("conecta-test-clear");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());

        store.save("abc", Some("r1"), &user("u1", "student")).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(store.access_token().unwrap().is_none());

        store.clear().unwrap();
    }
}
