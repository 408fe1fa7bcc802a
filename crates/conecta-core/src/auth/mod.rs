//! Authentication session persistence.
//!
//! This module provides:
//! - `SessionStore`: the save/load/clear contract for the cached session
//! - `FileSessionStore`: one file per key under the cache directory
//! - `KeyringSessionStore`: OS-level keychain storage via keyring
//! - `MemorySessionStore`: process-local storage
//!
//! The session holds the access token, refresh token and last-known user
//! under the keys `auth.accessToken`, `auth.refreshToken` and `auth.user`.

pub mod keychain;
pub mod session;

pub use keychain::KeyringSessionStore;
pub use session::{
    FileSessionStore, MemorySessionStore, SessionError, SessionStore, StoredSession,
    ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY,
};
