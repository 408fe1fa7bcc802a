//! Core library for conecta.
//!
//! A thin client for the Conecta Saber school content platform. The pieces
//! that carry state are:
//!
//! - [`auth`]: the persisted session (access token, refresh token, cached user)
//! - [`api`]: the request pipeline that attaches the token, unwraps the
//!   success envelope and clears the session on expiry
//!
//! [`services`] wrap individual endpoints on top of the client.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod services;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionStore, StoredSession};
pub use config::Config;
