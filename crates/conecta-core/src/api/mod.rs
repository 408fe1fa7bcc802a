//! REST API client module for the Conecta Saber platform.
//!
//! This module provides the `ApiClient`, the single chokepoint for
//! outbound requests. It attaches the cached bearer token, unwraps the
//! `{ success, data, timestamp }` envelope, and treats a 401 outside the
//! login/register endpoints as session expiry.

pub mod client;
pub mod envelope;
pub mod error;
pub mod transport;

pub use client::{path_id, ApiClient, ApiRequest, EndpointKind};
pub use envelope::unwrap_envelope;
pub use error::ApiError;
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, DEFAULT_API_URL,
};
