//! Session-aware API client.
//!
//! Every outbound call goes through `ApiClient::execute`, which attaches the
//! cached bearer token, unwraps the success envelope, and clears the cached
//! session when the server answers 401 to anything but a login/register call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::envelope::unwrap_envelope;
use super::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use super::ApiError;
use crate::auth::SessionStore;

/// Whether a request targets an authentication entry point.
///
/// A failed login or registration must never wipe an unrelated session, so
/// such requests are exempt from session expiry handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointKind {
    #[default]
    Standard,
    AuthEntry,
}

/// A request as seen by services, before credentials are attached.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub kind: EndpointKind,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            kind: EndpointKind::Standard,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Mark this request as a login/register call.
    pub fn auth_entry(mut self) -> Self {
        self.kind = EndpointKind::AuthEntry;
        self
    }
}

/// Check that a resource id is safe to splice into a request path.
///
/// Ids are Mongo ObjectIds or UUIDs; anything carrying `/`, `?`, `#` or other
/// reserved characters would retarget the request and is rejected.
pub fn path_id(id: &str) -> Result<&str, ApiError> {
    let valid = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(ApiError::InvalidRequest(format!("Invalid resource id: {:?}", id)))
    }
}

/// API client for the platform.
/// Clone is cheap - transport and store are shared behind `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, store: Arc<dyn SessionStore>) -> Self {
        Self { transport, store }
    }

    /// Create a client talking to `base_url` over reqwest.
    pub fn connect(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::with_timeout(base_url, timeout)?;
        Ok(Self::new(Arc::new(transport), store))
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Read the cached token. A store failure is not fatal: the request is
    /// sent without credentials and the server decides.
    fn bearer_token(&self) -> Option<String> {
        match self.store.access_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read access token, sending request without it");
                None
            }
        }
    }

    /// Decode a success body. An empty body becomes `null`; non-JSON text is
    /// passed through as a JSON string.
    fn decode_body(body: &str) -> Value {
        if body.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
    }

    /// Drop the cached session after the server rejected its token.
    fn expire_session(&self, path: &str) {
        info!(path = path, "Session expired, clearing cached credentials");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear expired session");
        }
    }

    /// Send a request and return the unwrapped JSON payload.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            kind,
        } = request;

        let bearer = self.bearer_token();
        debug!(
            method = %method,
            path = %path,
            authenticated = bearer.is_some(),
            "Sending request"
        );

        let response = self
            .transport
            .send(HttpRequest {
                method: method.clone(),
                path: path.clone(),
                query,
                bearer,
                body,
            })
            .await
            .inspect_err(|e| warn!(method = %method, path = %path, error = %e, "Request failed"))?;

        if response.status.is_success() {
            debug!(method = %method, path = %path, status = %response.status, "Request succeeded");
            return Ok(unwrap_envelope(Self::decode_body(&response.body)));
        }

        debug!(
            method = %method,
            path = %path,
            status = %response.status,
            "Request returned error status"
        );
        if response.status == StatusCode::UNAUTHORIZED && kind == EndpointKind::Standard {
            self.expire_session(&path);
        }
        Err(ApiError::from_status(response.status, &response.body))
    }

    /// Send a request and deserialize the unwrapped payload.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let context = format!("{} {}", request.method, request.path);
        let value = self.execute(request).await?;
        serde_json::from_value(value).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", context, e))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    /// DELETE, ignoring whatever body the server returns.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(ApiRequest::delete(path)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{envelope, mock_client, user, user_json};
    use serde_json::json;

    #[tokio::test]
    async fn test_attaches_cached_token() {
        let (client, transport, store) = mock_client();
        store.save("abc", None, &user("u1", "student")).unwrap();
        transport.on(Method::GET, "/posts/1", 200, envelope(json!({"id": "1"})));

        let _: Value = client.get("/posts/1").await.unwrap();
        assert_eq!(transport.last_request().bearer.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_sends_without_token_when_anonymous() {
        let (client, transport, _store) = mock_client();
        transport.on(Method::POST, "/auth/login", 200, envelope(json!({})));

        let request = ApiRequest::post("/auth/login")
            .json(&json!({"email": "a@b.c", "password": "x"}))
            .unwrap()
            .auth_entry();
        client.execute(request).await.unwrap();

        let sent = transport.last_request();
        assert!(sent.bearer.is_none());
        assert_eq!(sent.body.unwrap()["email"], "a@b.c");
    }

    #[tokio::test]
    async fn test_unwraps_envelope() {
        let (client, transport, _store) = mock_client();
        transport.on(Method::GET, "/auth/profile", 200, envelope(user_json("u1", "admin")));

        let value = client.execute(ApiRequest::get("/auth/profile")).await.unwrap();
        assert_eq!(value, user_json("u1", "admin"));
    }

    #[tokio::test]
    async fn test_non_envelope_body_passes_through() {
        let (client, transport, _store) = mock_client();
        let raw = json!({"data": [], "total": 0, "page": 1, "limit": 10, "totalPages": 0});
        transport.on(Method::GET, "/posts", 200, raw.clone());
        transport.on_raw(Method::GET, "/health", 200, "ok");
        transport.on_raw(Method::DELETE, "/posts/9", 204, "");

        assert_eq!(client.execute(ApiRequest::get("/posts")).await.unwrap(), raw);
        assert_eq!(client.execute(ApiRequest::get("/health")).await.unwrap(), json!("ok"));
        client.delete("/posts/9").await.unwrap();
    }

    #[tokio::test]
    async fn test_401_on_standard_request_clears_session() {
        let (client, transport, store) = mock_client();
        store.save("abc", Some("refresh"), &user("u1", "teacher")).unwrap();
        transport.on(
            Method::GET,
            "/posts/all",
            401,
            json!({"message": "Unauthorized", "statusCode": 401}),
        );

        let err = client.get::<Value>("/posts/all").await.unwrap_err();
        assert!(err.is_unauthorized());

        let session = store.load().unwrap();
        assert!(session.access_token.is_none());
        assert!(session.refresh_token.is_none());
        assert!(session.user.is_none());

        // Repeated expiry on an empty store is harmless.
        let err = client.get::<Value>("/posts/all").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_401_on_auth_entry_keeps_session() {
        let (client, transport, store) = mock_client();
        store.save("abc", Some("refresh"), &user("u1", "teacher")).unwrap();
        let denied = json!({"message": "Credenciais inválidas"});
        transport.on(Method::POST, "/auth/login", 401, denied);
        transport.on(Method::POST, "/auth/register", 401, json!({"message": "Não autorizado"}));

        for path in ["/auth/login", "/auth/register"] {
            let request = ApiRequest::post(path).json(&json!({})).unwrap().auth_entry();
            let err = client.execute(request).await.unwrap_err();
            assert!(err.is_unauthorized());
        }

        let session = store.load().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("abc"));
        assert_eq!(session.refresh_token.as_deref(), Some("refresh"));
        assert!(session.user.is_some());
    }

    #[tokio::test]
    async fn test_server_error_leaves_session_untouched() {
        let (client, transport, store) = mock_client();
        store.save("abc", None, &user("u1", "student")).unwrap();
        let failure = json!({"message": "Internal server error"});
        transport.on(Method::GET, "/auth/profile", 500, failure);

        let err = client.get::<Value>("/auth/profile").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.message(), Some("Internal server error"));
        assert_eq!(store.load().unwrap().access_token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_other_4xx_leaves_session_untouched() {
        let (client, transport, store) = mock_client();
        store.save("abc", None, &user("u1", "student")).unwrap();
        transport.on(Method::DELETE, "/posts/1", 403, json!({"message": "Forbidden resource"}));

        let err = client.delete("/posts/1").await.unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));
        assert!(store.load().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_network_failure_propagates_without_mutation() {
        let (client, transport, store) = mock_client();
        store.save("abc", None, &user("u1", "student")).unwrap();
        transport.fail(Method::GET, "/posts/all", "connection reset");

        let err = client.get::<Value>("/posts/all").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(store.load().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_invalid_response() {
        let (client, transport, _store) = mock_client();
        transport.on(Method::GET, "/auth/users/u1", 200, envelope(json!({"unexpected": true})));

        let err = client.get::<crate::models::User>("/auth/users/u1").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_path_id() {
        assert_eq!(path_id("65f1c0de9a1b2c3d4e5f6789").unwrap(), "65f1c0de9a1b2c3d4e5f6789");
        assert!(path_id("22b210e3-d325-41be-b761-31e18bfe2c73").is_ok());
        assert!(path_id("user_1").is_ok());

        for bad in ["", "p1/comments", "../auth/users", "p1?limit=1", "p1#x", "p 1", "a%2Fb"] {
            assert!(
                matches!(path_id(bad), Err(ApiError::InvalidRequest(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("/posts").query("page", 2).query("limit", 15);
        assert_eq!(request.kind, EndpointKind::Standard);
        assert_eq!(
            request.query,
            vec![("page".to_string(), "2".to_string()), ("limit".to_string(), "15".to_string())]
        );
    }
}
