//! Test helpers: an in-memory transport with canned routes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use crate::api::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::api::{ApiClient, ApiError};
use crate::auth::{MemorySessionStore, SessionStore};
use crate::models::User;

enum Canned {
    Respond(HttpResponse),
    Fail(String),
}

/// Records every request and answers from routes keyed by method and path.
/// Unknown routes answer 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Canned>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.on_raw(method, path, status, &body.to_string())
    }

    pub fn on_raw(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        let response = HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        };
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Canned::Respond(response));
        self
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Canned::Fail(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().unwrap().push(request);
        match self.routes.lock().unwrap().get(&key) {
            Some(Canned::Respond(response)) => Ok(response.clone()),
            Some(Canned::Fail(message)) => Err(ApiError::Network(message.clone())),
            None => Ok(HttpResponse {
                status: StatusCode::NOT_FOUND,
                body: json!({"message": "no route", "statusCode": 404}).to_string(),
            }),
        }
    }
}

/// Wrap `data` in the server's success envelope.
pub(crate) fn envelope(data: Value) -> Value {
    json!({"success": true, "data": data, "timestamp": "2025-03-01T10:00:00.000Z"})
}

pub(crate) fn user_json(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "name": format!("User {}", id),
        "email": format!("{}@escola.br", id),
        "role": role,
        "isActive": true,
        "createdAt": "2025-02-10T12:00:00.000Z",
        "updatedAt": "2025-02-10T12:00:00.000Z"
    })
}

pub(crate) fn user(id: &str, role: &str) -> User {
    serde_json::from_value(user_json(id, role)).unwrap()
}

pub(crate) fn post_json(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Post {}", id),
        "content": "Conteúdo",
        "author": "Prof. Carlos",
        "category": "Matemática",
        "tags": ["algebra"],
        "published": true,
        "status": "published",
        "comments": [],
        "createdAt": "2025-02-28T09:00:00Z",
        "updatedAt": "2025-02-28T09:00:00Z"
    })
}

/// A client over a fresh memory store and mock transport.
pub(crate) fn mock_client() -> (ApiClient, Arc<MockTransport>, Arc<MemorySessionStore>) {
    let transport = MockTransport::new();
    let store = Arc::new(MemorySessionStore::new());
    let client = ApiClient::new(transport.clone(), store.clone() as Arc<dyn SessionStore>);
    (client, transport, store)
}
