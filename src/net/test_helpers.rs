//! Scripted HTTP transport for exercising the client without a network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use super::client::ApiClient;
use super::error::ApiError;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use crate::session::broadcast::SessionBroadcaster;
use crate::storage::tokens::TokenStore;

pub(crate) const TEST_BASE_URL: &str = "http://pulso.test/api";

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync>;

struct Route {
    handler: Handler,
    delay: Option<Duration>,
}

/// Routes keyed by `(method, path below TEST_BASE_URL)`. Unknown routes answer 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on<F>(self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    {
        self.insert(method, path, Box::new(handler), None);
        self
    }

    /// Like [`MockTransport::on`] but the response is held back for `delay`.
    pub(crate) fn on_delayed<F>(self, method: Method, path: &str, delay: Duration, handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    {
        self.insert(method, path, Box::new(handler), Some(delay));
        self
    }

    fn insert(&self, method: Method, path: &str, handler: Handler, delay: Option<Duration>) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Route { handler, delay });
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self, method: Method, path: &str) -> usize {
        let url = format!("{TEST_BASE_URL}{path}");
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let path = request
            .url
            .strip_prefix(TEST_BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        self.requests.lock().unwrap().push(request.clone());

        let key = (request.method, path);
        let delay = self
            .routes
            .lock()
            .unwrap()
            .get(&key)
            .and_then(|r| r.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let routes = self.routes.lock().unwrap();
        match routes.get(&key) {
            Some(route) => (route.handler)(&request),
            None => json(404, serde_json::json!({ "detail": format!("no mock for {} {}", key.0, key.1) })),
        }
    }
}

pub(crate) fn json(status: u16, body: Value) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse { status, body: body.to_string() })
}

pub(crate) fn raw(status: u16, body: &str) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse { status, body: body.to_string() })
}

pub(crate) fn bearer(request: &HttpRequest) -> Option<&str> {
    request
        .header("Authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub(crate) fn body_json(request: &HttpRequest) -> Value {
    request
        .body
        .as_deref()
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or(Value::Null)
}

pub(crate) fn client_with(transport: &Arc<MockTransport>) -> ApiClient {
    ApiClient::new(
        TEST_BASE_URL,
        Arc::clone(transport) as Arc<dyn HttpTransport>,
        Arc::new(TokenStore::in_memory()),
        SessionBroadcaster::new(),
    )
}

pub(crate) fn user_json(id: &str, email: &str, name: &str) -> Value {
    serde_json::json!({ "id": id, "email": email, "name": name })
}

pub(crate) fn profile_json(id: &str, name: &str) -> Value {
    serde_json::json!({
        "id": id,
        "user_id": "u1",
        "name": name,
        "description": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

/// `POST /auth/login` answering `T1`/`R1` and `GET /auth/me` answering user `u1`
/// when called with `Bearer T1`.
pub(crate) fn sign_in_routes(transport: MockTransport) -> MockTransport {
    transport
        .on(Method::Post, "/auth/login", |_| {
            json(200, serde_json::json!({ "access_token": "T1", "refresh_token": "R1", "token_type": "bearer" }))
        })
        .on(Method::Get, "/auth/me", |req| {
            if bearer(req) == Some("T1") {
                json(200, user_json("u1", "a@b.com", "A"))
            } else {
                json(401, serde_json::json!({ "detail": "Not authenticated" }))
            }
        })
}
