//! Mock vidtube API server for testing.
//!
//! The server listens on a random local port and answers requests from a table of canned
//! responses keyed by method and path. Every request it receives is recorded so tests can
//! assert on what the client actually sent (including the session cookie).
//!
//! Responses queued for the same route are served in order; the last one keeps being served
//! until another response is queued for that route. Unknown routes get a 404 with a JSON
//! `message`.

use crate::api::ApiClient;
use crate::config::ClientConfig;
use bytes::Bytes;
use eyre::Context;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A canned response.
#[derive(Debug, Clone)]
struct MockResponse {
    status: StatusCode,
    body: serde_json::Value,
    set_cookie: Option<String>,
    /// Whether this response has been sent at least once.
    served: bool,
}

/// A request received by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Request path, without the query string.
    pub path: String,
    /// The `Cookie` header, if the client sent one.
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body parsed as JSON, or `null` if it is not JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<(Method, String), VecDeque<MockResponse>>,
    requests: Vec<RecordedRequest>,
}

/// Handle to a running mock API server.
///
/// The server task keeps running until the test's runtime shuts down.
#[derive(Debug, Clone)]
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    /// Binds to a random local port and starts serving.
    pub async fn start() -> eyre::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind to localhost")?;
        let addr = listener.local_addr().context("get local address")?;
        let state = Arc::new(Mutex::new(MockState::default()));

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let conn = match listener.accept().await {
                    Ok((conn, _)) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "mock API failed to accept connection");
                        continue;
                    }
                };
                let conn = hyper_util::rt::TokioIo::new(conn);
                let state = Arc::clone(&server_state);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle(state, req).await) }
                    });
                    if let Err(e) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(conn, service)
                        .await
                    {
                        tracing::debug!(error = %e, "mock API connection ended with error");
                    }
                });
            }
        });

        tracing::debug!(%addr, "mock API listening");
        Ok(Self { addr, state })
    }

    /// Base URL to point a [`ClientConfig`] at.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A fresh client (with its own cookie store) talking to this server.
    pub fn client(&self) -> ApiClient {
        let config = ClientConfig::new(self.base_url()).expect("mock base URL is valid");
        ApiClient::new(&config).expect("client for mock API builds")
    }

    /// Queues a JSON response for `method path`.
    pub async fn respond(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.push(method, path, status, body, None).await;
    }

    /// Queues a JSON response that also sets a cookie.
    pub async fn respond_with_cookie(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: serde_json::Value,
        set_cookie: &str,
    ) {
        self.push(method, path, status, body, Some(set_cookie.to_string()))
            .await;
    }

    async fn push(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: serde_json::Value,
        set_cookie: Option<String>,
    ) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        let mut state = self.state.lock().await;
        let queue = state.routes.entry((method, path.to_string())).or_default();
        // a sticky response that was already sent gives way to the new one
        queue.retain(|r| !r.served);
        queue.push_back(MockResponse {
            status,
            body,
            set_cookie,
            served: false,
        });
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn last_request(&self) -> Option<RecordedRequest> {
        self.state.lock().await.requests.last().cloned()
    }

    /// How many times `method path` was requested.
    pub async fn request_count(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

async fn handle(state: Arc<Mutex<MockState>>, req: Request<body::Incoming>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let header = |name: http::header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let cookie = header(http::header::COOKIE);
    let content_type = header(http::header::CONTENT_TYPE);
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "mock API failed to read request body");
            Bytes::new()
        }
    };

    let mut state = state.lock().await;
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        cookie,
        content_type,
        body,
    });

    let canned = state.routes.get_mut(&(method, path)).and_then(|queue| {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            let last = queue.front_mut()?;
            last.served = true;
            Some(last.clone())
        }
    });
    let canned = canned.unwrap_or_else(|| MockResponse {
        status: StatusCode::NOT_FOUND,
        body: serde_json::json!({ "message": "no such route" }),
        set_cookie: None,
        served: true,
    });

    let mut response = Response::new(Full::new(Bytes::from(canned.body.to_string())));
    *response.status_mut() = canned.status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    if let Some(cookie) = canned.set_cookie {
        match http::HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response
                    .headers_mut()
                    .insert(http::header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "mock API given an invalid cookie"),
        }
    }
    response
}
