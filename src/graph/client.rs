//! HTTP client for the Microsoft Graph API.
//!
//! Wraps an `HttpTransport` with Bearer-token injection, a monotonically
//! increasing request counter, and translation of well-known Graph error
//! payloads into domain failures.  There is deliberately **no** automatic
//! retry here; retry policy belongs to callers.

use crate::graph::auth;
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::token_store::TokenStore;
use crate::graph::transport::{HttpRequest, HttpTransport};
use crate::graph::types::GraphConfig;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Authenticated Graph API client.
///
/// The bearer token is written once at construction and read-only
/// thereafter; the request counter is atomic because the orchestrator and
/// the move-queue worker issue calls concurrently.
pub struct GraphClient {
    transport: Arc<dyn HttpTransport>,
    token: String,
    base_url: String,
    requests_made: AtomicU64,
}

impl GraphClient {
    /// Create a client from an already-acquired token.
    pub fn new(transport: Arc<dyn HttpTransport>, token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            token: token.into(),
            base_url: base_url.into(),
            requests_made: AtomicU64::new(0),
        }
    }

    /// Create a client by loading the cached token or running the
    /// device-code flow (persisting the fresh token on success).
    pub async fn connect(
        transport: Arc<dyn HttpTransport>,
        config: &GraphConfig,
        on_prompt: impl FnOnce(&str),
    ) -> GraphResult<Self> {
        let store = TokenStore::new(&config.token_cache_path);
        let token = auth::obtain_token(transport.as_ref(), config, &store, on_prompt).await?;
        Ok(Self::new(transport, token, config.graph_base_url.clone()))
    }

    /// Total remote calls made through this client.
    pub fn requests_made(&self) -> u64 {
        self.requests_made.load(Ordering::Relaxed)
    }

    /// Full URL for a Graph endpoint path.  Absolute URLs (`nextLink`)
    /// pass through untouched.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Perform one Graph call: inject the bearer token, bump the request
    /// counter exactly once regardless of outcome, and translate non-2xx
    /// responses into `GraphError`s.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> GraphResult<serde_json::Value> {
        let url = self.url(path);
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        debug!("{} {}", method, url);

        let mut request = HttpRequest::new(method, &url)
            .with_bearer(&self.token)
            .with_query(query);
        if let Some(json) = body {
            request = request.with_json(json);
        }

        let resp = self.transport.send(request).await?;
        if !resp.is_success() {
            return Err(GraphError::from_graph_response(resp.status, &resp.body));
        }
        resp.into_json()
    }

    /// GET with optional query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> GraphResult<serde_json::Value> {
        self.request("GET", path, query, None).await
    }

    /// POST a JSON body.
    pub async fn post(&self, path: &str, body: serde_json::Value) -> GraphResult<serde_json::Value> {
        self.request("POST", path, &[], Some(body)).await
    }

    /// PATCH a JSON body.
    pub async fn patch(&self, path: &str, body: serde_json::Value) -> GraphResult<serde_json::Value> {
        self.request("PATCH", path, &[], Some(body)).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
