//! Error types for the Graph photo-sorting client.
//!
//! All public API surfaces in this crate return `GraphResult<T>`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convenience alias.
pub type GraphResult<T> = Result<T, GraphError>;

/// Error codes for Graph operations and the sorting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphErrorCode {
    /// Device-code flow failed to start or finished unexpectedly.
    AuthFailed,
    /// The user declined consent during the device-code flow.
    AuthDeclined,
    /// The device code expired before the user finished signing in.
    AuthExpired,
    /// The device code was already redeemed (`invalid_grant`).
    DeviceCodeReused,
    /// The bearer token was rejected (`InvalidAuthenticationToken`).
    TokenInvalid,
    /// Azure AD app registration does not support consumer accounts.
    TenantMisconfigured,
    /// Resource not found (HTTP 404).
    NotFound,
    /// Name collision (HTTP 409).
    Conflict,
    /// Rate-limited (HTTP 429).
    RateLimited,
    /// A batched path-creation step returned a non-success status.
    PathResolution,
    /// Record carries no capture timestamp.
    TimestampMissing,
    /// Network / connectivity error.
    NetworkError,
    /// (De)serialization error.
    SerializationError,
    /// Any other non-2xx response, surfaced for the caller to interpret.
    RequestFailed,
    /// Catch-all internal error.
    InternalError,
}

impl fmt::Display for GraphErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error returned by every public function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphError {
    pub code: GraphErrorCode,
    pub message: String,
    /// HTTP status of the failing response, when there was one.
    pub status: Option<u16>,
    /// Machine-readable error code from the Graph error envelope.
    pub graph_error_code: Option<String>,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref gc) = self.graph_error_code {
            write!(f, " (graph: {})", gc)?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphError {}

impl GraphError {
    /// Create from a code + message.
    pub fn new(code: GraphErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status: None,
            graph_error_code: None,
        }
    }

    /// Shortcut: auth failure.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::AuthFailed, msg)
    }

    /// Shortcut: network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::NetworkError, msg)
    }

    /// Shortcut: internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::InternalError, msg)
    }

    /// Shortcut: not found.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::NotFound, msg)
    }

    /// Shortcut: failed batched path creation.
    pub fn path_resolution(msg: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::PathResolution, msg)
    }

    /// Shortcut: record without a capture timestamp.
    pub fn timestamp_missing(name: Option<&str>, id: &str) -> Self {
        Self::new(
            GraphErrorCode::TimestampMissing,
            format!(
                "No capture timestamp on item {:?} ({})",
                name.unwrap_or("<unnamed>"),
                id
            ),
        )
    }

    /// Whether this error terminates a run (authentication / tenant trouble
    /// that no amount of continuing will fix).
    pub fn is_fatal_auth(&self) -> bool {
        matches!(
            self.code,
            GraphErrorCode::AuthFailed
                | GraphErrorCode::AuthDeclined
                | GraphErrorCode::AuthExpired
                | GraphErrorCode::DeviceCodeReused
                | GraphErrorCode::TokenInvalid
                | GraphErrorCode::TenantMisconfigured
        )
    }

    /// Build an error from a Graph API error response body.
    ///
    /// Two payloads get dedicated codes because they imply a specific user
    /// remediation: the consumer-tenant licensing 400 and the invalid-token
    /// 401.  Everything else maps to a generic status-driven code and is
    /// left for the caller to interpret.
    pub fn from_graph_response(status: u16, body: &str) -> Self {
        let (graph_code, graph_msg) = Self::parse_graph_error_body(body);

        if status == 400
            && graph_msg.as_deref() == Some("Tenant does not have a SPO license.")
        {
            return Self {
                code: GraphErrorCode::TenantMisconfigured,
                message: "Incorrect Azure AD settings: supported account types must include consumers".into(),
                status: Some(status),
                graph_error_code: graph_code,
            };
        }

        if status == 401 && graph_code.as_deref() == Some("InvalidAuthenticationToken") {
            return Self {
                code: GraphErrorCode::TokenInvalid,
                message: graph_msg
                    .unwrap_or_else(|| "Bearer token rejected".into()),
                status: Some(status),
                graph_error_code: graph_code,
            };
        }

        let code = match status {
            404 => GraphErrorCode::NotFound,
            409 => GraphErrorCode::Conflict,
            429 => GraphErrorCode::RateLimited,
            _ if status >= 500 => GraphErrorCode::InternalError,
            _ => GraphErrorCode::RequestFailed,
        };

        let message = graph_msg
            .unwrap_or_else(|| format!("Graph API error (HTTP {})", status));

        Self {
            code,
            message,
            status: Some(status),
            graph_error_code: graph_code,
        }
    }

    /// Extract `{ "error": { "code": "...", "message": "..." } }`.
    fn parse_graph_error_body(body: &str) -> (Option<String>, Option<String>) {
        let Ok(v) = serde_json::from_str::<serde_json::Value>(body) else {
            return (None, None);
        };
        let err = &v["error"];
        let code = err["code"].as_str().map(String::from);
        let msg = err["message"].as_str().map(String::from);
        (code, msg)
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {}", err))
        } else {
            Self::internal(format!("HTTP error: {}", err))
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(
            GraphErrorCode::SerializationError,
            format!("JSON error: {}", err),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
