//! # graph — Microsoft Graph / OneDrive client plumbing
//!
//! Everything needed to talk to a OneDrive account through the Microsoft
//! Graph v1.0 API for the photo sorter:
//!
//! - **Authentication** – OAuth2 device-code flow with distinct terminal
//!   outcomes (expired, declined, reused code) and an on-disk token cache.
//! - **Client** – Bearer-token injection, an atomic request counter, and
//!   translation of well-known error payloads (consumer-tenant licensing,
//!   invalid token) into domain failures.  No automatic retry.
//! - **Enumeration** – lazy paginated child streams following
//!   `@odata.nextLink`, tolerant of runs of spuriously empty pages.
//! - **Items** – path-to-id resolution, single moves with
//!   fail-on-conflict semantics, folder creation.
//! - **Batching** – `$batch` envelopes (≤ 20 sub-requests) with
//!   `dependsOn` chaining, used for nested-folder creation and bulk moves.
//! - **Transport seam** – all HTTP flows through the `HttpTransport`
//!   trait; a scripted in-memory implementation backs the unit tests.

pub mod auth;
pub mod batch;
pub mod children;
pub mod client;
pub mod error;
pub mod items;
pub mod path;
pub mod token_store;
pub mod transport;
pub mod types;

// Re-exports
pub use children::{ChildStream, DEFAULT_EMPTY_PAGE_LIMIT};
pub use client::GraphClient;
pub use error::{GraphError, GraphErrorCode, GraphResult};
pub use token_store::TokenStore;
pub use transport::{HttpTransport, ReqwestTransport, ScriptedTransport};
pub use types::*;
