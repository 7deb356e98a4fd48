//! OneDrive photo sorter.
//!
//! Relocates photos and videos from a source folder into a `YYYY/MM`
//! hierarchy on the same drive, talking to the Microsoft Graph v1.0 API.
//!
//! The crate splits into two layers:
//!
//! - [`graph`] — transport, device-code authentication, the request
//!   client, pagination, `$batch` plumbing and item operations
//! - [`sorter`] — classification, the batched move queue, and the run
//!   orchestrator
//!
//! A minimal run:
//!
//! ```no_run
//! use photosort::graph::{GraphClient, GraphConfig, ReqwestTransport};
//! use photosort::sorter::{sort_photos, SortOptions};
//! use std::sync::Arc;
//!
//! # async fn run() -> photosort::graph::GraphResult<()> {
//! let config = GraphConfig::default();
//! let transport = Arc::new(ReqwestTransport::new(config.timeout_sec)?);
//! let client = Arc::new(
//!     GraphClient::connect(transport, &config, |prompt| println!("{}", prompt)).await?,
//! );
//! let report = sort_photos(client, "/Pictures", "/Sorted", &SortOptions::default()).await?;
//! println!("{} moved, {} failed", report.moved, report.failed_moves);
//! # Ok(())
//! # }
//! ```

pub mod graph;
pub mod sorter;

pub use graph::{GraphClient, GraphConfig, GraphError, GraphErrorCode, GraphResult};
pub use sorter::{sort_photos, RunReport, SortOptions};
