//! The sort run: enumerate a source folder, classify each item, resolve
//! (and cache) the `YYYY/MM` destination folder, and hand the move off to
//! the background batch queue.

use crate::graph::children::{ChildStream, DEFAULT_EMPTY_PAGE_LIMIT};
use crate::graph::client::GraphClient;
use crate::graph::error::{GraphError, GraphErrorCode, GraphResult};
use crate::graph::items;
use crate::graph::path;
use crate::sorter::classify::{capture_timestamp, should_move, DEFAULT_ALLOWED_TYPES};
use crate::sorter::move_queue::{BatchMoveQueue, MoveOrder};
use chrono::Datelike;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Attributes requested per enumerated item.
const SELECT_ATTRS: &[&str] = &["name", "id", "file", "photo", "createdDateTime"];

/// Progress log cadence, in examined files.
const REPORT_PERIOD: u64 = 10;

/// Knobs for one sort run.
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Mime-type prefixes that qualify for sorting.
    pub allowed_types: Vec<String>,
    /// `$top` page-size hint for enumeration.
    pub page_size: Option<u32>,
    /// Consecutive-empty-page tolerance for enumeration.
    pub empty_page_limit: u32,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
            page_size: None,
            empty_page_limit: DEFAULT_EMPTY_PAGE_LIMIT,
        }
    }
}

/// Metrics for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Items enumerated from the source folder.
    pub examined: u64,
    /// Items the move queue reported as relocated.
    pub moved: u64,
    /// Items whose move failed (name collisions and the like).
    pub failed_moves: u64,
    /// Items skipped for lack of a capture timestamp.
    pub skipped_no_timestamp: u64,
    /// Total remote calls made through the client, all threads included.
    pub requests_made: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Sort every matching photo/video under `source_path` into
/// `dest_path/YYYY/MM` folders.
///
/// Both paths are slash-separated and relative to the account root.
/// Fatal failures (missing folders, auth trouble, enumeration or path
/// resolution errors) abort the run; per-item move failures only show up
/// in the report's counters.
pub async fn sort_photos(
    client: Arc<GraphClient>,
    source_path: &str,
    dest_path: &str,
    options: &SortOptions,
) -> GraphResult<RunReport> {
    let started = Instant::now();

    let source_id = items::item_id_by_path(&client, source_path)
        .await?
        .ok_or_else(|| GraphError::not_found(format!("Source path not found: {}", source_path)))?;
    let dest_id = items::item_id_by_path(&client, dest_path)
        .await?
        .ok_or_else(|| {
            GraphError::not_found(format!("Destination path not found: {}", dest_path))
        })?;

    info!("Sorting {} -> {}", source_path, dest_path);

    let queue = BatchMoveQueue::spawn(client.clone());
    let allowed: Vec<&str> = options.allowed_types.iter().map(String::as_str).collect();

    // One resolved folder id per "YYYY/MM"; folders are assumed not to be
    // deleted mid-run, so entries are never invalidated.
    let mut subfolder_cache: HashMap<String, String> = HashMap::new();

    let mut examined: u64 = 0;
    let mut skipped_no_timestamp: u64 = 0;

    let mut stream = ChildStream::new(&client, &source_id, Some(SELECT_ATTRS), options.page_size)
        .with_empty_page_limit(options.empty_page_limit);

    let loop_result: GraphResult<()> = loop {
        let item = match stream.next().await {
            Ok(Some(item)) => item,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };

        examined += 1;
        if examined % REPORT_PERIOD == 0 {
            info!("{} files examined", examined);
        }

        if !should_move(&item, &allowed) {
            continue;
        }

        let taken = match capture_timestamp(&item) {
            Ok(dt) => dt,
            Err(e) if e.code == GraphErrorCode::TimestampMissing => {
                warn!("Skipping item: {}", e);
                skipped_no_timestamp += 1;
                continue;
            }
            Err(e) => break Err(e),
        };

        let year = format!("{:04}", taken.year());
        let month = format!("{:02}", taken.month());
        let subfolder = format!("{}/{}", year, month);

        let dest_folder_id = match subfolder_cache.get(&subfolder) {
            Some(id) => id.clone(),
            None => {
                let id = match path::ensure_path(&client, &dest_id, &[&year, &month]).await {
                    Ok(id) => id,
                    Err(e) => break Err(e),
                };
                subfolder_cache.insert(subfolder, id.clone());
                id
            }
        };

        queue.put(MoveOrder {
            file_id: item.id,
            dest_folder_id,
        });
    };

    // Shut the queue down whether or not enumeration survived: queued
    // orders still flush, and the worker must not outlive the run.
    queue.done_adding();
    let stats = queue.join().await;
    loop_result?;

    let report = RunReport {
        examined,
        moved: stats.moved,
        failed_moves: stats.failed,
        skipped_no_timestamp,
        requests_made: client.requests_made(),
        elapsed: started.elapsed(),
    };

    info!(
        "Run complete: {} examined, {} moved, {} failed, {} without timestamp, {} requests in {:.1?}",
        report.examined,
        report.moved,
        report.failed_moves,
        report.skipped_no_timestamp,
        report.requests_made,
        report.elapsed
    );
    Ok(report)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
