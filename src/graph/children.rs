//! Lazy, paginated enumeration of a folder's children.
//!
//! Follows `@odata.nextLink` page by page and yields one `DriveItem` at a
//! time, so the orchestrator never holds a whole listing in memory.  The
//! stream is forward-only and non-restartable: drop it and build a new one
//! to enumerate again.
//!
//! Graph occasionally keeps advertising a next link while returning runs
//! of completely empty pages.  A consecutive-empty-page counter stops
//! enumeration once the run reaches a limit, instead of looping on the
//! pathological listing forever.  This is a best-effort heuristic tuned
//! against observed server behaviour, not an API contract; a legitimately
//! sparse listing could in principle be truncated by it.

use crate::graph::client::GraphClient;
use crate::graph::error::GraphResult;
use crate::graph::types::DriveItem;
use log::{debug, warn};
use std::collections::VecDeque;

/// Default number of consecutive empty pages tolerated before giving up.
pub const DEFAULT_EMPTY_PAGE_LIMIT: u32 = 100;

/// Lazy child-item stream for one folder.
pub struct ChildStream<'a> {
    client: &'a GraphClient,
    /// URL of the next page; `None` once enumeration has finished.
    next_url: Option<String>,
    /// `$select` / `$top` parameters, sent on the first page only — the
    /// next link already encodes paging state.
    first_page_query: Vec<(String, String)>,
    first_page_done: bool,
    buffer: VecDeque<DriveItem>,
    consecutive_empty: u32,
    empty_page_limit: u32,
}

impl<'a> ChildStream<'a> {
    /// Start enumerating `folder_id`'s children.
    ///
    /// `select` restricts the attributes returned per item; `top` is a
    /// page-size hint.
    pub fn new(
        client: &'a GraphClient,
        folder_id: &str,
        select: Option<&[&str]>,
        top: Option<u32>,
    ) -> Self {
        let mut query = Vec::new();
        if let Some(attrs) = select {
            query.push(("$select".to_string(), attrs.join(",")));
        }
        if let Some(n) = top {
            query.push(("$top".to_string(), n.to_string()));
        }

        Self {
            client,
            next_url: Some(format!("me/drive/items/{}/children", folder_id)),
            first_page_query: query,
            first_page_done: false,
            buffer: VecDeque::new(),
            consecutive_empty: 0,
            empty_page_limit: DEFAULT_EMPTY_PAGE_LIMIT,
        }
    }

    /// Override the consecutive-empty-page tolerance.
    pub fn with_empty_page_limit(mut self, limit: u32) -> Self {
        self.empty_page_limit = limit;
        self
    }

    /// The next child item, or `None` once the listing is exhausted (or
    /// the empty-page tolerance was hit).  Any non-2xx mid-pagination
    /// aborts with the error rather than silently ending the stream.
    pub async fn next(&mut self) -> GraphResult<Option<DriveItem>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }

            let Some(url) = self.next_url.take() else {
                return Ok(None);
            };

            let query: Vec<(&str, &str)> = if self.first_page_done {
                Vec::new()
            } else {
                self.first_page_query
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect()
            };

            let page = self.client.get(&url, &query).await?;
            self.first_page_done = true;

            let items: Vec<DriveItem> = match page.get("value") {
                Some(v) => serde_json::from_value(v.clone())?,
                None => Vec::new(),
            };
            self.next_url = page["@odata.nextLink"].as_str().map(String::from);

            if items.is_empty() {
                self.consecutive_empty += 1;
                debug!(
                    "Empty child page ({} consecutive)",
                    self.consecutive_empty
                );
                if self.next_url.is_some() && self.consecutive_empty >= self.empty_page_limit {
                    warn!(
                        "Stopping enumeration after {} consecutive empty pages",
                        self.consecutive_empty
                    );
                    self.next_url = None;
                    return Ok(None);
                }
            } else {
                self.consecutive_empty = 0;
                self.buffer.extend(items);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
