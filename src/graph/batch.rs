//! `$batch` submission: up to 20 sub-requests per physical call.
//!
//! Graph returns sub-responses in arbitrary order; callers match them back
//! to their requests by id.

use crate::graph::client::GraphClient;
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::types::{BatchRequest, BatchResponse, BATCH_REQUEST_MAX};
use log::debug;
use serde_json::json;

/// Submit one batch and return its sub-responses.
pub async fn execute(
    client: &GraphClient,
    requests: &[BatchRequest],
) -> GraphResult<Vec<BatchResponse>> {
    if requests.is_empty() {
        return Ok(Vec::new());
    }
    if requests.len() > BATCH_REQUEST_MAX {
        return Err(GraphError::internal(format!(
            "Batch of {} exceeds the {}-request limit",
            requests.len(),
            BATCH_REQUEST_MAX
        )));
    }

    debug!("Submitting batch of {} requests", requests.len());
    let body = json!({ "requests": requests });
    let v = client.post("$batch", body).await?;

    let responses: Vec<BatchResponse> = serde_json::from_value(
        v.get("responses")
            .cloned()
            .ok_or_else(|| GraphError::internal("Batch response without responses array"))?,
    )?;
    Ok(responses)
}

/// Find the sub-response for a given request id.
pub fn response_by_id<'a>(
    responses: &'a [BatchResponse],
    id: &str,
) -> Option<&'a BatchResponse> {
    responses.iter().find(|r| r.id == id)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
