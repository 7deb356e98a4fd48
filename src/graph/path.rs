//! Nested-folder creation under a base folder.
//!
//! `ensure_path` issues dependency-chained creation requests inside a
//! `$batch` call, one sub-path per segment, so the server creates segment
//! *k* only after segment *k-1* succeeded.  Segments beyond the 20-request
//! batch limit are handled by looping with the last created folder as the
//! new base.
//!
//! Creation is issued without checking whether the target already exists;
//! whether a pre-existing segment errors depends on server-side
//! duplicate-name semantics.  Do not rely on re-running against an
//! already-built tree.

use crate::graph::batch;
use crate::graph::client::GraphClient;
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::types::{BatchRequest, BATCH_REQUEST_MAX};
use log::debug;
use serde_json::json;

/// Create `segments` under `base_folder_id`, returning the terminal
/// folder's id.
pub async fn ensure_path(
    client: &GraphClient,
    base_folder_id: &str,
    segments: &[&str],
) -> GraphResult<String> {
    let mut current = base_folder_id.to_string();

    for chunk in segments.chunks(BATCH_REQUEST_MAX) {
        let mut requests = Vec::with_capacity(chunk.len());
        let mut path_so_far = String::new();

        for (i, segment) in chunk.iter().enumerate() {
            let url = if path_so_far.is_empty() {
                format!("/me/drive/items/{}/children?$select=id", current)
            } else {
                format!(
                    "/me/drive/items/{}:{}:/children?$select=id",
                    current, path_so_far
                )
            };

            let mut request = BatchRequest::json(
                i.to_string(),
                "POST",
                url,
                json!({ "name": segment, "folder": {} }),
            );
            if i > 0 {
                request = request.depends_on((i - 1).to_string());
            }
            requests.push(request);

            path_so_far = format!("{}/{}", path_so_far, segment);
        }

        let last_id = (chunk.len() - 1).to_string();
        let responses = batch::execute(client, &requests).await?;

        let last = batch::response_by_id(&responses, &last_id).ok_or_else(|| {
            GraphError::path_resolution(format!(
                "Batch response missing entry for segment {:?}",
                chunk[chunk.len() - 1]
            ))
        })?;

        if !last.is_success() {
            return Err(GraphError::path_resolution(format!(
                "Failed to ensure path to {:?} (HTTP {})",
                chunk[chunk.len() - 1],
                last.status
            )));
        }

        current = last.body["id"]
            .as_str()
            .ok_or_else(|| {
                GraphError::path_resolution("Folder-creation sub-response without id")
            })?
            .to_string();

        debug!(
            "Ensured {} path segment(s), now at folder {}",
            chunk.len(),
            current
        );
    }

    Ok(current)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::error::GraphErrorCode;
    use crate::graph::transport::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: Arc<ScriptedTransport>) -> GraphClient {
        GraphClient::new(transport, "tok", "https://graph.microsoft.com/v1.0")
    }

    fn batch_ok(last_id: usize, folder_id: &str) -> serde_json::Value {
        // Only the terminal sub-response matters to the resolver.
        let responses: Vec<serde_json::Value> = (0..=last_id)
            .map(|i| {
                json!({
                    "id": i.to_string(),
                    "status": 201,
                    "body": { "id": if i == last_id { folder_id.to_string() } else { format!("mid-{}", i) } }
                })
            })
            .collect();
        json!({ "responses": responses })
    }

    #[tokio::test]
    async fn test_empty_segments_returns_base() {
        let transport = Arc::new(ScriptedTransport::new());
        let c = client(transport.clone());
        let id = ensure_path(&c, "base1", &[]).await.unwrap();
        assert_eq!(id, "base1");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_two_segments_single_batch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(batch_ok(1, "month-id"));
        let c = client(transport.clone());

        let id = ensure_path(&c, "out-folder", &["2021", "05"]).await.unwrap();
        assert_eq!(id, "month-id");

        let body = transport.requests()[0].json.clone().unwrap();
        let reqs = body["requests"].as_array().unwrap();
        assert_eq!(reqs.len(), 2);
        assert!(reqs[0]["url"]
            .as_str()
            .unwrap()
            .starts_with("/me/drive/items/out-folder/children"));
        assert_eq!(reqs[0]["body"]["name"], "2021");
        assert!(reqs[0].get("dependsOn").is_none());
        assert!(reqs[1]["url"]
            .as_str()
            .unwrap()
            .contains("out-folder:/2021:/children"));
        assert_eq!(reqs[1]["body"]["name"], "05");
        assert_eq!(reqs[1]["dependsOn"][0], "0");
    }

    #[tokio::test]
    async fn test_25_segments_issues_two_chained_batches() {
        let segments: Vec<String> = (0..25).map(|i| format!("d{}", i)).collect();
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();

        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(batch_ok(19, "after-20"));
        transport.push_ok(batch_ok(4, "after-25"));
        let c = client(transport.clone());

        let id = ensure_path(&c, "base1", &refs).await.unwrap();
        assert_eq!(id, "after-25");

        let calls = transport.requests();
        assert_eq!(calls.len(), 2);

        let first = calls[0].json.as_ref().unwrap()["requests"].as_array().unwrap().clone();
        let second = calls[1].json.as_ref().unwrap()["requests"].as_array().unwrap().clone();
        assert_eq!(first.len(), 20);
        assert_eq!(second.len(), 5);

        // Strictly sequential dependency chain in each batch.
        for (reqs, len) in [(&first, 20usize), (&second, 5)] {
            for k in 1..len {
                assert_eq!(reqs[k]["dependsOn"][0], (k - 1).to_string());
            }
        }

        // Second batch is rooted at the folder the first batch created.
        assert!(second[0]["url"]
            .as_str()
            .unwrap()
            .starts_with("/me/drive/items/after-20/"));
    }

    #[tokio::test]
    async fn test_failed_terminal_sub_response_is_fatal() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(json!({
            "responses": [
                { "id": "0", "status": 201, "body": { "id": "y" } },
                { "id": "1", "status": 409, "body": {} }
            ]
        }));
        let c = client(transport);

        let err = ensure_path(&c, "base1", &["2021", "05"]).await.unwrap_err();
        assert_eq!(err.code, GraphErrorCode::PathResolution);
        assert!(err.message.contains("409"));
    }
}
