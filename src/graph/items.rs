//! Single-item drive operations: path lookup, move, folder creation.
//!
//! Items are addressed either by id (`/me/drive/items/{id}`) or by a
//! slash-separated path relative to the account root
//! (`/me/drive/root:/Pictures/Camera Roll`).

use crate::graph::client::GraphClient;
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::types::MoveRequest;
use log::{debug, info};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::json;

/// Percent-encode a root-relative path, segment by segment.
fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|seg| utf8_percent_encode(seg, NON_ALPHANUMERIC).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve a root-relative folder/file path to an item id.
///
/// Returns `Ok(None)` when the path does not exist (Graph reports this as
/// a 404 `itemNotFound`, or an `UnknownError` with a "No HTTP resource was
/// found" message on some malformed-path variants).
pub async fn item_id_by_path(client: &GraphClient, path: &str) -> GraphResult<Option<String>> {
    let api_path = format!("me/drive/root:/{}", encode_path(path));

    match client.get(&api_path, &[("$select", "id")]).await {
        Ok(v) => {
            let id = v["id"]
                .as_str()
                .ok_or_else(|| GraphError::internal("Item response without id"))?
                .to_string();
            debug!("Resolved path {:?} to item {}", path, id);
            Ok(Some(id))
        }
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

fn is_not_found(err: &GraphError) -> bool {
    match err.graph_error_code.as_deref() {
        Some("itemNotFound") => true,
        Some("UnknownError") => err.message.contains("No HTTP resource was found"),
        _ => err.status == Some(404),
    }
}

/// Move a file into another folder, failing on a name collision.
pub async fn move_item(
    client: &GraphClient,
    file_id: &str,
    dest_folder_id: &str,
) -> GraphResult<()> {
    let body = serde_json::to_value(MoveRequest::into_folder(dest_folder_id))?;
    debug!("Moving item {} into {}", file_id, dest_folder_id);
    client
        .patch(&format!("me/drive/items/{}", file_id), body)
        .await?;
    Ok(())
}

/// Create one folder under a parent; returns the new folder's id.
pub async fn create_folder(
    client: &GraphClient,
    parent_id: &str,
    name: &str,
) -> GraphResult<String> {
    let path = format!("me/drive/items/{}/children", parent_id);
    let body = json!({ "name": name, "folder": {} });
    let v = client.post(&path, body).await?;
    let id = v["id"]
        .as_str()
        .ok_or_else(|| GraphError::internal("Folder-creation response without id"))?
        .to_string();
    info!("Created folder {:?} ({})", name, id);
    Ok(id)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
