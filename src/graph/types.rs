//! Shared types for the Microsoft Graph / OneDrive photo-sorting client.
//!
//! Models cover the connection configuration, OAuth2 device-code flow,
//! drive items (files & folders) with the facets the sorter cares about,
//! move requests, and the `$batch` request/response envelopes.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
//  Configuration
// ═══════════════════════════════════════════════════════════════════════

/// Configuration for a Graph API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphConfig {
    /// Azure AD / Entra ID application (client) ID.
    pub client_id: String,
    /// Azure AD tenant (`common`, `organizations`, `consumers`, or a GUID).
    pub tenant_id: String,
    /// OAuth2 scopes requested during the device-code flow.
    pub scopes: Vec<String>,
    /// Graph API base URL.  Default: `https://graph.microsoft.com/v1.0`.
    pub graph_base_url: String,
    /// Microsoft identity platform base URL.
    pub login_base_url: String,
    /// Timeout in seconds for HTTP calls.  Default: 60.
    pub timeout_sec: u64,
    /// Path of the cached bearer-token file.
    pub token_cache_path: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tenant_id: "consumers".into(),
            scopes: vec!["Files.ReadWrite".into(), "User.Read".into()],
            graph_base_url: "https://graph.microsoft.com/v1.0".into(),
            login_base_url: "https://login.microsoftonline.com".into(),
            timeout_sec: 60,
            token_cache_path: "token.txt".into(),
        }
    }
}

impl GraphConfig {
    /// Load a configuration from a JSON file (`auth.json` style, camelCase
    /// keys; missing fields fall back to defaults).
    pub fn load(path: &str) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Device-code endpoint for this tenant.
    pub fn device_code_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/devicecode",
            self.login_base_url, self.tenant_id
        )
    }

    /// Token-exchange endpoint for this tenant.
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base_url, self.tenant_id
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  OAuth2 / Authentication
// ═══════════════════════════════════════════════════════════════════════

/// Device-code-flow polling state, as returned by the devicecode endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCodeInfo {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    pub interval: u64,
    /// Human-readable sign-in instructions, surfaced to the user by the
    /// caller.
    pub message: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  Drive Items
// ═══════════════════════════════════════════════════════════════════════

/// A drive item snapshot at enumeration time.  Only the attributes the
/// sorter selects are modelled; everything else stays on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: Option<String>,
    pub created_date_time: Option<String>,
    pub file: Option<FileInfo>,
    pub folder: Option<FolderInfo>,
    pub photo: Option<PhotoInfo>,
}

/// File-specific metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub mime_type: Option<String>,
}

/// Folder-specific metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderInfo {
    pub child_count: Option<i64>,
}

/// Photo facet — carries the capture timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoInfo {
    pub taken_date_time: Option<String>,
}

/// Reference to a parent item / location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    pub id: String,
}

/// Conflict behaviour for moves and folder creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictBehavior {
    Fail,
    Replace,
    Rename,
}

/// Body of a move PATCH: reparent with conflict rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub parent_reference: ItemReference,
    #[serde(rename = "@microsoft.graph.conflictBehavior")]
    pub conflict_behavior: ConflictBehavior,
}

impl MoveRequest {
    /// A reparent-or-fail move into `dest_folder_id`.
    pub fn into_folder(dest_folder_id: &str) -> Self {
        Self {
            parent_reference: ItemReference {
                id: dest_folder_id.to_string(),
            },
            conflict_behavior: ConflictBehavior::Fail,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  $batch envelopes
// ═══════════════════════════════════════════════════════════════════════

/// Maximum number of sub-requests Graph accepts in one `$batch` call.
pub const BATCH_REQUEST_MAX: usize = 20;

/// One operation inside a `$batch` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub id: String,
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Ids of requests in the same batch that must complete first.
    #[serde(rename = "dependsOn", skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,
}

impl BatchRequest {
    /// A JSON sub-request with the `Content-Type` header Graph requires.
    pub fn json(id: impl Into<String>, method: &str, url: impl Into<String>, body: serde_json::Value) -> Self {
        let mut headers = serde_json::Map::new();
        headers.insert("Content-Type".into(), "application/json".into());
        Self {
            id: id.into(),
            method: method.to_string(),
            url: url.into(),
            headers: Some(headers),
            body: Some(body),
            depends_on: None,
        }
    }

    /// Chain this request behind another in the same batch.
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.depends_on = Some(vec![id.into()]);
        self
    }
}

/// One sub-response from a `$batch` call.  Responses arrive in arbitrary
/// order and are matched back to requests by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl BatchResponse {
    /// Whether the sub-request succeeded (Graph uses 200 and 201).
    pub fn is_success(&self) -> bool {
        self.status == 200 || self.status == 201
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.tenant_id, "consumers");
        assert_eq!(
            config.device_code_url(),
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/devicecode"
        );
        assert_eq!(
            config.token_url(),
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_drive_item_deserializes_graph_payload() {
        let raw = r#"{
            "id": "item1",
            "name": "IMG_0001.jpg",
            "createdDateTime": "2021-05-03T10:00:00Z",
            "file": { "mimeType": "image/jpeg" },
            "photo": { "takenDateTime": "2021-05-03T10:00:00Z" }
        }"#;
        let item: DriveItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id, "item1");
        assert_eq!(
            item.file.unwrap().mime_type.as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            item.photo.unwrap().taken_date_time.as_deref(),
            Some("2021-05-03T10:00:00Z")
        );
        assert!(item.folder.is_none());
    }

    #[test]
    fn test_move_request_wire_shape() {
        let req = MoveRequest::into_folder("folder42");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["parentReference"]["id"], "folder42");
        assert_eq!(v["@microsoft.graph.conflictBehavior"], "fail");
    }

    #[test]
    fn test_batch_request_depends_on_serde() {
        let req = BatchRequest::json("1", "POST", "/me/drive/items/x/children", serde_json::json!({}))
            .depends_on("0");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["dependsOn"][0], "0");
        assert_eq!(v["headers"]["Content-Type"], "application/json");
    }

    #[test]
    fn test_batch_response_success_codes() {
        let ok = BatchResponse {
            id: "0".into(),
            status: 201,
            body: serde_json::Value::Null,
        };
        let conflict = BatchResponse {
            id: "1".into(),
            status: 409,
            body: serde_json::Value::Null,
        };
        assert!(ok.is_success());
        assert!(!conflict.is_success());
    }
}
