//! OAuth2 device-code authentication against the Microsoft identity
//! platform v2.0.
//!
//! The flow is a small state machine: one POST to the devicecode endpoint
//! (`Requesting`), then repeated POSTs to the token endpoint (`Polling`)
//! until the user finishes signing in on a second device.  Each terminal
//! outcome — success, expiry, declined consent, reused code — maps to a
//! distinct `GraphErrorCode` because each implies a different remediation
//! for the user.

use crate::graph::error::{GraphError, GraphErrorCode, GraphResult};
use crate::graph::token_store::TokenStore;
use crate::graph::transport::{HttpRequest, HttpTransport};
use crate::graph::types::{DeviceCodeInfo, GraphConfig};
use log::{debug, info};
use std::time::Duration;

/// Start the device-code flow.  Returns a `DeviceCodeInfo` whose `message`
/// the caller should present to the user before polling.
pub async fn start_device_code(
    transport: &dyn HttpTransport,
    config: &GraphConfig,
) -> GraphResult<DeviceCodeInfo> {
    let scopes = config.scopes.join(" ");
    let request = HttpRequest::post(config.device_code_url())
        .with_form(&[("client_id", config.client_id.as_str()), ("scope", &scopes)]);

    let resp = transport.send(request).await?;
    if resp.status != 200 {
        let detail = error_description(&resp.body)
            .unwrap_or_else(|| format!("HTTP {}", resp.status));
        return Err(GraphError::auth(format!(
            "Failed to initiate device code flow: {}",
            detail
        )));
    }

    let v: serde_json::Value = serde_json::from_str(&resp.body)?;
    debug!("Device code flow started");
    Ok(DeviceCodeInfo {
        device_code: v["device_code"].as_str().unwrap_or_default().to_string(),
        user_code: v["user_code"].as_str().unwrap_or_default().to_string(),
        verification_uri: v["verification_uri"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        expires_in: v["expires_in"].as_u64().unwrap_or(900),
        interval: v["interval"].as_u64().unwrap_or(5),
        message: v["message"].as_str().unwrap_or_default().to_string(),
    })
}

/// Poll the token endpoint until the flow reaches a terminal state.
///
/// Sleeps `info.interval` seconds between attempts while the server
/// reports `authorization_pending`.  Returns the access token on success;
/// every other terminal state is a distinct error.
pub async fn poll_device_code(
    transport: &dyn HttpTransport,
    config: &GraphConfig,
    info: &DeviceCodeInfo,
) -> GraphResult<String> {
    let mut interval = info.interval;

    loop {
        let request = HttpRequest::post(config.token_url()).with_form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            ("client_id", config.client_id.as_str()),
            ("device_code", info.device_code.as_str()),
        ]);

        let resp = transport.send(request).await?;

        if resp.status == 200 {
            let v: serde_json::Value = serde_json::from_str(&resp.body)?;
            let token = v["access_token"]
                .as_str()
                .ok_or_else(|| GraphError::auth("Token response without access_token"))?
                .to_string();
            info!("Device code flow completed");
            return Ok(token);
        }

        let v: serde_json::Value = serde_json::from_str(&resp.body).unwrap_or_default();
        match v["error"].as_str().unwrap_or_default() {
            "authorization_pending" => {
                debug!("Authorization pending, sleeping {}s", interval);
                tokio::time::sleep(Duration::from_secs(interval)).await;
            }
            "slow_down" => {
                // Server-requested back-off on top of the base interval.
                interval += 5;
                tokio::time::sleep(Duration::from_secs(interval)).await;
            }
            "invalid_grant" => {
                return Err(GraphError::new(
                    GraphErrorCode::DeviceCodeReused,
                    "Device code already used; restart the flow",
                ));
            }
            "expired_token" => {
                return Err(GraphError::new(
                    GraphErrorCode::AuthExpired,
                    "Device code expired before sign-in completed",
                ));
            }
            "authorization_declined" => {
                return Err(GraphError::new(
                    GraphErrorCode::AuthDeclined,
                    "User declined the authorization request",
                ));
            }
            other => {
                let detail = error_description(&resp.body)
                    .unwrap_or_else(|| format!("HTTP {} ({})", resp.status, other));
                return Err(GraphError::auth(format!(
                    "Failed to complete authentication: {}",
                    detail
                )));
            }
        }
    }
}

/// Obtain a bearer token: from the cache when present, otherwise by
/// running the full device-code flow and persisting the result.
///
/// `on_prompt` receives the human-readable sign-in instructions; surfacing
/// them (stdout, UI, log) is the caller's business.
pub async fn obtain_token(
    transport: &dyn HttpTransport,
    config: &GraphConfig,
    store: &TokenStore,
    on_prompt: impl FnOnce(&str),
) -> GraphResult<String> {
    if let Some(token) = store.load() {
        info!("Using cached bearer token");
        return Ok(token);
    }

    let info = start_device_code(transport, config).await?;
    on_prompt(&info.message);
    let token = poll_device_code(transport, config, &info).await?;
    store.save(&token)?;
    Ok(token)
}

fn error_description(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v["error_description"].as_str().map(String::from)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
