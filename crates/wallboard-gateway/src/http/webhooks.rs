//! Change-notification ingress — POST /webhooks/changes.
//!
//! Lets the upstream scheduling store (or a replication job) announce that a
//! resource changed. The resource is published on the [`ChangeBus`] exactly as
//! a local write would be, so the display refreshes through the same
//! debounced path.
//!
//! [`ChangeBus`]: wallboard_store::ChangeBus

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};
use wallboard_core::config::WebhookAuthMode;
use wallboard_core::Resource;

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Either a single resource or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChangeNotice {
    One { resource: String },
    Many { resources: Vec<String> },
}

/// POST /webhooks/changes
///
/// Returns 200 with the published resources, 401 on auth failure, 404 when
/// the subsystem is disabled and 400 on an unknown resource.
pub async fn changes_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let cfg = &state.config.webhooks;

    if !cfg.enabled {
        warn!("change webhook received but subsystem is disabled");
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "webhook subsystem is disabled"})),
        ));
    }

    match cfg.auth_mode {
        WebhookAuthMode::HmacSha256 => {
            verify_hmac_sha256(&headers, &body, cfg.secret.as_deref())
                .map_err(|e| auth_error(&e))?;
        }
        WebhookAuthMode::BearerToken => {
            verify_bearer_token(&headers, cfg.secret.as_deref()).map_err(|e| auth_error(&e))?;
        }
        WebhookAuthMode::None => {}
    }

    let notice: ChangeNotice = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "invalid JSON in change webhook body");
        bad_request("invalid JSON body")
    })?;
    let names = match notice {
        ChangeNotice::One { resource } => vec![resource],
        ChangeNotice::Many { resources } => resources,
    };

    let resources = names
        .iter()
        .map(|n| n.parse::<Resource>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| bad_request(&e))?;

    for resource in &resources {
        state.bus.publish(*resource);
    }
    info!(count = resources.len(), "change webhook accepted");
    Ok(Json(json!({"ok": true, "published": resources})))
}

/// Verify HMAC-SHA256 over the raw body: `sha256=<hex>` in X-Hub-Signature-256.
fn verify_hmac_sha256(headers: &HeaderMap, body: &Bytes, secret: Option<&str>) -> Result<(), String> {
    let secret = secret.ok_or_else(|| "no HMAC secret configured".to_string())?;

    let sig_header = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing X-Hub-Signature-256 header".to_string())?;

    let sig_hex = sig_header
        .strip_prefix("sha256=")
        .ok_or_else(|| "malformed X-Hub-Signature-256 header".to_string())?;

    let expected =
        hex::decode(sig_hex).map_err(|_| "X-Hub-Signature-256 is not valid hex".to_string())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "invalid HMAC key length".to_string())?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| "HMAC signature mismatch".to_string())
}

fn verify_bearer_token(headers: &HeaderMap, secret: Option<&str>) -> Result<(), String> {
    let expected = secret.ok_or_else(|| "no bearer token configured".to_string())?;
    let token = crate::auth::bearer_token(headers)
        .ok_or_else(|| "missing or malformed Authorization header".to_string())?;
    if token == expected {
        Ok(())
    } else {
        Err("bearer token mismatch".to_string())
    }
}

fn auth_error(reason: &str) -> (StatusCode, Json<Value>) {
    warn!(reason, "change webhook auth failed");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized", "reason": reason})),
    )
}

fn bad_request(reason: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": reason})))
}
