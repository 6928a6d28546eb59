use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use wallboard_core::{TickerLevel, WallboardError};
use wallboard_store::AnnouncementRecord;

use crate::app::AppState;
use crate::auth::{authorize_display, TokenQuery};
use crate::http::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AnnouncementRequest {
    pub message: String,
    #[serde(default)]
    pub level: TickerLevel,
}

/// POST /v1/announcements — store an announcement. A leading
/// `[HIGHLIGHT_JOB:<id>]` marks that job on every display until it expires.
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    Json(req): Json<AnnouncementRequest>,
) -> Result<Json<AnnouncementRecord>, ApiError> {
    authorize_display(&state, &headers, &query)?;

    let message = req.message.trim();
    if message.is_empty() {
        return Err(WallboardError::InvalidRequest("message must not be empty".into()).into());
    }
    if message.len() > wallboard_core::config::MAX_PAYLOAD_BYTES {
        return Err(WallboardError::InvalidRequest("message too large".into()).into());
    }

    let store = Arc::clone(&state.store);
    let message = message.to_string();
    let record = tokio::task::spawn_blocking(move || store.insert_announcement(&message, req.level))
        .await
        .map_err(|e| WallboardError::Internal(e.to_string()))?
        .map_err(|e| WallboardError::Store(e.to_string()))?;
    Ok(Json(record))
}
