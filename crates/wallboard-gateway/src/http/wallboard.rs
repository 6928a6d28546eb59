//! Display endpoints: the current frame, scroll position, extent reports and
//! preset replacement.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use wallboard_core::{DisplayPreset, PanelKey, Preset, WallboardError};
use wallboard_display::{ScrollState, WallboardFrame};

use crate::app::AppState;
use crate::auth::{authorize_display, TokenQuery};
use crate::http::error::ApiError;

/// GET /v1/wallboard
pub async fn frame_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Result<Json<WallboardFrame>, ApiError> {
    authorize_display(&state, &headers, &query)?;
    Ok(Json(state.engine.frame()))
}

/// GET /v1/wallboard/scroll
pub async fn scroll_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ScrollState>, ApiError> {
    authorize_display(&state, &headers, &query)?;
    Ok(Json(state.engine.scroll()))
}

#[derive(Debug, Deserialize)]
pub struct ExtentRequest {
    pub panel: PanelKey,
    /// Scrollable overflow of the panel's content, in pixels.
    pub extent: f64,
}

/// POST /v1/wallboard/extent
pub async fn extent_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    Json(req): Json<ExtentRequest>,
) -> Result<Json<Value>, ApiError> {
    authorize_display(&state, &headers, &query)?;
    if !req.extent.is_finite() || req.extent < 0.0 {
        return Err(WallboardError::InvalidRequest(
            "extent must be a non-negative number".into(),
        )
        .into());
    }
    state
        .engine
        .report_extent(req.panel, req.extent)
        .await
        .map_err(|e| WallboardError::Internal(e.to_string()))?;
    Ok(Json(json!({"ok": true})))
}

/// PUT /v1/preset — replace the active preset, answering with the
/// normalised form the engine will run.
pub async fn preset_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    Json(preset): Json<Preset>,
) -> Result<Json<DisplayPreset>, ApiError> {
    authorize_display(&state, &headers, &query)?;
    let normalized = preset.normalized();
    state
        .engine
        .set_preset(preset)
        .await
        .map_err(|e| WallboardError::Internal(e.to_string()))?;
    info!(panels = normalized.panel_order.len(), "preset replaced");
    Ok(Json(normalized))
}
