use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use wallboard_core::Resource;

use crate::app::AppState;

/// GET /health — liveness probe, returns server and display metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let frame = state.engine.frame();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "display": frame.status.as_str(),
        "panel": frame.panel,
        "page": frame.page,
        "generated_at": frame.generated_at,
        "ws_clients": state.ws_clients.len(),
        "change_subscribers": state.bus.subscriber_count(Resource::Jobs),
    }))
}
