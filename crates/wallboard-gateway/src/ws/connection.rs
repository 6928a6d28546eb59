use axum::{
    extract::{ws::Message, ws::WebSocket, Query, State, WebSocketUpgrade},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wallboard_core::config::MAX_PAYLOAD_BYTES;

use crate::app::AppState;
use crate::auth::{authorize_display, TokenQuery};
use crate::http::error::ApiError;
use crate::ws::message::{self, ClientMessage, ServerEvent};
use crate::ws::send;

/// Axum handler — upgrades HTTP to WebSocket at GET /ws. The display token is
/// checked before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Response {
    if let Err(e) = authorize_display(&state, &headers, &query) {
        return ApiError(e).into_response();
    }
    ws.max_message_size(MAX_PAYLOAD_BYTES)
        .on_upgrade(|socket| run_connection(socket, state))
}

/// Per-connection loop: pushes every new frame and scroll position, accepts
/// extent reports and refresh requests from the client.
async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    info!(conn_id = %conn_id, "new display connection");
    state.ws_clients.insert(conn_id.clone(), chrono::Utc::now());

    let (mut tx, mut rx) = socket.split();
    let mut frames = state.engine.subscribe_frames();
    let mut scroll = state.engine.subscribe_scroll();

    let initial = frames.borrow_and_update().clone();
    if send::event(&mut tx, ServerEvent::new("frame", &initial)).await.is_err() {
        state.ws_clients.remove(&conn_id);
        return;
    }

    loop {
        tokio::select! {
            msg = rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_PAYLOAD_BYTES {
                            warn!(conn_id, size = text.len(), "payload too large");
                            break;
                        }
                        match message::parse(&text) {
                            Some(ClientMessage::Extent { panel, extent }) => {
                                if extent.is_finite() && extent >= 0.0
                                    && state.engine.report_extent(panel, extent).await.is_err()
                                {
                                    break;
                                }
                            }
                            Some(ClientMessage::Refresh) => {
                                if state.engine.refresh().await.is_err() {
                                    break;
                                }
                            }
                            None => debug!(conn_id, "ignoring unrecognised client message"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = tx.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(conn_id, "ws receive error: {e}");
                        break;
                    }
                    _ => {}
                }
            }

            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if send::event(&mut tx, ServerEvent::new("frame", &frame)).await.is_err() {
                    break;
                }
            }

            changed = scroll.changed() => {
                if changed.is_err() {
                    break;
                }
                let position = *scroll.borrow_and_update();
                if send::event(&mut tx, ServerEvent::new("scroll", &position)).await.is_err() {
                    break;
                }
            }
        }
    }

    state.ws_clients.remove(&conn_id);
    info!(conn_id, "display connection closed");
}
