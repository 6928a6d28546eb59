use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use serde::Serialize;

use crate::ws::message::ServerEvent;

pub type Sink = SplitSink<WebSocket, Message>;

/// Serialize any value to JSON and send it over the WS connection.
pub async fn json<T: Serialize>(tx: &mut Sink, payload: &T) -> Result<(), axum::Error> {
    let json = serde_json::to_string(payload).map_err(axum::Error::new)?;
    tx.send(Message::Text(json.into()))
        .await
        .map_err(axum::Error::new)
}

/// Push one `{"type": .., "data": ..}` event.
pub async fn event<T: Serialize>(tx: &mut Sink, event: ServerEvent<'_, T>) -> Result<(), axum::Error> {
    json(tx, &event).await
}
