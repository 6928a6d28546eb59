//! Wire shapes of the display WebSocket.

use serde::{Deserialize, Serialize};
use wallboard_core::PanelKey;

/// Server → client push.
#[derive(Debug, Serialize)]
pub struct ServerEvent<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub data: &'a T,
}

impl<'a, T: Serialize> ServerEvent<'a, T> {
    pub fn new(kind: &'a str, data: &'a T) -> Self {
        Self { kind, data }
    }
}

/// Client → server messages.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Scrollable overflow the client measured for a panel, in pixels.
    Extent { panel: PanelKey, extent: f64 },
    /// Ask for an immediate refetch.
    Refresh,
}

pub fn parse(text: &str) -> Option<ClientMessage> {
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extent_report() {
        assert_eq!(
            parse(r#"{"type":"extent","panel":"crew","extent":320.5}"#),
            Some(ClientMessage::Extent {
                panel: PanelKey::Crew,
                extent: 320.5
            })
        );
        assert_eq!(parse(r#"{"type":"refresh"}"#), Some(ClientMessage::Refresh));
        assert_eq!(parse(r#"{"type":"extent","panel":"nope","extent":1}"#), None);
    }

    #[test]
    fn server_event_envelope() {
        let data = serde_json::json!({"panel": "overview"});
        let v = serde_json::to_value(ServerEvent::new("frame", &data)).unwrap();
        assert_eq!(v["type"], "frame");
        assert_eq!(v["data"]["panel"], "overview");
    }
}
