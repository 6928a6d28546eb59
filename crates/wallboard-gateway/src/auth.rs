//! Display-token guard shared by the HTTP and WebSocket display endpoints.

use axum::http::HeaderMap;
use serde::Deserialize;
use wallboard_core::WallboardError;

use crate::app::AppState;

/// `?token=` query parameter accepted as an alternative to a bearer header,
/// since browsers cannot set headers on WebSocket upgrades.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Checks the presented display token. Once the store has rejected this
/// display's credential every display endpoint answers `AccessDenied`.
pub fn authorize_display(
    state: &AppState,
    headers: &HeaderMap,
    query: &TokenQuery,
) -> Result<(), WallboardError> {
    if let Some(ref expected) = state.config.gateway.display_token {
        let presented = bearer_token(headers).or(query.token.as_deref());
        match presented {
            Some(token) if token == expected => {}
            Some(_) => {
                return Err(WallboardError::Unauthorized(
                    "display token mismatch".into(),
                ))
            }
            None => {
                return Err(WallboardError::Unauthorized(
                    "display token missing".into(),
                ))
            }
        }
    }
    if state.is_access_denied() {
        return Err(WallboardError::AccessDenied(
            "display credential rejected by the store".into(),
        ));
    }
    Ok(())
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
