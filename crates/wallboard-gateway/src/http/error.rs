use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;
use wallboard_core::WallboardError;

/// HTTP-facing wrapper: maps [`WallboardError`] onto a status and a JSON body
/// carrying the stable error code.
#[derive(Debug)]
pub struct ApiError(pub WallboardError);

impl From<WallboardError> for ApiError {
    fn from(e: WallboardError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            WallboardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WallboardError::AccessDenied(_) => StatusCode::FORBIDDEN,
            WallboardError::InvalidRequest(_) | WallboardError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            WallboardError::Store(_) => StatusCode::BAD_GATEWAY,
            WallboardError::Config(_) | WallboardError::Io(_) | WallboardError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            warn!(code = self.0.code(), "request failed: {}", self.0);
        }
        (
            status,
            Json(json!({"error": self.0.to_string(), "code": self.0.code()})),
        )
            .into_response()
    }
}
