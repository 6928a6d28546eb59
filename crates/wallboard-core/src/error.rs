use thiserror::Error;

#[derive(Debug, Error)]
pub enum WallboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WallboardError {
    /// Short error code string returned to display clients in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WallboardError::Config(_) => "CONFIG_ERROR",
            WallboardError::AccessDenied(_) => "ACCESS_DENIED",
            WallboardError::Unauthorized(_) => "UNAUTHORIZED",
            WallboardError::InvalidRequest(_) => "INVALID_REQUEST",
            WallboardError::Store(_) => "STORE_ERROR",
            WallboardError::Serialization(_) => "SERIALIZATION_ERROR",
            WallboardError::Io(_) => "IO_ERROR",
            WallboardError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, WallboardError>;
