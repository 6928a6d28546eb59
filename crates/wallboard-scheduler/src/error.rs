use thiserror::Error;
use wallboard_fusion::FusionError;
use wallboard_store::StoreError;

/// Errors surfaced by the engine or its handle.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Fusion error: {0}")]
    Fusion(#[from] FusionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The engine loop has exited; commands can no longer be delivered.
    #[error("Engine stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, EngineError>;
