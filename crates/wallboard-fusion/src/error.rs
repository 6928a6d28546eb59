use thiserror::Error;
use wallboard_store::StoreError;

#[derive(Debug, Error)]
pub enum FusionError {
    /// A feed query failed. The caller keeps its previous snapshot.
    #[error("Feed fetch failed: {0}")]
    Store(#[from] StoreError),
}

impl FusionError {
    /// True for access errors that must stop the display.
    pub fn is_fatal(&self) -> bool {
        match self {
            FusionError::Store(e) => e.is_fatal(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FusionError>;
