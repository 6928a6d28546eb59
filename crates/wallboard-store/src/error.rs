use thiserror::Error;

/// Errors raised by a [`WallboardSource`](crate::WallboardSource).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The display's access credential is missing, unknown or expired.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A stored value could not be mapped onto the record shape.
    #[error("Malformed record in {table}: {reason}")]
    Malformed { table: String, reason: String },

    /// The upstream store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Fatal errors stop the display; everything else is retried on the next cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::AccessDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
