//! `wallboard-store` — the boundary to the upstream scheduling data store.
//!
//! The wallboard only reads the *shape* of upstream records. [`WallboardSource`]
//! is the async seam the fusion layer fetches through; [`SqliteSource`] is the
//! bundled implementation backed by a local SQLite replica. Every write made
//! through [`SqliteSource`] is announced on the [`ChangeBus`], one broadcast
//! channel per watched [`Resource`](wallboard_core::Resource).

pub mod bus;
pub mod db;
pub mod error;
pub mod source;
pub mod sqlite;
pub mod types;

pub use bus::{ChangeBus, ChangeEvent};
pub use error::{Result, StoreError};
pub use source::WallboardSource;
pub use sqlite::SqliteSource;
pub use types::*;
