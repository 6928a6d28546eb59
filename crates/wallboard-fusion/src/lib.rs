//! `wallboard-fusion` — the Data Fusion Layer.
//!
//! Pulls raw records for a bounded time window through a
//! [`WallboardSource`](wallboard_store::WallboardSource), joins them in memory
//! and derives per-job coverage status, document progress and pending actions.
//! The result is a [`Feeds`] snapshot: each fusion cycle yields a complete,
//! authoritative replacement for the previous one.

pub mod coverage;
pub mod error;
pub mod feeds;
pub mod fusion;
pub mod pending;
pub mod window;

pub use error::{FusionError, Result};
pub use feeds::*;
pub use fusion::DataFusion;
pub use window::Windows;
