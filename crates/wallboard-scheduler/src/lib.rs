//! `wallboard-scheduler` — the display engine.
//!
//! # Overview
//!
//! [`WallboardEngine`] is the single owner of all display state. One tokio task
//! runs its `select!` loop over every timer the wallboard needs:
//!
//! | Loop          | Default        | Effect                                      |
//! |---------------|----------------|---------------------------------------------|
//! | rotation      | panel dwell    | next page, else next panel                  |
//! | debounce      | 300 ms         | one fusion fetch per burst of changes       |
//! | sweep         | 5 s            | expired highlights dropped                  |
//! | ticker poll   | preset (20 s)  | announcements re-read                       |
//! | scroll        | 50 ms          | auto-scroll position advanced               |
//!
//! Fetches run as tasks in a `JoinSet` and are never cancelled by newer ones;
//! whichever completes last wins. [`EngineHandle::unmount`] stops the loop,
//! which drops every timer and change subscription with it.

pub mod debounce;
pub mod engine;
pub mod error;
pub mod handle;
pub mod subscriptions;

pub use debounce::Debouncer;
pub use engine::{AccessDeniedCallback, EngineCommand, WallboardEngine};
pub use error::{EngineError, Result};
pub use handle::{EngineClient, EngineHandle};
pub use subscriptions::ChangeSubscriptions;
