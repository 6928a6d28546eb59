//! `wallboard-core` — shared vocabulary, display preset and service config.

pub mod config;
pub mod error;
pub mod preset;
pub mod types;

pub use config::WallboardConfig;
pub use error::{Result, WallboardError};
pub use preset::{DisplayPreset, Preset};
pub use types::{CoverageStatus, Department, JobId, PanelKey, Resource, TickerLevel};
