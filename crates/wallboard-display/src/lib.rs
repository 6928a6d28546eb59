//! `wallboard-display` — timer-free display state.
//!
//! Everything here is a plain single-owner state container advanced by the
//! caller: the engine in `wallboard-scheduler` owns one of each and drives
//! them from its timers. Nothing in this crate sleeps, spawns or locks.

pub mod autoscroll;
pub mod calendar;
pub mod frame;
pub mod highlight;
pub mod rotation;

pub use autoscroll::{AutoScroll, ScrollDirection, ScrollState};
pub use calendar::{build_calendar, CalendarCell, CalendarEntry, CalendarGrid};
pub use frame::{assemble, page_count, page_counts, FrameInput, FrameStatus, PanelItems, WallboardFrame};
pub use highlight::{parse_directive, HighlightCache, IngestOutcome, ParsedAnnouncement, TickerMessage};
pub use rotation::{Advance, PanelRotation};
