//! Display preset: the operator-facing knobs for a wallboard screen.
//!
//! [`Preset`] is the raw, loosely-typed form read from config or the
//! `PUT /v1/preset` endpoint. [`Preset::normalized`] applies every default and
//! clamp and yields a [`DisplayPreset`], the only form the engine consumes.
//!
//! | option                    | default | bounds      |
//! |---------------------------|---------|-------------|
//! | per-panel dwell seconds   | 12      | [1, 600]    |
//! | rotation fallback seconds | 12      | [1, 600]    |
//! | highlight TTL seconds     | 300     | [30, 3600]  |
//! | ticker poll seconds       | 20      | [10, 600]   |
//! | page size                 | varies  | [1, 50]     |
//! | scroll speed (px/s)       | 40 / 15 | [5, 400]    |
//! | scroll pause (ms)         | 2000    | [0, 30000]  |

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::PanelKey;

pub const DEFAULT_DWELL_SECS: u64 = 12;
pub const DWELL_BOUNDS: (u64, u64) = (1, 600);
pub const DEFAULT_HIGHLIGHT_TTL_SECS: u64 = 300;
pub const HIGHLIGHT_TTL_BOUNDS: (u64, u64) = (30, 3600);
pub const DEFAULT_TICKER_POLL_SECS: u64 = 20;
pub const TICKER_POLL_BOUNDS: (u64, u64) = (10, 600);
/// Hard floor on ticker polling, independent of the configured bounds.
pub const TICKER_POLL_FLOOR_SECS: u64 = 5;
pub const PAGE_SIZE_BOUNDS: (usize, usize) = (1, 50);
pub const DEFAULT_SCROLL_SPEED: f64 = 40.0;
pub const DEFAULT_CALENDAR_SCROLL_SPEED: f64 = 15.0;
pub const SCROLL_SPEED_BOUNDS: (f64, f64) = (5.0, 400.0);
pub const DEFAULT_SCROLL_PAUSE_MS: u64 = 2000;
pub const SCROLL_PAUSE_BOUNDS: (u64, u64) = (0, 30_000);

/// Raw preset as supplied by an operator. Unknown panel names are tolerated
/// here and dropped during normalisation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub panel_order: Vec<String>,
    /// Panels left out of rotation entirely.
    #[serde(default)]
    pub hidden_panels: Vec<String>,
    /// Per-panel dwell seconds keyed by panel name.
    #[serde(default)]
    pub panel_durations: HashMap<String, u64>,
    pub rotation_fallback_seconds: Option<u64>,
    pub highlight_ttl_seconds: Option<u64>,
    pub ticker_poll_interval_seconds: Option<u64>,
    /// Items per page keyed by panel name.
    #[serde(default)]
    pub page_sizes: HashMap<String, usize>,
    pub scroll_speed: Option<f64>,
    pub calendar_scroll_speed: Option<f64>,
    pub scroll_pause_ms: Option<u64>,
    /// Calendar-only kiosk mode.
    #[serde(default)]
    pub calendar_only: bool,
}

/// Fully resolved preset. Every field is within bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPreset {
    /// Panels in rotation order. Never empty.
    pub panel_order: Vec<PanelKey>,
    pub panel_dwell_secs: BTreeMap<PanelKey, u64>,
    pub fallback_secs: u64,
    pub highlight_ttl_secs: u64,
    pub ticker_poll_secs: u64,
    pub page_sizes: BTreeMap<PanelKey, usize>,
    pub scroll_speed: f64,
    pub calendar_scroll_speed: f64,
    pub scroll_pause_ms: u64,
    pub calendar_only: bool,
}

impl Default for DisplayPreset {
    fn default() -> Self {
        Preset::default().normalized()
    }
}

fn default_page_size(panel: PanelKey) -> usize {
    match panel {
        PanelKey::Overview => 6,
        PanelKey::Crew => 4,
        PanelKey::Documents => 6,
        PanelKey::Logistics => 8,
        PanelKey::Pending => 8,
        PanelKey::Calendar => 1,
    }
}

/// Resolve a raw panel list: unknown names dropped, duplicates removed,
/// missing keys appended in default order.
pub fn normalize_panel_order(raw: &[String]) -> Vec<PanelKey> {
    let mut order: Vec<PanelKey> = Vec::with_capacity(PanelKey::ALL.len());
    for name in raw {
        match name.parse::<PanelKey>() {
            Ok(key) if !order.contains(&key) => order.push(key),
            Ok(_) => {}
            Err(e) => warn!(panel = %name, "dropping panel from order: {e}"),
        }
    }
    for key in PanelKey::ALL {
        if !order.contains(&key) {
            order.push(key);
        }
    }
    order
}

impl Preset {
    pub fn normalized(&self) -> DisplayPreset {
        let fallback_secs = self
            .rotation_fallback_seconds
            .unwrap_or(DEFAULT_DWELL_SECS)
            .clamp(DWELL_BOUNDS.0, DWELL_BOUNDS.1);

        let mut panel_dwell_secs = BTreeMap::new();
        for (name, secs) in &self.panel_durations {
            if let Ok(key) = name.parse::<PanelKey>() {
                panel_dwell_secs.insert(key, (*secs).clamp(DWELL_BOUNDS.0, DWELL_BOUNDS.1));
            }
        }

        let mut page_sizes = BTreeMap::new();
        for key in PanelKey::ALL {
            let size = self
                .page_sizes
                .iter()
                .find(|(name, _)| name.parse::<PanelKey>().ok() == Some(key))
                .map(|(_, size)| *size)
                .unwrap_or_else(|| default_page_size(key));
            page_sizes.insert(key, size.clamp(PAGE_SIZE_BOUNDS.0, PAGE_SIZE_BOUNDS.1));
        }

        let panel_order = if self.calendar_only {
            vec![PanelKey::Calendar]
        } else {
            let hidden: Vec<PanelKey> = self
                .hidden_panels
                .iter()
                .filter_map(|name| name.parse().ok())
                .collect();
            let active: Vec<PanelKey> = normalize_panel_order(&self.panel_order)
                .into_iter()
                .filter(|key| !hidden.contains(key))
                .collect();
            if active.is_empty() {
                PanelKey::ALL.to_vec()
            } else {
                active
            }
        };

        let ticker_poll_secs = self
            .ticker_poll_interval_seconds
            .unwrap_or(DEFAULT_TICKER_POLL_SECS)
            .clamp(TICKER_POLL_BOUNDS.0, TICKER_POLL_BOUNDS.1)
            .max(TICKER_POLL_FLOOR_SECS);

        DisplayPreset {
            panel_order,
            panel_dwell_secs,
            fallback_secs,
            highlight_ttl_secs: self
                .highlight_ttl_seconds
                .unwrap_or(DEFAULT_HIGHLIGHT_TTL_SECS)
                .clamp(HIGHLIGHT_TTL_BOUNDS.0, HIGHLIGHT_TTL_BOUNDS.1),
            ticker_poll_secs,
            page_sizes,
            scroll_speed: clamp_speed(self.scroll_speed.unwrap_or(DEFAULT_SCROLL_SPEED)),
            calendar_scroll_speed: clamp_speed(
                self.calendar_scroll_speed
                    .unwrap_or(DEFAULT_CALENDAR_SCROLL_SPEED),
            ),
            scroll_pause_ms: self
                .scroll_pause_ms
                .unwrap_or(DEFAULT_SCROLL_PAUSE_MS)
                .clamp(SCROLL_PAUSE_BOUNDS.0, SCROLL_PAUSE_BOUNDS.1),
            calendar_only: self.calendar_only,
        }
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.clamp(SCROLL_SPEED_BOUNDS.0, SCROLL_SPEED_BOUNDS.1)
    } else {
        DEFAULT_SCROLL_SPEED
    }
}

impl DisplayPreset {
    /// Dwell time for `panel`, falling back to the global rotation default.
    pub fn dwell(&self, panel: PanelKey) -> Duration {
        let secs = self
            .panel_dwell_secs
            .get(&panel)
            .copied()
            .unwrap_or(self.fallback_secs);
        Duration::from_secs(secs)
    }

    pub fn page_size(&self, panel: PanelKey) -> usize {
        if panel == PanelKey::Calendar {
            return 1;
        }
        self.page_sizes
            .get(&panel)
            .copied()
            .unwrap_or_else(|| default_page_size(panel))
    }

    /// Scroll speed in px/s. Calendar-only kiosks scroll slower.
    pub fn scroll_speed_for(&self, panel: PanelKey) -> f64 {
        if self.calendar_only && panel == PanelKey::Calendar {
            self.calendar_scroll_speed
        } else {
            self.scroll_speed
        }
    }

    pub fn highlight_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.highlight_ttl_secs as i64)
    }

    pub fn ticker_poll(&self) -> Duration {
        Duration::from_secs(self.ticker_poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_table() {
        let p = DisplayPreset::default();
        assert_eq!(p.panel_order, PanelKey::ALL.to_vec());
        assert_eq!(p.dwell(PanelKey::Crew), Duration::from_secs(12));
        assert_eq!(p.highlight_ttl_secs, 300);
        assert_eq!(p.ticker_poll_secs, 20);
    }

    #[test]
    fn order_drops_unknown_and_appends_missing() {
        let order = normalize_panel_order(&[
            "calendar".to_string(),
            "nonsense".to_string(),
            "crew".to_string(),
            "calendar".to_string(),
        ]);
        assert_eq!(order[0], PanelKey::Calendar);
        assert_eq!(order[1], PanelKey::Crew);
        assert_eq!(order.len(), PanelKey::ALL.len());
    }

    #[test]
    fn values_are_clamped() {
        let raw = Preset {
            panel_durations: HashMap::from([
                ("crew".to_string(), 0),
                ("overview".to_string(), 10_000),
            ]),
            rotation_fallback_seconds: Some(9999),
            highlight_ttl_seconds: Some(1),
            ticker_poll_interval_seconds: Some(2),
            scroll_speed: Some(f64::NAN),
            ..Default::default()
        };
        let p = raw.normalized();
        assert_eq!(p.dwell(PanelKey::Crew), Duration::from_secs(1));
        assert_eq!(p.dwell(PanelKey::Overview), Duration::from_secs(600));
        assert_eq!(p.dwell(PanelKey::Pending), Duration::from_secs(600));
        assert_eq!(p.highlight_ttl_secs, 30);
        assert_eq!(p.ticker_poll_secs, 10);
        assert_eq!(p.scroll_speed, DEFAULT_SCROLL_SPEED);
    }

    #[test]
    fn hiding_every_panel_falls_back_to_default_order() {
        let raw = Preset {
            hidden_panels: PanelKey::ALL.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        };
        assert_eq!(raw.normalized().panel_order, PanelKey::ALL.to_vec());
    }

    #[test]
    fn calendar_only_uses_single_panel_and_slow_scroll() {
        let raw = Preset {
            calendar_only: true,
            ..Default::default()
        };
        let p = raw.normalized();
        assert_eq!(p.panel_order, vec![PanelKey::Calendar]);
        assert_eq!(p.scroll_speed_for(PanelKey::Calendar), DEFAULT_CALENDAR_SCROLL_SPEED);
        assert_eq!(p.page_size(PanelKey::Calendar), 1);
    }
}
