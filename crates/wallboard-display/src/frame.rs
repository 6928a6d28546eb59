use chrono::{DateTime, Utc};
use serde::Serialize;
use wallboard_core::{DisplayPreset, JobId, PanelKey};
use wallboard_fusion::{CrewJob, DocJob, Feeds, LogisticsItem, PendingAction, WallboardJob};

use crate::calendar::CalendarGrid;
use crate::highlight::TickerMessage;
use crate::rotation::PanelRotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    /// No fetch has completed yet.
    #[default]
    Loading,
    Live,
    /// The last fetch failed; items come from the previous snapshot.
    Stale,
    /// The display credential was rejected. Nothing refreshes any more.
    AccessDenied,
}

impl FrameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameStatus::Loading => "loading",
            FrameStatus::Live => "live",
            FrameStatus::Stale => "stale",
            FrameStatus::AccessDenied => "access_denied",
        }
    }
}

/// Items of the current page of the visible panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum PanelItems {
    Overview(Vec<WallboardJob>),
    Crew(Vec<CrewJob>),
    Documents(Vec<DocJob>),
    Logistics(Vec<LogisticsItem>),
    Pending(Vec<PendingAction>),
    Calendar(Box<CalendarGrid>),
    Empty,
}

/// Everything a display client needs to draw one moment of the wallboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallboardFrame {
    pub status: FrameStatus,
    pub panel: PanelKey,
    pub page: usize,
    pub page_count: usize,
    pub panel_order: Vec<PanelKey>,
    pub content: PanelItems,
    pub highlights: Vec<JobId>,
    pub ticker: Vec<TickerMessage>,
    pub generated_at: Option<DateTime<Utc>>,
    pub rendered_at: DateTime<Utc>,
}

impl WallboardFrame {
    /// Placeholder frame before the first fetch lands.
    pub fn loading(panel: PanelKey, now: DateTime<Utc>) -> Self {
        Self {
            status: FrameStatus::Loading,
            panel,
            page: 0,
            page_count: 1,
            panel_order: vec![panel],
            content: PanelItems::Empty,
            highlights: Vec::new(),
            ticker: Vec::new(),
            generated_at: None,
            rendered_at: now,
        }
    }
}

/// Pages needed to show `items` at `page_size` per page. Never zero.
pub fn page_count(items: usize, page_size: usize) -> usize {
    items.div_ceil(page_size.max(1)).max(1)
}

/// Page counts for every panel in rotation.
pub fn page_counts(feeds: &Feeds, preset: &DisplayPreset) -> Vec<(PanelKey, usize)> {
    preset
        .panel_order
        .iter()
        .map(|p| (*p, page_count(feeds.item_count(*p), preset.page_size(*p))))
        .collect()
}

fn page_slice<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let size = page_size.max(1);
    items.iter().skip(page * size).take(size).cloned().collect()
}

/// Everything frame assembly reads, borrowed from the engine's state.
pub struct FrameInput<'a> {
    pub status: FrameStatus,
    pub rotation: &'a PanelRotation,
    pub feeds: &'a Feeds,
    pub preset: &'a DisplayPreset,
    pub calendar: Option<&'a CalendarGrid>,
    pub highlights: Vec<JobId>,
    pub ticker: &'a [TickerMessage],
    pub now: DateTime<Utc>,
}

pub fn assemble(input: FrameInput<'_>) -> WallboardFrame {
    let panel = input.rotation.current();
    let page = input.rotation.page();
    let size = input.preset.page_size(panel);
    let feeds = input.feeds;

    let content = match panel {
        PanelKey::Overview => PanelItems::Overview(page_slice(&feeds.overview, page, size)),
        PanelKey::Crew => PanelItems::Crew(page_slice(&feeds.crew, page, size)),
        PanelKey::Documents => PanelItems::Documents(page_slice(&feeds.docs, page, size)),
        PanelKey::Logistics => PanelItems::Logistics(page_slice(&feeds.logistics, page, size)),
        PanelKey::Pending => PanelItems::Pending(page_slice(&feeds.pending, page, size)),
        PanelKey::Calendar => match input.calendar {
            Some(grid) => PanelItems::Calendar(Box::new(grid.clone())),
            None => PanelItems::Empty,
        },
    };

    WallboardFrame {
        status: input.status,
        panel,
        page,
        page_count: input.rotation.page_count(panel),
        panel_order: input.rotation.order().to_vec(),
        content,
        highlights: input.highlights,
        ticker: input.ticker.to_vec(),
        generated_at: feeds.generated_at,
        rendered_at: input.now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wallboard_fusion::{PendingKind, PendingSeverity};

    fn pending(n: usize) -> Vec<PendingAction> {
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap();
        (0..n)
            .map(|i| PendingAction {
                job_id: JobId::from(format!("job-{i}")),
                title: format!("Job {i}"),
                kind: PendingKind::Understaffed,
                department: None,
                severity: PendingSeverity::Yellow,
                message: String::new(),
                start_time: start,
            })
            .collect()
    }

    #[test]
    fn page_count_never_zero() {
        assert_eq!(page_count(0, 6), 1);
        assert_eq!(page_count(6, 6), 1);
        assert_eq!(page_count(7, 6), 2);
        assert_eq!(page_count(3, 0), 3);
    }

    #[test]
    fn assembles_requested_page() {
        let feeds = Feeds {
            pending: pending(11),
            ..Feeds::default()
        };
        let preset = DisplayPreset::default();
        let mut rotation = PanelRotation::new(vec![PanelKey::Pending]);
        rotation.set_page_counts(page_counts(&feeds, &preset));
        assert_eq!(rotation.page_count(PanelKey::Pending), 2);
        rotation.advance();

        let frame = assemble(FrameInput {
            status: FrameStatus::Live,
            rotation: &rotation,
            feeds: &feeds,
            preset: &preset,
            calendar: None,
            highlights: Vec::new(),
            ticker: &[],
            now: Utc::now(),
        });
        assert_eq!(frame.panel, PanelKey::Pending);
        assert_eq!(frame.page, 1);
        match frame.content {
            PanelItems::Pending(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[0].job_id.as_str(), "job-8");
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn frame_serializes_with_tagged_content() {
        let frame = WallboardFrame::loading(PanelKey::Overview, Utc::now());
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["status"], "loading");
        assert_eq!(json["content"]["kind"], "empty");
    }
}
