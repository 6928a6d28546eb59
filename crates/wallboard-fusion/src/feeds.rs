use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use wallboard_core::{CoverageStatus, Department, JobId, PanelKey};
use wallboard_store::{JobLifecycle, TimesheetStatus};

/// Document progress for one department of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocProgress {
    pub department: Department,
    pub have: u32,
    pub need: u32,
}

impl DocProgress {
    pub fn is_complete(&self) -> bool {
        self.have >= self.need
    }
}

/// A job as the wallboard sees it: upstream fields plus everything derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallboardJob {
    pub id: JobId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: JobLifecycle,
    pub departments: Vec<Department>,
    pub crew_assigned: BTreeMap<Department, u32>,
    pub crew_needed: BTreeMap<Department, u32>,
    pub docs: BTreeMap<Department, DocProgress>,
    pub coverage: CoverageStatus,
    pub color: Option<String>,
    pub job_type: String,
    pub location: Option<String>,
    /// False for calendar-only jobs whose coverage came from the lifecycle field.
    pub detailed: bool,
}

/// Timesheet state of one crew member, `Missing` when no sheet exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimesheetState {
    Approved,
    Submitted,
    Draft,
    Rejected,
    Missing,
}

impl TimesheetState {
    /// Approved or submitted sheets satisfy the timesheet check.
    pub fn is_settled(&self) -> bool {
        matches!(self, TimesheetState::Approved | TimesheetState::Submitted)
    }
}

impl From<Option<TimesheetStatus>> for TimesheetState {
    fn from(status: Option<TimesheetStatus>) -> Self {
        match status {
            Some(TimesheetStatus::Approved) => TimesheetState::Approved,
            Some(TimesheetStatus::Submitted) => TimesheetState::Submitted,
            Some(TimesheetStatus::Draft) => TimesheetState::Draft,
            Some(TimesheetStatus::Rejected) => TimesheetState::Rejected,
            None => TimesheetState::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrewMember {
    pub technician_id: String,
    pub name: String,
    pub department: Department,
    pub role: String,
    pub timesheet: TimesheetState,
}

/// Per-job roster for the crew panel. Video crew never appears here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrewJob {
    pub job_id: JobId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub crew: Vec<CrewMember>,
}

/// Per-job document progress for the documents panel. Video is suppressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocJob {
    pub job_id: JobId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub departments: Vec<DocProgress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingSeverity {
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    /// A department has fewer people assigned than required.
    Understaffed,
    /// A finished job still has crew without an approved/submitted timesheet.
    Timesheets,
}

/// A derived alert for the pending-actions panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingAction {
    pub job_id: JobId,
    pub title: String,
    pub kind: PendingKind,
    pub department: Option<Department>,
    pub severity: PendingSeverity,
    pub message: String,
    pub start_time: DateTime<Utc>,
}

/// A transport event enriched with its job's title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticsItem {
    pub id: String,
    pub at: DateTime<Utc>,
    pub event_type: String,
    pub transport_type: String,
    pub license_plate: Option<String>,
    pub departments: Vec<Department>,
    pub color: Option<String>,
    pub job_id: Option<JobId>,
    pub job_title: Option<String>,
}

/// One complete, authoritative fusion snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feeds {
    pub generated_at: Option<DateTime<Utc>>,
    /// Jobs intersecting the detail window.
    pub overview: Vec<WallboardJob>,
    /// Every job in the calendar window.
    pub calendar_jobs: Vec<WallboardJob>,
    pub crew: Vec<CrewJob>,
    pub docs: Vec<DocJob>,
    pub pending: Vec<PendingAction>,
    pub logistics: Vec<LogisticsItem>,
}

impl Feeds {
    /// Number of paginated items a panel would show.
    pub fn item_count(&self, panel: PanelKey) -> usize {
        match panel {
            PanelKey::Overview => self.overview.len(),
            PanelKey::Crew => self.crew.len(),
            PanelKey::Documents => self.docs.len(),
            PanelKey::Logistics => self.logistics.len(),
            PanelKey::Pending => self.pending.len(),
            PanelKey::Calendar => 1,
        }
    }
}
