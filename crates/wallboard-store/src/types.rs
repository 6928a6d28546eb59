use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use wallboard_core::{Department, JobId, TickerLevel};

/// Half-open UTC interval `[start, end)` used to bound fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// True when the interval `[start, end)` intersects this window.
    /// Zero-length intervals count when their instant lies inside it.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if start == end {
            return self.contains(start);
        }
        start < self.end && end > self.start
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Lifecycle of an upstream job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobLifecycle {
    Tentative,
    Confirmed,
    Completed,
    Cancelled,
}

impl JobLifecycle {
    /// Statuses the wallboard displays; everything else is filtered at fetch time.
    pub const DISPLAYED: [JobLifecycle; 3] = [
        JobLifecycle::Confirmed,
        JobLifecycle::Tentative,
        JobLifecycle::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobLifecycle::Tentative => "tentative",
            JobLifecycle::Confirmed => "confirmed",
            JobLifecycle::Completed => "completed",
            JobLifecycle::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobLifecycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tentative" => Ok(JobLifecycle::Tentative),
            "confirmed" => Ok(JobLifecycle::Confirmed),
            "completed" => Ok(JobLifecycle::Completed),
            "cancelled" => Ok(JobLifecycle::Cancelled),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A scheduled job as stored upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: JobLifecycle,
    pub tour_id: Option<String>,
    pub location_id: Option<String>,
    pub color: Option<String>,
    /// Job category, e.g. "single", "festival", "tourdate".
    pub job_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDepartmentRecord {
    pub job_id: JobId,
    pub department: Department,
}

/// A technician's assignment to a job, with one role field per department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub job_id: JobId,
    pub technician_id: String,
    pub sound_role: Option<String>,
    pub lights_role: Option<String>,
    pub video_role: Option<String>,
}

impl AssignmentRecord {
    pub fn role_for(&self, department: Department) -> Option<&str> {
        let role = match department {
            Department::Sound => &self.sound_role,
            Department::Lights => &self.lights_role,
            Department::Video => &self.video_role,
        };
        role.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Departments this assignment fills, in canonical order.
    pub fn departments(&self) -> Vec<Department> {
        Department::ALL
            .into_iter()
            .filter(|d| self.role_for(*d).is_some())
            .collect()
    }
}

/// Staffing requirement summary: how many people a department needs on a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredRoleRecord {
    pub job_id: JobId,
    pub department: Department,
    pub total_required: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimesheetStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl TimesheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimesheetStatus::Draft => "draft",
            TimesheetStatus::Submitted => "submitted",
            TimesheetStatus::Approved => "approved",
            TimesheetStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for TimesheetStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TimesheetStatus::Draft),
            "submitted" => Ok(TimesheetStatus::Submitted),
            "approved" => Ok(TimesheetStatus::Approved),
            "rejected" => Ok(TimesheetStatus::Rejected),
            other => Err(format!("unknown timesheet status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetRecord {
    pub job_id: JobId,
    pub technician_id: String,
    pub status: TimesheetStatus,
}

/// Number of documents uploaded for one job/department pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCountRecord {
    pub job_id: JobId,
    pub department: Department,
    pub count: u32,
}

/// Baseline number of documents every job needs per department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRequirementRecord {
    pub department: Department,
    pub required: u32,
}

/// A truck / transport event at the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsEventRecord {
    pub id: String,
    pub job_id: Option<JobId>,
    /// "load" or "unload".
    pub event_type: String,
    pub transport_type: String,
    pub license_plate: Option<String>,
    pub at: DateTime<Utc>,
    pub color: Option<String>,
    pub departments: Vec<Department>,
}

/// A free-text announcement record, possibly carrying a highlight directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    pub id: String,
    pub message: String,
    pub level: TickerLevel,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

/// Canonical timestamp encoding: RFC 3339, second precision, `Z` suffix.
/// Uniform width keeps lexical comparison in SQL equal to time ordering.
pub fn encode_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn decode_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_overlap_excludes_touching_intervals() {
        let w = TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 8, 0, 0, 0).unwrap(),
        );
        let before = Utc.with_ymd_and_hms(2026, 9, 30, 10, 0, 0).unwrap();
        assert!(!w.overlaps(before, w.start));
        assert!(w.overlaps(before, w.start + chrono::Duration::hours(1)));
        assert!(!w.overlaps(w.end, w.end + chrono::Duration::hours(2)));
        assert!(w.overlaps(w.start, w.start));
    }

    #[test]
    fn assignment_departments_skip_blank_roles() {
        let a = AssignmentRecord {
            job_id: "j".into(),
            technician_id: "t".into(),
            sound_role: Some("FOH".into()),
            lights_role: Some("  ".into()),
            video_role: None,
        };
        assert_eq!(a.departments(), vec![Department::Sound]);
    }

    #[test]
    fn timestamps_encode_uniformly() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 5, 0).unwrap();
        assert_eq!(encode_ts(at), "2026-10-19T08:05:00Z");
        assert_eq!(decode_ts("2026-10-19T10:05:00+02:00"), Some(at));
    }
}
