use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an upstream scheduled job (UUID string, opaque to the wallboard).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Technical department a job can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Sound,
    Lights,
    Video,
}

impl Department {
    pub const ALL: [Department; 3] = [Department::Sound, Department::Lights, Department::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Sound => "sound",
            Department::Lights => "lights",
            Department::Video => "video",
        }
    }

    /// Video crew and documents are computed but never shown on crew/assignment panels.
    pub fn is_displayed(&self) -> bool {
        !matches!(self, Department::Video)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sound" => Ok(Department::Sound),
            "lights" => Ok(Department::Lights),
            "video" => Ok(Department::Video),
            other => Err(format!("unknown department: {other}")),
        }
    }
}

/// Derived green/yellow/red staffing-adequacy indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Green,
    Yellow,
    Red,
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageStatus::Green => write!(f, "green"),
            CoverageStatus::Yellow => write!(f, "yellow"),
            CoverageStatus::Red => write!(f, "red"),
        }
    }
}

/// One of the fixed display modes the wallboard rotates through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKey {
    Overview,
    Crew,
    Documents,
    Logistics,
    Pending,
    Calendar,
}

impl PanelKey {
    /// Default rotation order, also the fallback for an empty configured order.
    pub const ALL: [PanelKey; 6] = [
        PanelKey::Overview,
        PanelKey::Crew,
        PanelKey::Documents,
        PanelKey::Logistics,
        PanelKey::Pending,
        PanelKey::Calendar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKey::Overview => "overview",
            PanelKey::Crew => "crew",
            PanelKey::Documents => "documents",
            PanelKey::Logistics => "logistics",
            PanelKey::Pending => "pending",
            PanelKey::Calendar => "calendar",
        }
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PanelKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overview" => Ok(PanelKey::Overview),
            "crew" => Ok(PanelKey::Crew),
            "documents" | "docs" => Ok(PanelKey::Documents),
            "logistics" => Ok(PanelKey::Logistics),
            "pending" => Ok(PanelKey::Pending),
            "calendar" => Ok(PanelKey::Calendar),
            other => Err(format!("unknown panel: {other}")),
        }
    }
}

/// Upstream resources whose changes trigger a wallboard refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Jobs,
    Tours,
    Assignments,
    JobDepartments,
    RequiredRoles,
    Documents,
    Timesheets,
    Announcements,
    LogisticsEvents,
    LogisticsEventDepartments,
    Profiles,
    Locations,
}

impl Resource {
    pub const ALL: [Resource; 12] = [
        Resource::Jobs,
        Resource::Tours,
        Resource::Assignments,
        Resource::JobDepartments,
        Resource::RequiredRoles,
        Resource::Documents,
        Resource::Timesheets,
        Resource::Announcements,
        Resource::LogisticsEvents,
        Resource::LogisticsEventDepartments,
        Resource::Profiles,
        Resource::Locations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Jobs => "jobs",
            Resource::Tours => "tours",
            Resource::Assignments => "assignments",
            Resource::JobDepartments => "job_departments",
            Resource::RequiredRoles => "required_roles",
            Resource::Documents => "documents",
            Resource::Timesheets => "timesheets",
            Resource::Announcements => "announcements",
            Resource::LogisticsEvents => "logistics_events",
            Resource::LogisticsEventDepartments => "logistics_event_departments",
            Resource::Profiles => "profiles",
            Resource::Locations => "locations",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("unknown resource: {s}"))
    }
}

/// Severity attached to an announcement / ticker message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerLevel {
    #[default]
    Info,
    Warn,
    Critical,
}

impl fmt::Display for TickerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerLevel::Info => write!(f, "info"),
            TickerLevel::Warn => write!(f, "warn"),
            TickerLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for TickerLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "info" => Ok(TickerLevel::Info),
            "warn" | "warning" => Ok(TickerLevel::Warn),
            "critical" => Ok(TickerLevel::Critical),
            other => Err(format!("unknown ticker level: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_parse_back() {
        for r in Resource::ALL {
            assert_eq!(r.as_str().parse::<Resource>().unwrap(), r);
        }
        assert!("bogus".parse::<Resource>().is_err());
    }

    #[test]
    fn panel_key_parse_is_case_insensitive() {
        assert_eq!(" Calendar ".parse::<PanelKey>().unwrap(), PanelKey::Calendar);
        assert_eq!("docs".parse::<PanelKey>().unwrap(), PanelKey::Documents);
    }

    #[test]
    fn video_is_hidden_from_crew_display() {
        assert!(Department::Sound.is_displayed());
        assert!(!Department::Video.is_displayed());
    }
}
