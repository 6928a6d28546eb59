//! Staffing coverage derivation.
//!
//! Two rules, picked per job:
//!
//! * **Requirement rule** — at least one department in scope needs more than
//!   zero people. Each department gets a ratio (0 when nobody is assigned,
//!   0.5 when partially staffed, 1 when met or when it needs nobody). The
//!   job's status follows the minimum ratio: 1 → green, 0 → red, else yellow.
//! * **Presence rule** — no department needs anyone. Green when every
//!   department has at least one person, red when none has, yellow otherwise.
//!
//! Jobs outside the detail window have no assignment data and use
//! [`lifecycle_status`] instead.

use serde::Serialize;
use wallboard_core::{CoverageStatus, Department};
use wallboard_store::JobLifecycle;

/// Assigned vs. required head count for one department of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepartmentStaffing {
    pub department: Department,
    pub assigned: u32,
    pub required: u32,
}

pub fn department_ratio(assigned: u32, required: u32) -> f64 {
    if required == 0 || assigned >= required {
        1.0
    } else if assigned == 0 {
        0.0
    } else {
        0.5
    }
}

/// Coverage over the departments in scope. `None` when there are none.
pub fn derive_coverage(staffing: &[DepartmentStaffing]) -> Option<CoverageStatus> {
    if staffing.is_empty() {
        return None;
    }

    if staffing.iter().any(|s| s.required > 0) {
        let min = staffing
            .iter()
            .map(|s| department_ratio(s.assigned, s.required))
            .fold(f64::INFINITY, f64::min);
        return Some(if min >= 1.0 {
            CoverageStatus::Green
        } else if min <= 0.0 {
            CoverageStatus::Red
        } else {
            CoverageStatus::Yellow
        });
    }

    let staffed = staffing.iter().filter(|s| s.assigned > 0).count();
    Some(if staffed == staffing.len() {
        CoverageStatus::Green
    } else if staffed == 0 {
        CoverageStatus::Red
    } else {
        CoverageStatus::Yellow
    })
}

/// Coarse status from the job's own lifecycle field.
pub fn lifecycle_status(status: JobLifecycle) -> CoverageStatus {
    match status {
        JobLifecycle::Confirmed | JobLifecycle::Completed => CoverageStatus::Green,
        JobLifecycle::Tentative => CoverageStatus::Yellow,
        JobLifecycle::Cancelled => CoverageStatus::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(department: Department, assigned: u32, required: u32) -> DepartmentStaffing {
        DepartmentStaffing {
            department,
            assigned,
            required,
        }
    }

    #[test]
    fn ratio_steps() {
        assert_eq!(department_ratio(0, 2), 0.0);
        assert_eq!(department_ratio(1, 2), 0.5);
        assert_eq!(department_ratio(2, 2), 1.0);
        assert_eq!(department_ratio(3, 2), 1.0);
        assert_eq!(department_ratio(0, 0), 1.0);
    }

    #[test]
    fn unstaffed_required_department_makes_job_red() {
        // 2 sound needed and assigned, 1 lights needed and none assigned.
        let status = derive_coverage(&[
            s(Department::Sound, 2, 2),
            s(Department::Lights, 0, 1),
        ]);
        assert_eq!(status, Some(CoverageStatus::Red));
    }

    #[test]
    fn partial_staffing_is_yellow() {
        let status = derive_coverage(&[
            s(Department::Sound, 1, 3),
            s(Department::Lights, 2, 2),
        ]);
        assert_eq!(status, Some(CoverageStatus::Yellow));
    }

    #[test]
    fn zero_requirement_department_counts_as_met() {
        let status = derive_coverage(&[
            s(Department::Sound, 2, 2),
            s(Department::Video, 0, 0),
        ]);
        assert_eq!(status, Some(CoverageStatus::Green));
    }

    #[test]
    fn presence_rule_without_requirements() {
        assert_eq!(
            derive_coverage(&[s(Department::Sound, 1, 0), s(Department::Lights, 1, 0)]),
            Some(CoverageStatus::Green)
        );
        assert_eq!(
            derive_coverage(&[s(Department::Sound, 1, 0), s(Department::Lights, 0, 0)]),
            Some(CoverageStatus::Yellow)
        );
        assert_eq!(
            derive_coverage(&[s(Department::Sound, 0, 0)]),
            Some(CoverageStatus::Red)
        );
        assert_eq!(derive_coverage(&[]), None);
    }

    #[test]
    fn lifecycle_fallback() {
        assert_eq!(lifecycle_status(JobLifecycle::Confirmed), CoverageStatus::Green);
        assert_eq!(lifecycle_status(JobLifecycle::Tentative), CoverageStatus::Yellow);
    }
}
