use chrono::{DateTime, Duration, Utc};
use wallboard_core::JobId;

use crate::feeds::{PendingAction, PendingKind, PendingSeverity, WallboardJob};
use crate::window::TIMESHEET_GRACE_HOURS;

/// Understaffing alerts escalate to red when the job starts within this many hours.
pub const URGENT_WINDOW_HOURS: i64 = 24;

/// One alert per displayed department with fewer people assigned than
/// required. Jobs that have already ended produce none.
pub fn understaffed_actions(job: &WallboardJob, now: DateTime<Utc>) -> Vec<PendingAction> {
    if job.end_time <= now {
        return Vec::new();
    }
    let severity = if job.start_time <= now + Duration::hours(URGENT_WINDOW_HOURS) {
        PendingSeverity::Red
    } else {
        PendingSeverity::Yellow
    };

    job.crew_needed
        .iter()
        .filter(|(department, _)| department.is_displayed())
        .filter_map(|(department, needed)| {
            let assigned = job.crew_assigned.get(department).copied().unwrap_or(0);
            if assigned >= *needed {
                return None;
            }
            let missing = needed - assigned;
            Some(PendingAction {
                job_id: job.id.clone(),
                title: job.title.clone(),
                kind: PendingKind::Understaffed,
                department: Some(*department),
                severity,
                message: format!(
                    "{department}: {missing} more needed ({assigned}/{needed} assigned)"
                ),
                start_time: job.start_time,
            })
        })
        .collect()
}

/// Alert for a job that ended more than 24h ago with crew still lacking an
/// approved or submitted timesheet. `missing` holds those crew members' names.
pub fn timesheet_action(
    job_id: &JobId,
    title: &str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    missing: &[String],
    now: DateTime<Utc>,
) -> Option<PendingAction> {
    if missing.is_empty() || end_time > now - Duration::hours(TIMESHEET_GRACE_HOURS) {
        return None;
    }
    let message = if missing.len() == 1 {
        format!("Timesheet missing: {}", missing[0])
    } else {
        format!("{} timesheets missing: {}", missing.len(), missing.join(", "))
    };
    Some(PendingAction {
        job_id: job_id.clone(),
        title: title.to_string(),
        kind: PendingKind::Timesheets,
        department: None,
        severity: PendingSeverity::Red,
        message,
        start_time,
    })
}

/// Most urgent first, then soonest job.
pub fn sort_actions(actions: &mut [PendingAction]) {
    actions.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(a.start_time.cmp(&b.start_time))
            .then(a.job_id.cmp(&b.job_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use wallboard_core::{CoverageStatus, Department};
    use wallboard_store::JobLifecycle;

    fn job(start: DateTime<Utc>, needed: &[(Department, u32)], assigned: &[(Department, u32)]) -> WallboardJob {
        WallboardJob {
            id: JobId::from("job-1"),
            title: "Arena show".to_string(),
            start_time: start,
            end_time: start + Duration::hours(6),
            status: JobLifecycle::Confirmed,
            departments: needed.iter().map(|(d, _)| *d).collect(),
            crew_assigned: assigned.iter().copied().collect(),
            crew_needed: needed.iter().copied().collect(),
            docs: BTreeMap::new(),
            coverage: CoverageStatus::Yellow,
            color: None,
            job_type: "single".to_string(),
            location: None,
            detailed: true,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn understaffing_escalates_inside_24h() {
        let soon = job(now() + Duration::hours(5), &[(Department::Sound, 2)], &[(Department::Sound, 1)]);
        let later = job(now() + Duration::days(3), &[(Department::Sound, 2)], &[]);

        let a = understaffed_actions(&soon, now());
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].severity, PendingSeverity::Red);

        let b = understaffed_actions(&later, now());
        assert_eq!(b[0].severity, PendingSeverity::Yellow);
        assert_eq!(b[0].message, "sound: 2 more needed (0/2 assigned)");
    }

    #[test]
    fn video_shortfall_raises_no_alert() {
        let j = job(
            now() + Duration::hours(5),
            &[(Department::Video, 2), (Department::Lights, 1)],
            &[],
        );
        let actions = understaffed_actions(&j, now());
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].department, Some(Department::Lights));
    }

    #[test]
    fn fully_staffed_job_has_no_alerts() {
        let j = job(now() + Duration::hours(5), &[(Department::Lights, 1)], &[(Department::Lights, 1)]);
        assert!(understaffed_actions(&j, now()).is_empty());
    }

    #[test]
    fn timesheet_alert_requires_grace_period() {
        let id = JobId::from("job-2");
        let ended = now() - Duration::hours(30);
        let missing = vec!["Ana Ruiz".to_string()];

        let action = timesheet_action(&id, "Gala", ended - Duration::hours(4), ended, &missing, now())
            .expect("alert expected");
        assert_eq!(action.severity, PendingSeverity::Red);
        assert_eq!(action.kind, PendingKind::Timesheets);

        let recent = now() - Duration::hours(2);
        assert!(timesheet_action(&id, "Gala", recent, recent, &missing, now()).is_none());
        assert!(timesheet_action(&id, "Gala", ended, ended, &[], now()).is_none());
    }

    #[test]
    fn red_sorts_before_yellow() {
        let mut actions = understaffed_actions(
            &job(now() + Duration::days(2), &[(Department::Sound, 1)], &[]),
            now(),
        );
        actions.extend(understaffed_actions(
            &job(now() + Duration::hours(3), &[(Department::Lights, 1)], &[]),
            now(),
        ));
        sort_actions(&mut actions);
        assert_eq!(actions[0].severity, PendingSeverity::Red);
    }
}
