use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, instrument};
use wallboard_core::{Department, JobId};
use wallboard_store::{
    AssignmentRecord, JobLifecycle, JobRecord, TimesheetStatus, WallboardSource,
};

use crate::coverage::{derive_coverage, lifecycle_status, DepartmentStaffing};
use crate::error::Result;
use crate::feeds::*;
use crate::pending::{sort_actions, timesheet_action, understaffed_actions};
use crate::window::Windows;

/// The Data Fusion Layer: fetches every feed for one "now" and joins them.
///
/// Stateless between calls. Each [`DataFusion::fuse`] returns a full snapshot,
/// so concurrent or out-of-order completions are safe to apply last-write-wins.
#[derive(Clone)]
pub struct DataFusion {
    source: Arc<dyn WallboardSource>,
    offset: FixedOffset,
}

/// Lookups shared by the per-feed builders.
struct Joined {
    departments: HashMap<JobId, BTreeSet<Department>>,
    required: HashMap<JobId, BTreeMap<Department, u32>>,
    assignments: HashMap<JobId, Vec<AssignmentRecord>>,
    timesheets: HashMap<(JobId, String), TimesheetStatus>,
    names: HashMap<String, String>,
    locations: HashMap<String, String>,
    doc_counts: HashMap<(JobId, Department), u32>,
    doc_baseline: HashMap<Department, u32>,
}

impl DataFusion {
    pub fn new(source: Arc<dyn WallboardSource>, offset: FixedOffset) -> Self {
        Self { source, offset }
    }

    pub fn windows(&self, now: DateTime<Utc>) -> Windows {
        Windows::compute(now, self.offset)
    }

    /// Run one full fusion cycle. Any failing query fails the whole cycle so
    /// the caller never renders a partial snapshot.
    #[instrument(skip_all, fields(now = %now))]
    pub async fn fuse(&self, now: DateTime<Utc>) -> Result<Feeds> {
        let windows = self.windows(now);
        let source = &self.source;

        let mut jobs = source
            .jobs_in_window(&windows.calendar, &JobLifecycle::DISPLAYED)
            .await?;
        let mut finished: Vec<JobRecord> = source
            .jobs_in_window(&windows.lookback, &JobLifecycle::DISPLAYED)
            .await?
            .into_iter()
            .filter(|j| j.end_time <= windows.lookback.end && j.end_time > windows.lookback.start)
            .collect();

        let tour_ids: Vec<String> = jobs
            .iter()
            .chain(finished.iter())
            .filter_map(|j| j.tour_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cancelled = source.cancelled_tours(&tour_ids).await?;
        let keep = |j: &JobRecord| {
            j.tour_id
                .as_ref()
                .map_or(true, |t| !cancelled.contains(t))
        };
        let before = jobs.len();
        jobs.retain(|j| keep(j));
        finished.retain(|j| keep(j));
        if before != jobs.len() {
            debug!(dropped = before - jobs.len(), "jobs from cancelled tours excluded");
        }

        let all_ids: Vec<JobId> = jobs.iter().map(|j| j.id.clone()).collect();
        let detail_ids: Vec<JobId> = jobs
            .iter()
            .filter(|j| windows.detail.overlaps(j.start_time, j.end_time))
            .map(|j| j.id.clone())
            .collect();
        // Assignments are bounded to the detail window plus recently finished jobs.
        let crew_ids: Vec<JobId> = detail_ids
            .iter()
            .cloned()
            .chain(finished.iter().map(|j| j.id.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let dept_rows = source.job_departments(&all_ids).await?;
        let required_rows = source.required_roles(&all_ids).await?;
        let assignment_rows = source.assignments(&crew_ids).await?;
        let timesheet_rows = source.timesheets(&crew_ids).await?;
        let doc_rows = source.document_counts(&all_ids).await?;
        let baseline_rows = source.doc_requirements().await?;

        let location_ids: Vec<String> = jobs
            .iter()
            .filter_map(|j| j.location_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let location_rows = source.locations(&location_ids).await?;

        let tech_ids: Vec<String> = assignment_rows
            .iter()
            .map(|a| a.technician_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profile_rows = source.profiles(&tech_ids).await?;
        let logistics_rows = source.logistics_events(&windows.detail).await?;

        let mut joined = Joined {
            departments: HashMap::new(),
            required: HashMap::new(),
            assignments: HashMap::new(),
            timesheets: HashMap::new(),
            names: profile_rows
                .into_iter()
                .map(|p| (p.id.clone(), p.display_name()))
                .collect(),
            locations: location_rows.into_iter().map(|l| (l.id, l.name)).collect(),
            doc_counts: doc_rows
                .into_iter()
                .map(|d| ((d.job_id, d.department), d.count))
                .collect(),
            doc_baseline: baseline_rows
                .into_iter()
                .map(|b| (b.department, b.required))
                .collect(),
        };
        for row in dept_rows {
            joined.departments.entry(row.job_id).or_default().insert(row.department);
        }
        for row in required_rows {
            *joined
                .required
                .entry(row.job_id)
                .or_default()
                .entry(row.department)
                .or_insert(0) += row.total_required;
        }
        for row in assignment_rows {
            joined.assignments.entry(row.job_id.clone()).or_default().push(row);
        }
        for row in timesheet_rows {
            joined.timesheets.insert((row.job_id, row.technician_id), row.status);
        }

        let detail_set: HashSet<&JobId> = detail_ids.iter().collect();
        let calendar_jobs: Vec<WallboardJob> = jobs
            .iter()
            .map(|j| build_job(j, &joined, detail_set.contains(&j.id)))
            .collect();
        let overview: Vec<WallboardJob> = calendar_jobs
            .iter()
            .filter(|j| j.detailed)
            .cloned()
            .collect();

        let crew: Vec<CrewJob> = overview.iter().map(|j| build_crew(j, &joined)).collect();
        let docs: Vec<DocJob> = overview.iter().filter_map(build_docs).collect();

        let mut pending: Vec<PendingAction> = overview
            .iter()
            .flat_map(|j| understaffed_actions(j, now))
            .collect();
        for j in &finished {
            let missing = missing_timesheets(&j.id, &joined);
            if let Some(action) =
                timesheet_action(&j.id, &j.title, j.start_time, j.end_time, &missing, now)
            {
                pending.push(action);
            }
        }
        sort_actions(&mut pending);

        let titles: HashMap<&JobId, &str> = jobs.iter().map(|j| (&j.id, j.title.as_str())).collect();
        let logistics: Vec<LogisticsItem> = logistics_rows
            .into_iter()
            .map(|e| LogisticsItem {
                job_title: e
                    .job_id
                    .as_ref()
                    .and_then(|id| titles.get(id))
                    .map(|t| t.to_string()),
                id: e.id,
                at: e.at,
                event_type: e.event_type,
                transport_type: e.transport_type,
                license_plate: e.license_plate,
                departments: e.departments,
                color: e.color,
                job_id: e.job_id,
            })
            .collect();

        info!(
            calendar = calendar_jobs.len(),
            overview = overview.len(),
            pending = pending.len(),
            logistics = logistics.len(),
            "fusion cycle complete"
        );

        Ok(Feeds {
            generated_at: Some(now),
            overview,
            calendar_jobs,
            crew,
            docs,
            pending,
            logistics,
        })
    }
}

fn build_job(record: &JobRecord, joined: &Joined, detailed: bool) -> WallboardJob {
    let tagged = joined.departments.get(&record.id).cloned().unwrap_or_default();
    let crew_needed = joined.required.get(&record.id).cloned().unwrap_or_default();

    // Departments in scope: the job's tags, or those carrying requirements.
    let scope: Vec<Department> = if tagged.is_empty() {
        crew_needed.keys().copied().collect()
    } else {
        tagged.iter().copied().collect()
    };

    let mut crew_assigned: BTreeMap<Department, u32> = BTreeMap::new();
    if let Some(rows) = joined.assignments.get(&record.id) {
        for a in rows {
            for d in a.departments() {
                *crew_assigned.entry(d).or_insert(0) += 1;
            }
        }
    }

    let docs: BTreeMap<Department, DocProgress> = scope
        .iter()
        .map(|d| {
            let progress = DocProgress {
                department: *d,
                have: joined
                    .doc_counts
                    .get(&(record.id.clone(), *d))
                    .copied()
                    .unwrap_or(0),
                need: joined.doc_baseline.get(d).copied().unwrap_or(0),
            };
            (*d, progress)
        })
        .collect();

    let coverage = if detailed {
        let staffing: Vec<DepartmentStaffing> = scope
            .iter()
            .map(|d| DepartmentStaffing {
                department: *d,
                assigned: crew_assigned.get(d).copied().unwrap_or(0),
                required: crew_needed.get(d).copied().unwrap_or(0),
            })
            .collect();
        derive_coverage(&staffing).unwrap_or_else(|| lifecycle_status(record.status))
    } else {
        lifecycle_status(record.status)
    };

    WallboardJob {
        id: record.id.clone(),
        title: record.title.clone(),
        start_time: record.start_time,
        end_time: record.end_time,
        status: record.status,
        departments: scope,
        crew_assigned,
        crew_needed,
        docs,
        coverage,
        color: record.color.clone(),
        job_type: record.job_type.clone(),
        location: record
            .location_id
            .as_ref()
            .and_then(|id| joined.locations.get(id))
            .cloned(),
        detailed,
    }
}

fn build_crew(job: &WallboardJob, joined: &Joined) -> CrewJob {
    let mut crew = Vec::new();
    for a in joined.assignments.get(&job.id).map(Vec::as_slice).unwrap_or(&[]) {
        let timesheet: TimesheetState = joined
            .timesheets
            .get(&(job.id.clone(), a.technician_id.clone()))
            .copied()
            .into();
        let name = joined
            .names
            .get(&a.technician_id)
            .cloned()
            .unwrap_or_else(|| a.technician_id.clone());
        for d in a.departments().into_iter().filter(Department::is_displayed) {
            crew.push(CrewMember {
                technician_id: a.technician_id.clone(),
                name: name.clone(),
                department: d,
                role: a.role_for(d).unwrap_or_default().to_string(),
                timesheet,
            });
        }
    }
    crew.sort_by(|a, b| a.department.cmp(&b.department).then(a.name.cmp(&b.name)));
    CrewJob {
        job_id: job.id.clone(),
        title: job.title.clone(),
        start_time: job.start_time,
        end_time: job.end_time,
        location: job.location.clone(),
        crew,
    }
}

fn build_docs(job: &WallboardJob) -> Option<DocJob> {
    let departments: Vec<DocProgress> = job
        .docs
        .values()
        .filter(|p| p.department.is_displayed())
        .copied()
        .collect();
    if departments.is_empty() {
        return None;
    }
    Some(DocJob {
        job_id: job.id.clone(),
        title: job.title.clone(),
        start_time: job.start_time,
        departments,
    })
}

/// Names of displayed crew on `job_id` without an approved/submitted
/// timesheet. Video-only assignments are left out like everywhere else.
fn missing_timesheets(job_id: &JobId, joined: &Joined) -> Vec<String> {
    let Some(rows) = joined.assignments.get(job_id) else {
        return Vec::new();
    };
    let mut missing: Vec<String> = rows
        .iter()
        .filter(|a| a.departments().iter().any(Department::is_displayed))
        .filter(|a| {
            let state: TimesheetState = joined
                .timesheets
                .get(&(job_id.clone(), a.technician_id.clone()))
                .copied()
                .into();
            !state.is_settled()
        })
        .map(|a| {
            joined
                .names
                .get(&a.technician_id)
                .cloned()
                .unwrap_or_else(|| a.technician_id.clone())
        })
        .collect();
    missing.sort();
    missing.dedup();
    missing
}
