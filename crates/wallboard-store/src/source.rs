use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wallboard_core::JobId;

use crate::error::Result;
use crate::types::*;

/// Read interface over the upstream scheduling store.
///
/// Each method maps to one bounded query. Implementations must be `Send + Sync`
/// so a single source can be shared between the engine's fetch tasks and the
/// gateway's announcement ingress.
#[async_trait]
pub trait WallboardSource: Send + Sync {
    /// Jobs whose interval overlaps `window` and whose status is in `statuses`.
    async fn jobs_in_window(
        &self,
        window: &TimeWindow,
        statuses: &[JobLifecycle],
    ) -> Result<Vec<JobRecord>>;

    /// Subset of `tour_ids` whose tour has been cancelled.
    async fn cancelled_tours(&self, tour_ids: &[String]) -> Result<HashSet<String>>;

    async fn job_departments(&self, job_ids: &[JobId]) -> Result<Vec<JobDepartmentRecord>>;

    async fn assignments(&self, job_ids: &[JobId]) -> Result<Vec<AssignmentRecord>>;

    async fn required_roles(&self, job_ids: &[JobId]) -> Result<Vec<RequiredRoleRecord>>;

    async fn locations(&self, location_ids: &[String]) -> Result<Vec<LocationRecord>>;

    async fn profiles(&self, profile_ids: &[String]) -> Result<Vec<ProfileRecord>>;

    async fn timesheets(&self, job_ids: &[JobId]) -> Result<Vec<TimesheetRecord>>;

    async fn document_counts(&self, job_ids: &[JobId]) -> Result<Vec<DocumentCountRecord>>;

    async fn doc_requirements(&self) -> Result<Vec<DocRequirementRecord>>;

    /// Logistics events scheduled inside `window`, with their department tags.
    async fn logistics_events(&self, window: &TimeWindow) -> Result<Vec<LogisticsEventRecord>>;

    /// Every active announcement plus inactive ones created at or after `since`.
    async fn announcements(&self, since: DateTime<Utc>) -> Result<Vec<AnnouncementRecord>>;

    /// Mark announcements inactive. Best effort from the caller's perspective.
    async fn deactivate_announcements(&self, ids: &[String]) -> Result<()>;
}
