//! Calendar Grid Builder.
//!
//! A fixed six-week grid starting on the Monday on/before the first of the
//! focus month. Multi-day jobs are fanned out here and nowhere else: a job is
//! clipped to the grid window and added to every local day it touches.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use wallboard_core::{CoverageStatus, JobId};
use wallboard_fusion::window::{local_date, CALENDAR_DAYS};
use wallboard_fusion::{WallboardJob, Windows};

/// One job as drawn inside one day cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry {
    pub job_id: JobId,
    pub title: String,
    pub coverage: CoverageStatus,
    pub color: Option<String>,
    /// True on the job's primary (start) date.
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub jobs: Vec<CalendarEntry>,
    /// Highlighted jobs whose primary date is this cell.
    pub highlighted: Vec<JobId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarGrid {
    pub focus_month: NaiveDate,
    pub first_day: NaiveDate,
    /// Always exactly 42 cells.
    pub cells: Vec<CalendarCell>,
    /// Job → start date, used for highlight lookups.
    pub primary_dates: BTreeMap<JobId, NaiveDate>,
}

impl CalendarGrid {
    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        let offset = (date - self.first_day).num_days();
        if (0..CALENDAR_DAYS).contains(&offset) {
            self.cells.get(offset as usize)
        } else {
            None
        }
    }

    /// Cell on which a highlight for `job_id` is drawn.
    pub fn highlight_cell(&self, job_id: &JobId) -> Option<&CalendarCell> {
        let primary = *self.primary_dates.get(job_id)?;
        self.cell(primary.max(self.first_day))
    }
}

/// Rebuild the grid wholesale from the calendar feed.
pub fn build_calendar(
    jobs: &[WallboardJob],
    windows: &Windows,
    highlights: &BTreeSet<JobId>,
) -> CalendarGrid {
    let first_day = windows.calendar_first_day;
    let mut cells: Vec<CalendarCell> = (0..CALENDAR_DAYS)
        .map(|i| {
            let date = first_day + Duration::days(i);
            CalendarCell {
                date,
                in_month: date.year() == windows.focus_month.year()
                    && date.month() == windows.focus_month.month(),
                is_today: date == windows.today,
                jobs: Vec::new(),
                highlighted: Vec::new(),
            }
        })
        .collect();

    let mut primary_dates = BTreeMap::new();
    let window = windows.calendar;

    for job in jobs {
        let primary = local_date(job.start_time, windows.offset);
        primary_dates.insert(job.id.clone(), primary);

        if !window.overlaps(job.start_time, job.end_time) {
            continue;
        }
        let start = job.start_time.max(window.start);
        let end = job.end_time.min(window.end);
        // The end instant is exclusive: a job ending at midnight does not
        // occupy the following day.
        let last = if end > start {
            (end - Duration::seconds(1)).max(start)
        } else {
            start
        };

        let first_idx = (local_date(start, windows.offset) - first_day).num_days().max(0);
        let last_idx = (local_date(last, windows.offset) - first_day)
            .num_days()
            .min(CALENDAR_DAYS - 1);

        for idx in first_idx..=last_idx {
            let cell = &mut cells[idx as usize];
            let is_primary = cell.date == primary;
            cell.jobs.push(CalendarEntry {
                job_id: job.id.clone(),
                title: job.title.clone(),
                coverage: job.coverage,
                color: job.color.clone(),
                primary: is_primary,
            });
        }

        if highlights.contains(&job.id) {
            let anchor = (primary.max(first_day) - first_day).num_days();
            if (0..CALENDAR_DAYS).contains(&anchor) {
                cells[anchor as usize].highlighted.push(job.id.clone());
            }
        }
    }

    CalendarGrid {
        focus_month: windows.focus_month,
        first_day,
        cells,
        primary_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};
    use wallboard_store::JobLifecycle;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn windows() -> Windows {
        Windows::compute(now(), FixedOffset::east_opt(0).unwrap())
    }

    fn job(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> WallboardJob {
        WallboardJob {
            id: JobId::from(id),
            title: id.to_string(),
            start_time: start,
            end_time: end,
            status: JobLifecycle::Confirmed,
            departments: Vec::new(),
            crew_assigned: BTreeMap::new(),
            crew_needed: BTreeMap::new(),
            docs: BTreeMap::new(),
            coverage: CoverageStatus::Green,
            color: None,
            job_type: "single".to_string(),
            location: None,
            detailed: false,
        }
    }

    fn cells_with(grid: &CalendarGrid, id: &str) -> Vec<NaiveDate> {
        grid.cells
            .iter()
            .filter(|c| c.jobs.iter().any(|e| e.job_id.as_str() == id))
            .map(|c| c.date)
            .collect()
    }

    #[test]
    fn grid_has_42_cells_and_one_today() {
        let grid = build_calendar(&[], &windows(), &BTreeSet::new());
        assert_eq!(grid.cells.len(), 42);
        assert_eq!(grid.cells.iter().filter(|c| c.is_today).count(), 1);
        assert_eq!(grid.first_day, NaiveDate::from_ymd_opt(2026, 9, 28).unwrap());
        assert!(!grid.cells[0].in_month);
        assert!(grid.cells[3].in_month);
    }

    #[test]
    fn multi_day_job_fills_every_day() {
        let start = Utc.with_ymd_and_hms(2026, 10, 21, 18, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 24, 2, 0, 0).unwrap();
        let grid = build_calendar(&[job("fest", start, end)], &windows(), &BTreeSet::new());

        let days = cells_with(&grid, "fest");
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
        assert_eq!(days[3], NaiveDate::from_ymd_opt(2026, 10, 24).unwrap());

        let primaries: Vec<_> = grid
            .cells
            .iter()
            .flat_map(|c| c.jobs.iter())
            .filter(|e| e.primary)
            .collect();
        assert_eq!(primaries.len(), 1);
    }

    #[test]
    fn job_ending_at_midnight_stays_on_its_day() {
        let start = Utc.with_ymd_and_hms(2026, 10, 10, 20, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 11, 0, 0, 0).unwrap();
        let grid = build_calendar(&[job("late", start, end)], &windows(), &BTreeSet::new());
        assert_eq!(
            cells_with(&grid, "late"),
            vec![NaiveDate::from_ymd_opt(2026, 10, 10).unwrap()]
        );
    }

    #[test]
    fn job_crossing_grid_start_is_clipped() {
        let start = Utc.with_ymd_and_hms(2026, 9, 20, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 9, 30, 10, 0, 0).unwrap();
        let mut highlights = BTreeSet::new();
        highlights.insert(JobId::from("tour"));
        let grid = build_calendar(&[job("tour", start, end)], &windows(), &highlights);

        // 28, 29, 30 September.
        assert_eq!(cells_with(&grid, "tour").len(), 3);
        assert_eq!(
            grid.primary_dates.get(&JobId::from("tour")),
            Some(&NaiveDate::from_ymd_opt(2026, 9, 20).unwrap())
        );
        // Highlight is drawn on the first visible day.
        assert_eq!(grid.cells[0].highlighted, vec![JobId::from("tour")]);
    }

    #[test]
    fn highlight_marks_primary_date_only() {
        let start = Utc.with_ymd_and_hms(2026, 10, 21, 18, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 23, 2, 0, 0).unwrap();
        let mut highlights = BTreeSet::new();
        highlights.insert(JobId::from("fest"));
        let grid = build_calendar(&[job("fest", start, end)], &windows(), &highlights);

        let marked: Vec<_> = grid.cells.iter().filter(|c| !c.highlighted.is_empty()).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].date, NaiveDate::from_ymd_opt(2026, 10, 21).unwrap());
        assert_eq!(
            grid.highlight_cell(&JobId::from("fest")).map(|c| c.date),
            Some(marked[0].date)
        );
    }

    #[test]
    fn jobs_outside_grid_are_ignored() {
        let start = Utc.with_ymd_and_hms(2026, 12, 20, 10, 0, 0).unwrap();
        let grid = build_calendar(
            &[job("far", start, start + Duration::hours(3))],
            &windows(),
            &BTreeSet::new(),
        );
        assert!(cells_with(&grid, "far").is_empty());
    }
}
