use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use wallboard_store::TimeWindow;

/// Length of the near-term range for which per-job details are fetched.
pub const DETAIL_DAYS: i64 = 7;
/// Cells in the month grid: six full weeks.
pub const CALENDAR_DAYS: i64 = 42;
/// How far back finished jobs are checked for missing timesheets.
pub const TIMESHEET_LOOKBACK_DAYS: i64 = 7;
/// A job must have ended this long ago before its timesheets are chased.
pub const TIMESHEET_GRACE_HOURS: i64 = 24;

/// Every time range one fusion cycle works with, derived from a single "now".
#[derive(Debug, Clone, Serialize)]
pub struct Windows {
    pub now: DateTime<Utc>,
    #[serde(skip)]
    pub offset: FixedOffset,
    /// Local calendar date of `now`.
    pub today: NaiveDate,
    /// Local midnight today → +7 days.
    pub detail: TimeWindow,
    /// Monday on/before the 1st of the focus month → +42 days.
    pub calendar: TimeWindow,
    pub calendar_first_day: NaiveDate,
    /// First day of the focus month.
    pub focus_month: NaiveDate,
    /// Jobs ending in this range are checked for missing timesheets.
    pub lookback: TimeWindow,
}

impl Windows {
    pub fn compute(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let today = local_date(now, offset);
        let detail_start = local_midnight(today, offset);
        let detail = TimeWindow::new(detail_start, detail_start + Duration::days(DETAIL_DAYS));

        let focus_month = today.with_day(1).unwrap_or(today);
        let calendar_first_day = grid_start(focus_month);
        let calendar_start = local_midnight(calendar_first_day, offset);
        let calendar =
            TimeWindow::new(calendar_start, calendar_start + Duration::days(CALENDAR_DAYS));

        let lookback = TimeWindow::new(
            now - Duration::days(TIMESHEET_LOOKBACK_DAYS),
            now - Duration::hours(TIMESHEET_GRACE_HOURS),
        );

        Self {
            now,
            offset,
            today,
            detail,
            calendar,
            calendar_first_day,
            focus_month,
            lookback,
        }
    }

    /// Last calendar day shown in the grid (inclusive).
    pub fn calendar_last_day(&self) -> NaiveDate {
        self.calendar_first_day + Duration::days(CALENDAR_DAYS - 1)
    }
}

/// Monday on or before the first day of `date`'s month.
pub fn grid_start(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first - Duration::days(first.weekday().num_days_from_monday() as i64)
}

/// Local calendar date of an instant.
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// UTC instant of local midnight on `date`.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match offset.from_local_datetime(&naive).single() {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn grid_starts_on_monday_before_first() {
        // 2026-10-01 is a Thursday.
        let start = grid_start(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 9, 28).unwrap());
        assert_eq!(start.weekday(), Weekday::Mon);
    }

    #[test]
    fn grid_start_is_first_when_month_begins_monday() {
        // 2026-06-01 is a Monday.
        let d = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        assert_eq!(grid_start(d), NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    }

    #[test]
    fn windows_cover_expected_ranges() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 14, 30, 0).unwrap();
        let w = Windows::compute(now, utc());
        assert_eq!(w.detail.start, Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap());
        assert_eq!(w.detail.end, Utc.with_ymd_and_hms(2026, 10, 26, 0, 0, 0).unwrap());
        assert_eq!(w.calendar.end - w.calendar.start, Duration::days(42));
        assert_eq!(w.calendar_last_day(), NaiveDate::from_ymd_opt(2026, 11, 8).unwrap());
        assert!(w.calendar.contains(now));
    }

    #[test]
    fn local_offset_shifts_today() {
        // 23:30 UTC is already the next day at UTC+2.
        let now = Utc.with_ymd_and_hms(2026, 10, 31, 23, 30, 0).unwrap();
        let w = Windows::compute(now, FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(w.today, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(w.focus_month, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(w.detail.start, Utc.with_ymd_and_hms(2026, 10, 31, 22, 0, 0).unwrap());
    }
}
