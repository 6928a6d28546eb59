use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use wallboard_core::{Department, JobId, Resource, TickerLevel};

use crate::bus::ChangeBus;
use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::source::WallboardSource;
use crate::types::*;

/// [`WallboardSource`] backed by a local SQLite replica of the upstream store.
///
/// Reads run under a `Mutex<Connection>`; the queries are small and bounded
/// so holding the lock across one statement is acceptable. Writes publish a
/// change on the attached [`ChangeBus`], which is how the realtime refresh
/// path learns about them.
pub struct SqliteSource {
    db: Mutex<Connection>,
    bus: Option<ChangeBus>,
    /// Credential presented by this display. Checked on every job fetch.
    access_token: Option<String>,
}

impl SqliteSource {
    /// Wrap a connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            bus: None,
            access_token: None,
        })
    }

    pub fn with_bus(mut self, bus: ChangeBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Require `token` to exist (and be unexpired) in `display_access_tokens`.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn notify(&self, resource: Resource) {
        if let Some(ref bus) = self.bus {
            bus.publish(resource);
        }
    }

    fn check_access(&self, conn: &Connection) -> Result<()> {
        let Some(ref token) = self.access_token else {
            return Ok(());
        };
        let expires: Option<Option<String>> = match conn.query_row(
            "SELECT expires_at FROM display_access_tokens WHERE token = ?1",
            [token],
            |row| row.get(0),
        ) {
            Ok(v) => Some(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(StoreError::Database(e)),
        };
        match expires {
            None => Err(StoreError::AccessDenied("unknown display token".to_string())),
            Some(Some(raw)) => match decode_ts(&raw) {
                Some(at) if at > Utc::now() => Ok(()),
                _ => Err(StoreError::AccessDenied("display token expired".to_string())),
            },
            Some(None) => Ok(()),
        }
    }

    // --- writers -----------------------------------------------------------

    pub fn upsert_job(&self, job: &JobRecord) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO jobs (id, title, start_time, end_time, status, tour_id,
                               location_id, color, job_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title, start_time = excluded.start_time,
                end_time = excluded.end_time, status = excluded.status,
                tour_id = excluded.tour_id, location_id = excluded.location_id,
                color = excluded.color, job_type = excluded.job_type",
            params![
                job.id.as_str(),
                job.title,
                encode_ts(job.start_time),
                encode_ts(job.end_time),
                job.status.as_str(),
                job.tour_id,
                job.location_id,
                job.color,
                job.job_type,
            ],
        )?;
        drop(db);
        debug!(job_id = %job.id, "job upserted");
        self.notify(Resource::Jobs);
        Ok(())
    }

    pub fn upsert_tour(&self, id: &str, name: &str, status: &str) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT INTO tours (id, name, status) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, status = excluded.status",
            params![id, name, status],
        )?;
        self.notify(Resource::Tours);
        Ok(())
    }

    pub fn set_job_departments(&self, job_id: &JobId, departments: &[Department]) -> Result<()> {
        {
            let mut db = self.db.lock().unwrap();
            let tx = db.transaction()?;
            tx.execute(
                "DELETE FROM job_departments WHERE job_id = ?1",
                [job_id.as_str()],
            )?;
            for d in departments {
                tx.execute(
                    "INSERT OR IGNORE INTO job_departments (job_id, department) VALUES (?1, ?2)",
                    params![job_id.as_str(), d.as_str()],
                )?;
            }
            tx.commit()?;
        }
        self.notify(Resource::JobDepartments);
        Ok(())
    }

    pub fn upsert_assignment(&self, a: &AssignmentRecord) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT INTO job_assignments (job_id, technician_id, sound_role, lights_role, video_role)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(job_id, technician_id) DO UPDATE SET
                sound_role = excluded.sound_role, lights_role = excluded.lights_role,
                video_role = excluded.video_role",
            params![
                a.job_id.as_str(),
                a.technician_id,
                a.sound_role,
                a.lights_role,
                a.video_role
            ],
        )?;
        self.notify(Resource::Assignments);
        Ok(())
    }

    pub fn set_required_role(&self, r: &RequiredRoleRecord) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT INTO job_required_roles (job_id, department, total_required)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(job_id, department) DO UPDATE SET total_required = excluded.total_required",
            params![r.job_id.as_str(), r.department.as_str(), r.total_required],
        )?;
        self.notify(Resource::RequiredRoles);
        Ok(())
    }

    pub fn upsert_location(&self, loc: &LocationRecord) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT INTO locations (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![loc.id, loc.name],
        )?;
        self.notify(Resource::Locations);
        Ok(())
    }

    pub fn upsert_profile(&self, p: &ProfileRecord) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT INTO profiles (id, first_name, last_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name, last_name = excluded.last_name",
            params![p.id, p.first_name, p.last_name],
        )?;
        self.notify(Resource::Profiles);
        Ok(())
    }

    pub fn upsert_timesheet(&self, t: &TimesheetRecord) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT INTO timesheets (job_id, technician_id, status) VALUES (?1, ?2, ?3)
             ON CONFLICT(job_id, technician_id) DO UPDATE SET status = excluded.status",
            params![t.job_id.as_str(), t.technician_id, t.status.as_str()],
        )?;
        self.notify(Resource::Timesheets);
        Ok(())
    }

    pub fn add_document(&self, job_id: &JobId, department: Department, file_name: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.db.lock().unwrap().execute(
            "INSERT INTO job_documents (id, job_id, department, file_name, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, job_id.as_str(), department.as_str(), file_name, encode_ts(Utc::now())],
        )?;
        self.notify(Resource::Documents);
        Ok(id)
    }

    pub fn set_doc_requirement(&self, department: Department, required: u32) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT INTO department_doc_requirements (department, required) VALUES (?1, ?2)
             ON CONFLICT(department) DO UPDATE SET required = excluded.required",
            params![department.as_str(), required],
        )?;
        self.notify(Resource::Documents);
        Ok(())
    }

    pub fn insert_logistics_event(&self, e: &LogisticsEventRecord) -> Result<()> {
        {
            let mut db = self.db.lock().unwrap();
            let tx = db.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO logistics_events
                 (id, job_id, event_type, transport_type, license_plate, event_at, color)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    e.id,
                    e.job_id.as_ref().map(|j| j.as_str()),
                    e.event_type,
                    e.transport_type,
                    e.license_plate,
                    encode_ts(e.at),
                    e.color,
                ],
            )?;
            tx.execute(
                "DELETE FROM logistics_event_departments WHERE event_id = ?1",
                [&e.id],
            )?;
            for d in &e.departments {
                tx.execute(
                    "INSERT OR IGNORE INTO logistics_event_departments (event_id, department)
                     VALUES (?1, ?2)",
                    params![e.id, d.as_str()],
                )?;
            }
            tx.commit()?;
        }
        self.notify(Resource::LogisticsEvents);
        self.notify(Resource::LogisticsEventDepartments);
        Ok(())
    }

    /// Insert an active announcement created now.
    pub fn insert_announcement(&self, message: &str, level: TickerLevel) -> Result<AnnouncementRecord> {
        self.insert_announcement_at(message, level, Utc::now())
    }

    pub fn insert_announcement_at(
        &self,
        message: &str,
        level: TickerLevel,
        created_at: DateTime<Utc>,
    ) -> Result<AnnouncementRecord> {
        let record = AnnouncementRecord {
            id: Uuid::now_v7().to_string(),
            message: message.to_string(),
            level,
            created_at,
            active: true,
        };
        self.db.lock().unwrap().execute(
            "INSERT INTO announcements (id, message, level, created_at, active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![
                record.id,
                record.message,
                record.level.to_string(),
                encode_ts(record.created_at)
            ],
        )?;
        info!(announcement_id = %record.id, "announcement stored");
        self.notify(Resource::Announcements);
        Ok(record)
    }

    pub fn add_access_token(&self, token: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        self.db.lock().unwrap().execute(
            "INSERT OR REPLACE INTO display_access_tokens (token, expires_at) VALUES (?1, ?2)",
            params![token, expires_at.map(encode_ts)],
        )?;
        Ok(())
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn malformed(table: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        table: table.to_string(),
        reason: reason.into(),
    }
}

/// Run `sql` with an `IN (…)` list bound to `ids`, mapping each row through `map`.
/// Rows that fail to map are logged and skipped.
fn query_in<T, F>(conn: &Connection, table: &str, sql: &str, ids: &[&str], map: F) -> Result<Vec<T>>
where
    F: Fn(&rusqlite::Row<'_>) -> Result<T>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = sql.replace("{ids}", &placeholders(ids.len()));
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(ids.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        match map(row) {
            Ok(v) => out.push(v),
            Err(e) => warn!(table, error = %e, "skipping malformed row"),
        }
    }
    Ok(out)
}

fn job_id_strs(ids: &[JobId]) -> Vec<&str> {
    ids.iter().map(|id| id.as_str()).collect()
}

fn parse_department(table: &str, raw: &str) -> Result<Department> {
    raw.parse().map_err(|e: String| malformed(table, e))
}

fn parse_ts(table: &str, raw: &str) -> Result<DateTime<Utc>> {
    decode_ts(raw).ok_or_else(|| malformed(table, format!("bad timestamp {raw}")))
}

#[async_trait]
impl WallboardSource for SqliteSource {
    #[instrument(skip(self, statuses), fields(start = %window.start, end = %window.end))]
    async fn jobs_in_window(
        &self,
        window: &TimeWindow,
        statuses: &[JobLifecycle],
    ) -> Result<Vec<JobRecord>> {
        let db = self.db.lock().unwrap();
        self.check_access(&db)?;

        let mut stmt = db.prepare_cached(
            "SELECT id, title, start_time, end_time, status, tour_id, location_id, color, job_type
             FROM jobs
             WHERE start_time < ?1
               AND (end_time > ?2 OR (start_time = end_time AND start_time >= ?2))
             ORDER BY start_time",
        )?;
        let mut rows = stmt.query(params![encode_ts(window.end), encode_ts(window.start)])?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next()? {
            let status_raw: String = row.get(4)?;
            let status: JobLifecycle = match status_raw.parse() {
                Ok(s) => s,
                Err(e) => {
                    warn!(table = "jobs", "skipping job: {e}");
                    continue;
                }
            };
            if !statuses.contains(&status) {
                continue;
            }
            let start_raw: String = row.get(2)?;
            let end_raw: String = row.get(3)?;
            let (Some(start_time), Some(end_time)) = (decode_ts(&start_raw), decode_ts(&end_raw))
            else {
                warn!(table = "jobs", "skipping job with bad timestamps");
                continue;
            };
            jobs.push(JobRecord {
                id: JobId(row.get(0)?),
                title: row.get(1)?,
                start_time,
                end_time,
                status,
                tour_id: row.get(5)?,
                location_id: row.get(6)?,
                color: row.get(7)?,
                job_type: row.get(8)?,
            });
        }
        debug!(count = jobs.len(), "jobs fetched");
        Ok(jobs)
    }

    async fn cancelled_tours(&self, tour_ids: &[String]) -> Result<HashSet<String>> {
        let db = self.db.lock().unwrap();
        let ids: Vec<&str> = tour_ids.iter().map(String::as_str).collect();
        let rows = query_in(
            &db,
            "tours",
            "SELECT id FROM tours WHERE status = 'cancelled' AND id IN ({ids})",
            &ids,
            |row| Ok(row.get::<_, String>(0)?),
        )?;
        Ok(rows.into_iter().collect())
    }

    async fn job_departments(&self, job_ids: &[JobId]) -> Result<Vec<JobDepartmentRecord>> {
        let db = self.db.lock().unwrap();
        query_in(
            &db,
            "job_departments",
            "SELECT job_id, department FROM job_departments WHERE job_id IN ({ids})",
            &job_id_strs(job_ids),
            |row| {
                let raw: String = row.get(1)?;
                Ok(JobDepartmentRecord {
                    job_id: JobId(row.get(0)?),
                    department: parse_department("job_departments", &raw)?,
                })
            },
        )
    }

    async fn assignments(&self, job_ids: &[JobId]) -> Result<Vec<AssignmentRecord>> {
        let db = self.db.lock().unwrap();
        query_in(
            &db,
            "job_assignments",
            "SELECT job_id, technician_id, sound_role, lights_role, video_role
             FROM job_assignments WHERE job_id IN ({ids})",
            &job_id_strs(job_ids),
            |row| {
                Ok(AssignmentRecord {
                    job_id: JobId(row.get(0)?),
                    technician_id: row.get(1)?,
                    sound_role: row.get(2)?,
                    lights_role: row.get(3)?,
                    video_role: row.get(4)?,
                })
            },
        )
    }

    async fn required_roles(&self, job_ids: &[JobId]) -> Result<Vec<RequiredRoleRecord>> {
        let db = self.db.lock().unwrap();
        query_in(
            &db,
            "job_required_roles",
            "SELECT job_id, department, total_required
             FROM job_required_roles WHERE job_id IN ({ids})",
            &job_id_strs(job_ids),
            |row| {
                let raw: String = row.get(1)?;
                Ok(RequiredRoleRecord {
                    job_id: JobId(row.get(0)?),
                    department: parse_department("job_required_roles", &raw)?,
                    total_required: row.get(2)?,
                })
            },
        )
    }

    async fn locations(&self, location_ids: &[String]) -> Result<Vec<LocationRecord>> {
        let db = self.db.lock().unwrap();
        let ids: Vec<&str> = location_ids.iter().map(String::as_str).collect();
        query_in(
            &db,
            "locations",
            "SELECT id, name FROM locations WHERE id IN ({ids})",
            &ids,
            |row| {
                Ok(LocationRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
    }

    async fn profiles(&self, profile_ids: &[String]) -> Result<Vec<ProfileRecord>> {
        let db = self.db.lock().unwrap();
        let ids: Vec<&str> = profile_ids.iter().map(String::as_str).collect();
        query_in(
            &db,
            "profiles",
            "SELECT id, first_name, last_name FROM profiles WHERE id IN ({ids})",
            &ids,
            |row| {
                Ok(ProfileRecord {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                })
            },
        )
    }

    async fn timesheets(&self, job_ids: &[JobId]) -> Result<Vec<TimesheetRecord>> {
        let db = self.db.lock().unwrap();
        query_in(
            &db,
            "timesheets",
            "SELECT job_id, technician_id, status FROM timesheets WHERE job_id IN ({ids})",
            &job_id_strs(job_ids),
            |row| {
                let raw: String = row.get(2)?;
                Ok(TimesheetRecord {
                    job_id: JobId(row.get(0)?),
                    technician_id: row.get(1)?,
                    status: raw.parse().map_err(|e: String| malformed("timesheets", e))?,
                })
            },
        )
    }

    async fn document_counts(&self, job_ids: &[JobId]) -> Result<Vec<DocumentCountRecord>> {
        let db = self.db.lock().unwrap();
        query_in(
            &db,
            "job_documents",
            "SELECT job_id, department, COUNT(*) FROM job_documents
             WHERE job_id IN ({ids}) GROUP BY job_id, department",
            &job_id_strs(job_ids),
            |row| {
                let raw: String = row.get(1)?;
                Ok(DocumentCountRecord {
                    job_id: JobId(row.get(0)?),
                    department: parse_department("job_documents", &raw)?,
                    count: row.get(2)?,
                })
            },
        )
    }

    async fn doc_requirements(&self) -> Result<Vec<DocRequirementRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare_cached("SELECT department, required FROM department_doc_requirements")?;
        let rows: Vec<(String, u32)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows
            .into_iter()
            .filter_map(|(raw, required)| {
                let department = raw.parse().ok()?;
                Some(DocRequirementRecord {
                    department,
                    required,
                })
            })
            .collect())
    }

    async fn logistics_events(&self, window: &TimeWindow) -> Result<Vec<LogisticsEventRecord>> {
        let db = self.db.lock().unwrap();

        let mut departments: HashMap<String, Vec<Department>> = HashMap::new();
        {
            let mut stmt = db.prepare_cached(
                "SELECT d.event_id, d.department
                 FROM logistics_event_departments d
                 JOIN logistics_events e ON e.id = d.event_id
                 WHERE e.event_at >= ?1 AND e.event_at < ?2",
            )?;
            let rows = stmt.query_map(
                params![encode_ts(window.start), encode_ts(window.end)],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )?;
            for (event_id, raw) in rows.filter_map(|r| r.ok()) {
                if let Ok(d) = raw.parse::<Department>() {
                    departments.entry(event_id).or_default().push(d);
                }
            }
        }

        let mut stmt = db.prepare_cached(
            "SELECT id, job_id, event_type, transport_type, license_plate, event_at, color
             FROM logistics_events
             WHERE event_at >= ?1 AND event_at < ?2
             ORDER BY event_at",
        )?;
        let mut rows = stmt.query(params![encode_ts(window.start), encode_ts(window.end)])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let at_raw: String = row.get(5)?;
            let at = match parse_ts("logistics_events", &at_raw) {
                Ok(at) => at,
                Err(e) => {
                    warn!(event_id = %id, error = %e, "skipping logistics event");
                    continue;
                }
            };
            let mut depts = departments.remove(&id).unwrap_or_default();
            depts.sort();
            events.push(LogisticsEventRecord {
                job_id: row.get::<_, Option<String>>(1)?.map(JobId),
                event_type: row.get(2)?,
                transport_type: row.get(3)?,
                license_plate: row.get(4)?,
                at,
                color: row.get(6)?,
                departments: depts,
                id,
            });
        }
        Ok(events)
    }

    async fn announcements(&self, since: DateTime<Utc>) -> Result<Vec<AnnouncementRecord>> {
        let db = self.db.lock().unwrap();
        self.check_access(&db)?;
        let mut stmt = db.prepare_cached(
            "SELECT id, message, level, created_at, active FROM announcements
             WHERE active = 1 OR created_at >= ?1
             ORDER BY created_at",
        )?;
        let mut rows = stmt.query([encode_ts(since)])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let created_raw: String = row.get(3)?;
            let Some(created_at) = decode_ts(&created_raw) else {
                warn!(announcement_id = %id, "skipping announcement with bad timestamp");
                continue;
            };
            let level_raw: String = row.get(2)?;
            out.push(AnnouncementRecord {
                message: row.get(1)?,
                level: level_raw.parse().unwrap_or_default(),
                created_at,
                active: row.get::<_, i64>(4)? != 0,
                id,
            });
        }
        Ok(out)
    }

    async fn deactivate_announcements(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let n = {
            let db = self.db.lock().unwrap();
            let sql = format!(
                "UPDATE announcements SET active = 0 WHERE id IN ({})",
                placeholders(ids.len())
            );
            db.execute(&sql, params_from_iter(ids.iter()))?
        };
        info!(count = n, "announcements deactivated");
        if n > 0 {
            self.notify(Resource::Announcements);
        }
        Ok(())
    }
}
