use rusqlite::{Connection, Result};

/// Initialise the replica schema. Safe to call on every startup (idempotent).
///
/// Timestamps are stored as uniform RFC 3339 text (see [`crate::types::encode_ts`])
/// so the window predicates below can compare them lexically.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_job_tables(conn)?;
    create_crew_tables(conn)?;
    create_document_tables(conn)?;
    create_logistics_tables(conn)?;
    create_announcement_tables(conn)?;
    Ok(())
}

fn create_job_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tours (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'active'
        );

        CREATE TABLE IF NOT EXISTS locations (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id          TEXT NOT NULL PRIMARY KEY,
            title       TEXT NOT NULL,
            start_time  TEXT NOT NULL,
            end_time    TEXT NOT NULL,
            status      TEXT NOT NULL,
            tour_id     TEXT,
            location_id TEXT,
            color       TEXT,
            job_type    TEXT NOT NULL DEFAULT 'single'
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_window ON jobs (start_time, end_time);

        CREATE TABLE IF NOT EXISTS job_departments (
            job_id      TEXT NOT NULL,
            department  TEXT NOT NULL,
            PRIMARY KEY (job_id, department)
        );

        CREATE TABLE IF NOT EXISTS job_required_roles (
            job_id          TEXT NOT NULL,
            department      TEXT NOT NULL,
            total_required  INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (job_id, department)
        );",
    )
}

fn create_crew_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT NOT NULL PRIMARY KEY,
            first_name  TEXT NOT NULL DEFAULT '',
            last_name   TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS job_assignments (
            job_id          TEXT NOT NULL,
            technician_id   TEXT NOT NULL,
            sound_role      TEXT,
            lights_role     TEXT,
            video_role      TEXT,
            PRIMARY KEY (job_id, technician_id)
        );

        CREATE TABLE IF NOT EXISTS timesheets (
            job_id          TEXT NOT NULL,
            technician_id   TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'draft',
            PRIMARY KEY (job_id, technician_id)
        );",
    )
}

fn create_document_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS job_documents (
            id          TEXT NOT NULL PRIMARY KEY,
            job_id      TEXT NOT NULL,
            department  TEXT NOT NULL,
            file_name   TEXT NOT NULL,
            uploaded_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_job_documents_job ON job_documents (job_id);

        -- Baseline: how many documents each department is expected to upload per job.
        CREATE TABLE IF NOT EXISTS department_doc_requirements (
            department  TEXT NOT NULL PRIMARY KEY,
            required    INTEGER NOT NULL DEFAULT 0
        );",
    )
}

fn create_logistics_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS logistics_events (
            id              TEXT NOT NULL PRIMARY KEY,
            job_id          TEXT,
            event_type      TEXT NOT NULL,
            transport_type  TEXT NOT NULL,
            license_plate   TEXT,
            event_at        TEXT NOT NULL,
            color           TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_logistics_events_at ON logistics_events (event_at);

        CREATE TABLE IF NOT EXISTS logistics_event_departments (
            event_id    TEXT NOT NULL,
            department  TEXT NOT NULL,
            PRIMARY KEY (event_id, department)
        );",
    )
}

fn create_announcement_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS announcements (
            id          TEXT NOT NULL PRIMARY KEY,
            message     TEXT NOT NULL,
            level       TEXT NOT NULL DEFAULT 'info',
            created_at  TEXT NOT NULL,
            active      INTEGER NOT NULL DEFAULT 1
        );
        CREATE INDEX IF NOT EXISTS idx_announcements_active ON announcements (active, created_at);

        -- Credentials for public display URLs. NULL expiry never expires.
        CREATE TABLE IF NOT EXISTS display_access_tokens (
            token       TEXT NOT NULL PRIMARY KEY,
            expires_at  TEXT
        );",
    )
}
