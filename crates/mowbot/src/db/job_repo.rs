//! Job repository — queries and atomic mutations for the `jobs` table.
//!
//! Status transitions go through [`transition`], a compare-and-set UPDATE
//! keyed on `(id, status)` so that two racing writers can never both
//! succeed. Everything else is plain row-at-a-time SQL.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: i64,
    pub site_name: String,
    pub quote: Option<String>,
    pub address: Option<String>,
    pub order_no: Option<String>,
    pub area: Option<String>,
    pub summer_schedule: Option<String>,
    pub winter_schedule: Option<String>,
    pub contact: Option<String>,
    pub gate_code: Option<String>,
    pub map_link: Option<String>,
    pub assigned_to: Option<i64>,
    pub status: String,
    pub photos: String,
    pub start_time: Option<String>,
    pub finish_time: Option<String>,
    pub scheduled_date: Option<String>,
    pub priority: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            site_name: row.get("site_name")?,
            quote: row.get("quote")?,
            address: row.get("address")?,
            order_no: row.get("order_no")?,
            area: row.get("area")?,
            summer_schedule: row.get("summer_schedule")?,
            winter_schedule: row.get("winter_schedule")?,
            contact: row.get("contact")?,
            gate_code: row.get("gate_code")?,
            map_link: row.get("map_link")?,
            assigned_to: row.get("assigned_to")?,
            status: row.get("status")?,
            photos: row.get("photos")?,
            start_time: row.get("start_time")?,
            finish_time: row.get("finish_time")?,
            scheduled_date: row.get("scheduled_date")?,
            priority: row.get("priority")?,
        })
    }
}

/// Outcome of a compare-and-set status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The row matched the expected status and was updated.
    Applied,
    /// The row exists but its status differed from the expectation.
    /// Carries the status observed after the failed update.
    Conflict { current: String },
    /// No row with that id.
    NotFound,
}

/// Inserts a new job row (site attributes + initial state) and returns
/// its id. The `id` field of the passed row is ignored.
pub fn insert(db: &Database, job: &JobRow) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (site_name, quote, address, order_no, area, summer_schedule,
             winter_schedule, contact, gate_code, map_link, assigned_to, status, photos,
             start_time, finish_time, scheduled_date, priority)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                job.site_name,
                job.quote,
                job.address,
                job.order_no,
                job.area,
                job.summer_schedule,
                job.winter_schedule,
                job.contact,
                job.gate_code,
                job.map_link,
                job.assigned_to,
                job.status,
                job.photos,
                job.start_time,
                job.finish_time,
                job.scheduled_date,
                job.priority,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row("SELECT * FROM jobs WHERE id = ?1", params![id], |r| {
                JobRow::from_row(r)
            })
            .optional()?;
        Ok(row)
    })
}

/// Lists unassigned jobs in stable id order, offset-paginated.
/// `page` is 1-based. Returns fewer than `page_size` rows only on the
/// final page.
pub fn list_unassigned(db: &Database, page: u32, page_size: u32) -> Result<Vec<JobRow>, DatabaseError> {
    let offset = (page.saturating_sub(1) as i64) * page_size as i64;
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs WHERE assigned_to IS NULL ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let rows: Vec<JobRow> = stmt
            .query_map(params![page_size as i64, offset], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists jobs assigned to an employee, optionally excluding one status,
/// in stable id order.
pub fn list_by_assignee(
    db: &Database,
    employee_id: i64,
    exclude_status: Option<&str>,
) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let rows = match exclude_status {
            Some(excluded) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM jobs WHERE assigned_to = ?1 AND status != ?2 ORDER BY id",
                )?;
                let rows = stmt
                    .query_map(params![employee_id, excluded], JobRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM jobs WHERE assigned_to = ?1 ORDER BY id")?;
                let rows = stmt
                    .query_map(params![employee_id], JobRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    })
}

/// Lists an employee's completed jobs, most recently finished first.
pub fn list_completed(
    db: &Database,
    employee_id: i64,
    limit: u32,
) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs WHERE assigned_to = ?1 AND status = 'completed'
             ORDER BY finish_time DESC LIMIT ?2",
        )?;
        let rows: Vec<JobRow> = stmt
            .query_map(params![employee_id, limit as i64], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Compare-and-set status transition.
///
/// Applies `expected -> new` in a single UPDATE guarded on the current
/// status. Transitions into `in_progress` record `timestamp` as the start
/// time; transitions into `completed` record it as the finish time. A
/// failed guard leaves every column untouched.
pub fn transition(
    db: &Database,
    id: i64,
    expected: &str,
    new: &str,
    timestamp: &str,
) -> Result<TransitionOutcome, DatabaseError> {
    db.with_conn(|conn| {
        let changed = match new {
            "in_progress" => conn.execute(
                "UPDATE jobs SET status = ?3, start_time = ?4 WHERE id = ?1 AND status = ?2",
                params![id, expected, new, timestamp],
            )?,
            "completed" => conn.execute(
                "UPDATE jobs SET status = ?3, finish_time = ?4 WHERE id = ?1 AND status = ?2",
                params![id, expected, new, timestamp],
            )?,
            _ => conn.execute(
                "UPDATE jobs SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![id, expected, new],
            )?,
        };

        if changed == 1 {
            return Ok(TransitionOutcome::Applied);
        }

        let current: Option<String> = conn
            .query_row("SELECT status FROM jobs WHERE id = ?1", params![id], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(match current {
            Some(current) => TransitionOutcome::Conflict { current },
            None => TransitionOutcome::NotFound,
        })
    })
}

/// Assigns every listed job to an employee. Best-effort per id: ids that
/// no longer exist are silently skipped. Returns the number of rows
/// actually assigned.
pub fn assign(db: &Database, ids: &[i64], employee_id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let mut assigned = 0;
        for id in ids {
            assigned += conn.execute(
                "UPDATE jobs SET assigned_to = ?2 WHERE id = ?1",
                params![id, employee_id],
            )?;
        }
        Ok(assigned)
    })
}

/// Appends a photo reference to a job's ordered photo list. Returns
/// false when the job does not exist.
pub fn append_photo(db: &Database, id: i64, photo_ref: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET photos = CASE
                 WHEN photos = '' THEN ?2
                 ELSE photos || '|' || ?2
             END
             WHERE id = ?1",
            params![id, photo_ref],
        )?;
        Ok(changed == 1)
    })
}

/// Returns stale in-flight jobs to the pending pool: any job that is
/// in_progress or completed and whose scheduled date is unset or equals
/// `today` loses its assignee and start/finish times. Returns the number
/// of rows reset.
pub fn reset_stale(db: &Database, today: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let reset = conn.execute(
            "UPDATE jobs SET status = 'pending',
                 assigned_to = NULL,
                 start_time = NULL,
                 finish_time = NULL
             WHERE status IN ('in_progress', 'completed')
             AND (scheduled_date IS NULL OR scheduled_date = ?1)",
            params![today],
        )?;
        Ok(reset)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Counts all jobs.
pub fn count_all(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))?;
        Ok(count)
    })
}
