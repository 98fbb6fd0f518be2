//! Note repository — append-only log of job notes.
//!
//! One row per note, never merged into the job row, so the full audit
//! trail of who wrote what (and when) survives.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw note row from the database.
#[derive(Debug, Clone)]
pub struct NoteRow {
    pub id: i64,
    pub job_id: i64,
    pub author_id: i64,
    pub author_role: String,
    pub note: String,
    pub created_at: String,
}

impl NoteRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            author_id: row.get("author_id")?,
            author_role: row.get("author_role")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Appends a note to a job. Returns false when the job does not exist
/// (nothing is written).
pub fn append(
    db: &Database,
    job_id: i64,
    author_id: i64,
    author_role: &str,
    note: &str,
    created_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let exists: Option<i64> = conn
            .query_row("SELECT id FROM jobs WHERE id = ?1", params![job_id], |r| {
                r.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO job_notes (job_id, author_id, author_role, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![job_id, author_id, author_role, note, created_at],
        )?;
        Ok(true)
    })
}

/// Lists a job's notes in the order they were written.
pub fn list_for_job(db: &Database, job_id: i64) -> Result<Vec<NoteRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM job_notes WHERE job_id = ?1 ORDER BY created_at, id",
        )?;
        let rows: Vec<NoteRow> = stmt
            .query_map(params![job_id], NoteRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists a job's most recent notes, newest first.
pub fn recent_for_job(db: &Database, job_id: i64, limit: u32) -> Result<Vec<NoteRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM job_notes WHERE job_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows: Vec<NoteRow> = stmt
            .query_map(params![job_id, limit as i64], NoteRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
