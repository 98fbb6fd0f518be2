//! Typed job store over the raw repositories.
//!
//! `JobStore` is the single shared mutable resource: every status change
//! funnels through [`JobStore::transition`], a compare-and-set keyed on the
//! job id, so concurrent writers on the same row serialize and the loser
//! observes [`StoreError::Conflict`].

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::db::job_repo::{self, JobRow, TransitionOutcome};
use crate::db::note_repo::{self, NoteRow};
use crate::db::{Database, DatabaseError};
use crate::roster::Role;

pub type JobId = i64;
pub type UserId = i64;

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
        }
    }

    fn parse(s: &str, job_id: JobId) -> JobStatus {
        match s {
            "pending" => JobStatus::Pending,
            "in_progress" => JobStatus::InProgress,
            "completed" => JobStatus::Completed,
            other => {
                log::warn!(
                    "Unknown job status '{}' for job {}, defaulting to Pending",
                    other,
                    job_id
                );
                JobStatus::Pending
            }
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            None
        }
    }
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// A maintenance-site job with its reference data and lifecycle state.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
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
    pub assigned_to: Option<UserId>,
    pub status: JobStatus,
    /// Ordered photo references, each encoding the job id and upload date.
    pub photos: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    pub scheduled_date: Option<NaiveDate>,
    pub priority: String,
}

impl Job {
    fn from_row(row: &JobRow) -> Self {
        let photos = if row.photos.is_empty() {
            Vec::new()
        } else {
            row.photos.split('|').map(str::to_string).collect()
        };
        Self {
            id: row.id,
            site_name: row.site_name.clone(),
            quote: row.quote.clone(),
            address: row.address.clone(),
            order_no: row.order_no.clone(),
            area: row.area.clone(),
            summer_schedule: row.summer_schedule.clone(),
            winter_schedule: row.winter_schedule.clone(),
            contact: row.contact.clone(),
            gate_code: row.gate_code.clone(),
            map_link: row.map_link.clone(),
            assigned_to: row.assigned_to,
            status: JobStatus::parse(&row.status, row.id),
            photos,
            start_time: row.start_time.as_deref().and_then(parse_timestamp),
            finish_time: row.finish_time.as_deref().and_then(parse_timestamp),
            scheduled_date: row
                .scheduled_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
            priority: row.priority.clone(),
        }
    }

    /// Time between start and finish, when both are recorded.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) => Some(finish - start),
            _ => None,
        }
    }
}

/// A job note from the append-only log.
#[derive(Debug, Clone)]
pub struct Note {
    pub author_id: UserId,
    pub author_role: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Note {
    fn from_row(row: &NoteRow) -> Self {
        Self {
            author_id: row.author_id,
            author_role: row.author_role.clone(),
            text: row.note.clone(),
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
}

/// Errors from typed store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(JobId),

    /// A compare-and-set transition lost: the row's status differed from
    /// the expectation. Carries the status observed after the failure.
    #[error("job {id} is '{current}', expected '{expected}'")]
    Conflict {
        id: JobId,
        expected: JobStatus,
        current: JobStatus,
    },

    #[error("store unavailable: {0}")]
    Database(#[from] DatabaseError),
}

/// Typed persistence boundary for jobs and notes.
#[derive(Clone)]
pub struct JobStore {
    db: Database,
}

impl JobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle (cheap to clone).
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn get(&self, id: JobId) -> Result<Job, StoreError> {
        match job_repo::find_by_id(&self.db, id)? {
            Some(row) => Ok(Job::from_row(&row)),
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// Unassigned jobs in stable id order, offset-paginated (1-based).
    pub fn list_unassigned(&self, page: u32, page_size: u32) -> Result<Vec<Job>, StoreError> {
        let rows = job_repo::list_unassigned(&self.db, page, page_size)?;
        Ok(rows.iter().map(Job::from_row).collect())
    }

    /// An employee's jobs that are not yet completed.
    pub fn list_active_for(&self, employee_id: UserId) -> Result<Vec<Job>, StoreError> {
        let rows = job_repo::list_by_assignee(&self.db, employee_id, Some("completed"))?;
        Ok(rows.iter().map(Job::from_row).collect())
    }

    /// An employee's completed jobs, most recently finished first.
    pub fn list_completed_for(&self, employee_id: UserId, limit: u32) -> Result<Vec<Job>, StoreError> {
        let rows = job_repo::list_completed(&self.db, employee_id, limit)?;
        Ok(rows.iter().map(Job::from_row).collect())
    }

    /// Atomic compare-and-set status transition. Records `at` as the start
    /// time when entering InProgress and as the finish time when entering
    /// Completed. The loser of a race gets [`StoreError::Conflict`] and the
    /// row keeps its original timestamps.
    pub fn transition(
        &self,
        id: JobId,
        expected: JobStatus,
        new: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let outcome = job_repo::transition(
            &self.db,
            id,
            expected.as_str(),
            new.as_str(),
            &format_timestamp(at),
        )?;
        match outcome {
            TransitionOutcome::Applied => Ok(()),
            TransitionOutcome::Conflict { current } => Err(StoreError::Conflict {
                id,
                expected,
                current: JobStatus::parse(&current, id),
            }),
            TransitionOutcome::NotFound => Err(StoreError::NotFound(id)),
        }
    }

    /// Assigns the selected jobs to an employee. Best-effort per id; ids
    /// that vanished are skipped. Returns the number assigned.
    pub fn assign(&self, ids: &BTreeSet<JobId>, employee_id: UserId) -> Result<usize, StoreError> {
        let ids: Vec<JobId> = ids.iter().copied().collect();
        Ok(job_repo::assign(&self.db, &ids, employee_id)?)
    }

    pub fn append_photo(&self, id: JobId, photo_ref: &str) -> Result<(), StoreError> {
        if job_repo::append_photo(&self.db, id, photo_ref)? {
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    pub fn append_note(
        &self,
        id: JobId,
        author_id: UserId,
        author_role: Role,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if note_repo::append(
            &self.db,
            id,
            author_id,
            author_role.as_str(),
            text,
            &format_timestamp(at),
        )? {
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    /// A job's most recent notes, newest first.
    pub fn recent_notes(&self, id: JobId, limit: u32) -> Result<Vec<Note>, StoreError> {
        let rows = note_repo::recent_for_job(&self.db, id, limit)?;
        Ok(rows.iter().map(Note::from_row).collect())
    }

    /// Returns stale in-flight jobs to pending. See `job_repo::reset_stale`.
    pub fn reset_stale_jobs(&self, today: NaiveDate) -> Result<usize, StoreError> {
        Ok(job_repo::reset_stale(
            &self.db,
            &today.format("%Y-%m-%d").to_string(),
        )?)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            total: job_repo::count_all(&self.db)?,
            active: job_repo::count_by_status(&self.db, "in_progress")?,
            completed: job_repo::count_by_status(&self.db, "completed")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_store() -> JobStore {
        JobStore::new(Database::open_in_memory().expect("open in-memory DB"))
    }

    fn seed_job(store: &JobStore, site_name: &str) -> JobId {
        let row = JobRow {
            id: 0,
            site_name: site_name.to_string(),
            quote: None,
            address: None,
            order_no: None,
            area: Some("Grounds".to_string()),
            summer_schedule: None,
            winter_schedule: None,
            contact: None,
            gate_code: None,
            map_link: None,
            assigned_to: None,
            status: "pending".to_string(),
            photos: String::new(),
            start_time: None,
            finish_time: None,
            scheduled_date: None,
            priority: "normal".to_string(),
        };
        job_repo::insert(store.database(), &row).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_get_not_found() {
        let store = test_store();
        assert!(matches!(store.get(404), Err(StoreError::NotFound(404))));
    }

    #[test]
    fn test_transition_roundtrip_sets_typed_times() {
        let store = test_store();
        let id = seed_job(&store, "Wessex water");

        store
            .transition(id, JobStatus::Pending, JobStatus::InProgress, at(8))
            .unwrap();
        store
            .transition(id, JobStatus::InProgress, JobStatus::Completed, at(11))
            .unwrap();

        let job = store.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.start_time, Some(at(8)));
        assert_eq!(job.finish_time, Some(at(11)));
        assert_eq!(job.duration(), Some(chrono::Duration::hours(3)));
    }

    #[test]
    fn test_transition_conflict_carries_current_status() {
        let store = test_store();
        let id = seed_job(&store, "Magpie cottage");
        store
            .transition(id, JobStatus::Pending, JobStatus::InProgress, at(8))
            .unwrap();

        let err = store
            .transition(id, JobStatus::Pending, JobStatus::InProgress, at(9))
            .unwrap_err();
        match err {
            StoreError::Conflict { id: got, current, .. } => {
                assert_eq!(got, id);
                assert_eq!(current, JobStatus::InProgress);
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_assign_and_completed_listing_scenario() {
        // Pending/unassigned -> assign -> start -> finish, then the job
        // shows up first in the employee's completed list.
        let store = test_store();
        let earlier = seed_job(&store, "Greenfield Gospel");
        let job42 = seed_job(&store, "Rowling gate 1");

        let mut ids = BTreeSet::new();
        ids.insert(earlier);
        ids.insert(job42);
        assert_eq!(store.assign(&ids, 7).unwrap(), 2);

        store
            .transition(earlier, JobStatus::Pending, JobStatus::InProgress, at(6))
            .unwrap();
        store
            .transition(earlier, JobStatus::InProgress, JobStatus::Completed, at(7))
            .unwrap();

        store
            .transition(job42, JobStatus::Pending, JobStatus::InProgress, at(9))
            .unwrap();
        store
            .transition(job42, JobStatus::InProgress, JobStatus::Completed, at(11))
            .unwrap();

        let job = store.get(job42).unwrap();
        assert_eq!(job.assigned_to, Some(7));
        assert_eq!(job.duration(), Some(chrono::Duration::hours(2)));

        let completed = store.list_completed_for(7, 20).unwrap();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].id, job42);
        assert_eq!(completed[1].id, earlier);
    }

    #[test]
    fn test_concurrent_start_exactly_one_wins() {
        let store = test_store();
        let id = seed_job(&store, "Avonmouth wind farm");

        let s1 = store.clone();
        let s2 = store.clone();
        let h1 = std::thread::spawn(move || {
            s1.transition(id, JobStatus::Pending, JobStatus::InProgress, at(8))
        });
        let h2 = std::thread::spawn(move || {
            s2.transition(id, JobStatus::Pending, JobStatus::InProgress, at(8))
        });

        let results = [h1.join().unwrap(), h2.join().unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Conflict { .. })))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);
    }

    #[test]
    fn test_append_note_and_recent() {
        let store = test_store();
        let id = seed_job(&store, "Trinity lodge");

        store
            .append_note(id, 2, Role::Director, "Bring the strimmer", at(8))
            .unwrap();
        store
            .append_note(id, 7, Role::Employee, "Done, hedge needs a second pass", at(10))
            .unwrap();

        let notes = store.recent_notes(id, 5).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].text, "Done, hedge needs a second pass");
        assert_eq!(notes[0].author_role, "employee");
        assert_eq!(notes[1].author_id, 2);
    }

    #[test]
    fn test_append_note_missing_job() {
        let store = test_store();
        let err = store
            .append_note(404, 2, Role::Director, "lost", at(8))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(404)));
    }

    #[test]
    fn test_reset_stale_jobs_clears_completed() {
        let store = test_store();
        let id = seed_job(&store, "Mercedes Bristol");
        let mut ids = BTreeSet::new();
        ids.insert(id);
        store.assign(&ids, 7).unwrap();
        store
            .transition(id, JobStatus::Pending, JobStatus::InProgress, at(8))
            .unwrap();
        store
            .transition(id, JobStatus::InProgress, JobStatus::Completed, at(10))
            .unwrap();

        let reset = store
            .reset_stale_jobs(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap())
            .unwrap();
        assert_eq!(reset, 1);

        let job = store.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.assigned_to.is_none());
        assert!(job.start_time.is_none());
        assert!(job.finish_time.is_none());
    }

    #[test]
    fn test_stats() {
        let store = test_store();
        let a = seed_job(&store, "Site A");
        seed_job(&store, "Site B");
        store
            .transition(a, JobStatus::Pending, JobStatus::InProgress, at(8))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.completed, 0);
    }

    #[test]
    fn test_job_photos_split() {
        let store = test_store();
        let id = seed_job(&store, "Patchway Camera studios");
        store.append_photo(id, "job_1_2026-03-02_aaa.jpg").unwrap();
        store.append_photo(id, "job_1_2026-03-02_bbb.jpg").unwrap();

        let job = store.get(id).unwrap();
        assert_eq!(
            job.photos,
            vec!["job_1_2026-03-02_aaa.jpg", "job_1_2026-03-02_bbb.jpg"]
        );
    }
}
