//! Employee-side job lifecycle operations.
//!
//! Enforces the Pending → InProgress → Completed state machine on top of
//! the store's compare-and-set transitions, and manages the bulk
//! photo-upload mode flags in the employee's session.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::photos::{count_for_date, effective_date, PhotoError};
use crate::roster::Role;
use crate::session::{AwaitingInput, SessionStore};
use crate::store::{Job, JobId, JobStatus, JobStore, StoreError, UserId};
use crate::weather::is_outdoor_area;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job {0} is already in progress")]
    AlreadyInProgress(JobId),

    #[error("job {0} is already completed")]
    AlreadyCompleted(JobId),

    #[error("job {0} has not been started yet")]
    NotStarted(JobId),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => LifecycleError::NotFound(id),
            other => LifecycleError::Store(other),
        }
    }
}

/// An action currently legal on a job, used to build its screen menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobAction {
    Start,
    Finish,
    AddNote,
    UploadPhoto,
    /// Photos exist for the effective date; carries the count.
    ViewPhotos(usize),
    SiteInfo,
    MapLink,
    Weather,
}

/// Employee-side operations on a single job.
pub struct JobLifecycle {
    store: JobStore,
    sessions: Arc<SessionStore>,
    photo_quota: u32,
}

impl JobLifecycle {
    pub fn new(store: JobStore, sessions: Arc<SessionStore>, photo_quota: u32) -> Self {
        Self {
            store,
            sessions,
            photo_quota,
        }
    }

    /// Starts a pending job, recording `at` as its start time.
    pub fn start(&self, job_id: JobId, at: DateTime<Utc>) -> Result<Job, LifecycleError> {
        match self
            .store
            .transition(job_id, JobStatus::Pending, JobStatus::InProgress, at)
        {
            Ok(()) => {
                log::info!("Job {} started", job_id);
                Ok(self.store.get(job_id)?)
            }
            Err(StoreError::Conflict { current, .. }) => Err(match current {
                JobStatus::InProgress => LifecycleError::AlreadyInProgress(job_id),
                JobStatus::Completed => LifecycleError::AlreadyCompleted(job_id),
                JobStatus::Pending => LifecycleError::Store(StoreError::Conflict {
                    id: job_id,
                    expected: JobStatus::Pending,
                    current,
                }),
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Finishes an in-progress job, recording `at` as its finish time.
    pub fn finish(&self, job_id: JobId, at: DateTime<Utc>) -> Result<Job, LifecycleError> {
        match self
            .store
            .transition(job_id, JobStatus::InProgress, JobStatus::Completed, at)
        {
            Ok(()) => {
                log::info!("Job {} completed", job_id);
                Ok(self.store.get(job_id)?)
            }
            Err(StoreError::Conflict { current, .. }) => Err(match current {
                JobStatus::Completed => LifecycleError::AlreadyCompleted(job_id),
                JobStatus::Pending => LifecycleError::NotStarted(job_id),
                JobStatus::InProgress => LifecycleError::Store(StoreError::Conflict {
                    id: job_id,
                    expected: JobStatus::InProgress,
                    current,
                }),
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Appends a note to a job's audit log.
    pub fn add_note(
        &self,
        job_id: JobId,
        author: UserId,
        role: Role,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        self.store.append_note(job_id, author, role, text, at)?;
        Ok(())
    }

    /// Enters bulk photo-upload mode for a job: checks today's quota
    /// headroom, then arms the awaiting-photo flag (replacing any other
    /// awaiting mode). Returns today's current count.
    pub fn begin_photo_upload(
        &self,
        user: UserId,
        job_id: JobId,
        today: NaiveDate,
    ) -> Result<usize, LifecycleError> {
        let job = self.store.get(job_id)?;
        let count = count_for_date(&job.photos, today);
        if count >= self.photo_quota as usize {
            // A stale armed flag would keep inviting doomed uploads.
            self.sessions.clear_awaiting(user);
            return Err(PhotoError::QuotaExceeded {
                job_id,
                count,
                quota: self.photo_quota,
            }
            .into());
        }

        self.sessions
            .set_awaiting(user, AwaitingInput::Photo { job_id, bulk: true });
        Ok(count)
    }

    /// Leaves bulk upload mode, clearing the awaiting flags. Returns
    /// today's final count for the confirmation.
    pub fn end_photo_upload(
        &self,
        user: UserId,
        job_id: JobId,
        today: NaiveDate,
    ) -> Result<usize, LifecycleError> {
        self.sessions.clear_awaiting(user);
        let job = self.store.get(job_id)?;
        Ok(count_for_date(&job.photos, today))
    }

    /// Arms the awaiting-note flag for a job (replacing any other
    /// awaiting mode).
    pub fn begin_note(&self, user: UserId, job_id: JobId) -> Result<Job, LifecycleError> {
        let job = self.store.get(job_id)?;
        self.sessions
            .set_awaiting(user, AwaitingInput::Note { job_id });
        Ok(job)
    }

    pub fn cancel_note(&self, user: UserId) {
        self.sessions.clear_awaiting(user);
    }

    /// Derives the actions legal on a job right now. Photo viewing is
    /// offered only when the effective date actually has photos; map and
    /// site-info only when the data exists; weather only for outdoor
    /// areas (and only when a provider is wired up).
    pub fn available_actions(&self, job: &Job, weather_enabled: bool) -> Vec<JobAction> {
        let mut actions = Vec::new();
        match job.status {
            JobStatus::Pending => actions.push(JobAction::Start),
            JobStatus::InProgress => {
                actions.push(JobAction::Finish);
                actions.push(JobAction::AddNote);
                actions.push(JobAction::UploadPhoto);
            }
            JobStatus::Completed => {}
        }

        let photo_count = count_for_date(&job.photos, effective_date(job));
        if photo_count > 0 {
            actions.push(JobAction::ViewPhotos(photo_count));
        }
        if job.contact.is_some() || job.gate_code.is_some() {
            actions.push(JobAction::SiteInfo);
        }
        if job.map_link.is_some() {
            actions.push(JobAction::MapLink);
        }
        if weather_enabled
            && job
                .area
                .as_deref()
                .map(is_outdoor_area)
                .unwrap_or(false)
        {
            actions.push(JobAction::Weather);
        }
        actions
    }
}
