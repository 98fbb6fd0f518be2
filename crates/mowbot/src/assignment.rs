//! Director-side assignment workflow.
//!
//! Multi-select over the unassigned pool with offset pagination. The
//! selection set lives in the director's session and survives paging;
//! it is cleared on entry and again after a successful bulk assign.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::session::SessionStore;
use crate::store::{Job, JobId, JobStore, StoreError, UserId};

#[derive(Error, Debug)]
pub enum AssignmentError {
    /// "Assign Selected" pressed with nothing selected.
    #[error("no jobs selected")]
    EmptySelection,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One page of the assignment list.
#[derive(Debug)]
pub struct AssignmentPage {
    /// 1-based page number.
    pub page: u32,
    pub jobs: Vec<Job>,
    pub selected: BTreeSet<JobId>,
    /// Heuristic: a full page may be followed by another one.
    pub has_next: bool,
}

/// Drives a director's multi-select + paginate + bulk-assign flow.
pub struct AssignmentWorkflow {
    store: JobStore,
    sessions: Arc<SessionStore>,
    page_size: u32,
}

impl AssignmentWorkflow {
    pub fn new(store: JobStore, sessions: Arc<SessionStore>, page_size: u32) -> Self {
        Self {
            store,
            sessions,
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Enters the workflow: selection cleared, cursor back to page 1.
    pub fn enter(&self, director: UserId) -> Result<AssignmentPage, AssignmentError> {
        self.sessions.clear_selection(director);
        self.sessions.set_page(director, 1);
        self.load_page(director, 1)
    }

    /// Flips one job in the selection set and re-reads the current page.
    pub fn toggle(&self, director: UserId, job_id: JobId) -> Result<AssignmentPage, AssignmentError> {
        self.sessions.toggle_selection(director, job_id);
        self.load_page(director, self.sessions.page(director))
    }

    /// Moves the page cursor. Selections persist across pages.
    pub fn goto_page(&self, director: UserId, page: u32) -> Result<AssignmentPage, AssignmentError> {
        let page = page.max(1);
        self.sessions.set_page(director, page);
        self.load_page(director, page)
    }

    fn load_page(&self, director: UserId, page: u32) -> Result<AssignmentPage, AssignmentError> {
        let jobs = self.store.list_unassigned(page, self.page_size)?;
        let has_next = jobs.len() as u32 == self.page_size;
        Ok(AssignmentPage {
            page,
            jobs,
            selected: self.sessions.selected_jobs(director),
            has_next,
        })
    }

    /// Guard for "Assign Selected": the selection must be non-empty
    /// before the employee choice is offered.
    pub fn require_selection(&self, director: UserId) -> Result<BTreeSet<JobId>, AssignmentError> {
        let selected = self.sessions.selected_jobs(director);
        if selected.is_empty() {
            return Err(AssignmentError::EmptySelection);
        }
        Ok(selected)
    }

    /// Assigns the selection to an employee and clears it. Returns the
    /// number of jobs actually assigned (vanished ids are skipped).
    pub fn assign_selected(
        &self,
        director: UserId,
        employee: UserId,
    ) -> Result<usize, AssignmentError> {
        let selected = self.require_selection(director)?;
        let assigned = self.store.assign(&selected, employee)?;
        self.sessions.clear_selection(director);
        log::info!(
            "Director {} assigned {} job(s) to employee {}",
            director,
            assigned,
            employee
        );
        Ok(assigned)
    }
}
