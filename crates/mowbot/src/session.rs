//! Per-user ephemeral session state.
//!
//! Scratch state for multi-step UI flows only — never the source of truth
//! for job data. Entries live in process memory and are lost on restart,
//! which is accepted. At most one awaiting-input mode can be active per
//! user: arming a new one replaces whatever was armed before, so a stale
//! flag can never intercept an unrelated later message.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::store::{JobId, UserId};

/// The one input the user is expected to send next, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwaitingInput {
    /// A photo upload for a job. `bulk` suppresses per-photo confirmations.
    Photo { job_id: JobId, bulk: bool },
    /// Free-text note for a job.
    Note { job_id: JobId },
}

/// Cursor state for browsing a job's photos for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoViewer {
    pub job_id: JobId,
    pub refs: Vec<String>,
    pub date: NaiveDate,
    /// Index into `refs` for the single-photo pager.
    pub index: usize,
    /// Zero-based page for the grid pager.
    pub page: usize,
}

#[derive(Debug, Default)]
struct UserSession {
    selected_jobs: BTreeSet<JobId>,
    current_page: u32,
    awaiting: Option<AwaitingInput>,
    photo_viewer: Option<PhotoViewer>,
}

/// In-memory session store keyed by user id.
///
/// The platform delivers at most one interaction per user at a time, so
/// per-user fields need no finer locking than the map-wide `RwLock`.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, UserSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, user_id: UserId, f: impl FnOnce(Option<&UserSession>) -> T) -> T {
        let guard = match self.sessions.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Session store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        f(guard.get(&user_id))
    }

    fn write<T>(&self, user_id: UserId, f: impl FnOnce(&mut UserSession) -> T) -> T {
        let mut guard = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Session store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        f(guard.entry(user_id).or_default())
    }

    // ─── Selection set ──────────────────────────────────────────────────

    pub fn selected_jobs(&self, user_id: UserId) -> BTreeSet<JobId> {
        self.read(user_id, |s| {
            s.map(|s| s.selected_jobs.clone()).unwrap_or_default()
        })
    }

    /// Flips a job's membership in the selection set. Returns whether the
    /// job is selected afterwards. Toggling twice restores the set.
    pub fn toggle_selection(&self, user_id: UserId, job_id: JobId) -> bool {
        self.write(user_id, |s| {
            if s.selected_jobs.remove(&job_id) {
                false
            } else {
                s.selected_jobs.insert(job_id);
                true
            }
        })
    }

    pub fn clear_selection(&self, user_id: UserId) {
        self.write(user_id, |s| s.selected_jobs.clear());
    }

    // ─── Pagination cursor ──────────────────────────────────────────────

    /// Current assignment-list page, 1-based.
    pub fn page(&self, user_id: UserId) -> u32 {
        self.read(user_id, |s| {
            s.map(|s| s.current_page).filter(|p| *p > 0).unwrap_or(1)
        })
    }

    pub fn set_page(&self, user_id: UserId, page: u32) {
        self.write(user_id, |s| s.current_page = page.max(1));
    }

    // ─── Awaiting-input flag ────────────────────────────────────────────

    pub fn awaiting(&self, user_id: UserId) -> Option<AwaitingInput> {
        self.read(user_id, |s| s.and_then(|s| s.awaiting.clone()))
    }

    /// Arms an awaiting-input mode, replacing any previous one.
    pub fn set_awaiting(&self, user_id: UserId, awaiting: AwaitingInput) {
        self.write(user_id, |s| {
            if let Some(old) = s.awaiting.replace(awaiting) {
                log::debug!("Replaced stale awaiting-input flag {:?} for user {}", old, user_id);
            }
        });
    }

    pub fn clear_awaiting(&self, user_id: UserId) {
        self.write(user_id, |s| s.awaiting = None);
    }

    // ─── Photo viewer cursor ────────────────────────────────────────────

    pub fn photo_viewer(&self, user_id: UserId) -> Option<PhotoViewer> {
        self.read(user_id, |s| s.and_then(|s| s.photo_viewer.clone()))
    }

    pub fn set_photo_viewer(&self, user_id: UserId, viewer: PhotoViewer) {
        self.write(user_id, |s| s.photo_viewer = Some(viewer));
    }

    pub fn set_viewer_index(&self, user_id: UserId, index: usize) {
        self.write(user_id, |s| {
            if let Some(viewer) = s.photo_viewer.as_mut() {
                viewer.index = index;
            }
        });
    }

    pub fn set_viewer_page(&self, user_id: UserId, page: usize) {
        self.write(user_id, |s| {
            if let Some(viewer) = s.photo_viewer.as_mut() {
                viewer.page = page;
            }
        });
    }

    pub fn clear_photo_viewer(&self, user_id: UserId) {
        self.write(user_id, |s| s.photo_viewer = None);
    }

    /// Drops a user's whole session.
    pub fn clear(&self, user_id: UserId) {
        let mut guard = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Session store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_selection_is_idempotent() {
        let store = SessionStore::new();
        let before = store.selected_jobs(1);

        assert!(store.toggle_selection(1, 42));
        assert!(store.selected_jobs(1).contains(&42));

        assert!(!store.toggle_selection(1, 42));
        assert_eq!(store.selected_jobs(1), before);
    }

    #[test]
    fn test_selection_is_per_user() {
        let store = SessionStore::new();
        store.toggle_selection(1, 42);
        assert!(store.selected_jobs(2).is_empty());
    }

    #[test]
    fn test_page_defaults_to_one() {
        let store = SessionStore::new();
        assert_eq!(store.page(1), 1);
        store.set_page(1, 3);
        assert_eq!(store.page(1), 3);
        store.set_page(1, 0);
        assert_eq!(store.page(1), 1);
    }

    #[test]
    fn test_awaiting_replaces_previous_mode() {
        let store = SessionStore::new();
        store.set_awaiting(1, AwaitingInput::Note { job_id: 5 });
        store.set_awaiting(
            1,
            AwaitingInput::Photo {
                job_id: 9,
                bulk: true,
            },
        );

        // Only the newest mode is armed.
        assert_eq!(
            store.awaiting(1),
            Some(AwaitingInput::Photo {
                job_id: 9,
                bulk: true
            })
        );
    }

    #[test]
    fn test_clear_awaiting() {
        let store = SessionStore::new();
        store.set_awaiting(1, AwaitingInput::Note { job_id: 5 });
        store.clear_awaiting(1);
        assert!(store.awaiting(1).is_none());
    }

    #[test]
    fn test_photo_viewer_cursor_updates() {
        let store = SessionStore::new();
        store.set_photo_viewer(
            1,
            PhotoViewer {
                job_id: 3,
                refs: vec!["a.jpg".to_string(), "b.jpg".to_string()],
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                index: 0,
                page: 0,
            },
        );

        store.set_viewer_index(1, 1);
        store.set_viewer_page(1, 1);
        let viewer = store.photo_viewer(1).unwrap();
        assert_eq!(viewer.index, 1);
        assert_eq!(viewer.page, 1);

        store.clear_photo_viewer(1);
        assert!(store.photo_viewer(1).is_none());
    }

    #[test]
    fn test_clear_drops_everything() {
        let store = SessionStore::new();
        store.toggle_selection(1, 42);
        store.set_page(1, 2);
        store.set_awaiting(1, AwaitingInput::Note { job_id: 5 });

        store.clear(1);
        assert!(store.selected_jobs(1).is_empty());
        assert_eq!(store.page(1), 1);
        assert!(store.awaiting(1).is_none());
    }
}
