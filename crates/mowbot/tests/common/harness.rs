//! Test harness for isolated engine tests.
//!
//! `TestHarness` wires a full engine — in-memory database, temp photo
//! directory, session store, router with a known roster — and provides a
//! `FakeRenderer` that records everything a user would have seen.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use mowbot::config::schema::{Member, RosterConfig, SitesConfig};
use mowbot::db::Database;
use mowbot::photos::{PhotoLedger, PhotoStorage};
use mowbot::roster::Roster;
use mowbot::router::{RenderError, Router, Screen, ScreenRenderer};
use mowbot::session::SessionStore;
use mowbot::sites::SiteDirectory;
use mowbot::store::JobStore;

pub const DEV: i64 = 1;
pub const DIRECTOR: i64 = 2;
pub const ANDY: i64 = 7;
pub const ALEX: i64 = 8;
pub const STRANGER: i64 = 999;

/// Everything a renderer was asked to do, in order.
#[derive(Debug, Clone)]
pub enum Rendered {
    Edited(Screen),
    Sent(Screen),
    Photos(Vec<PathBuf>, Screen),
    Removed,
}

/// Records render calls; optionally refuses in-place edits to exercise
/// the resend fallback.
#[derive(Debug, Default)]
pub struct FakeRenderer {
    pub events: Vec<Rendered>,
    pub refuse_edits: bool,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_edits() -> Self {
        Self {
            events: Vec::new(),
            refuse_edits: true,
        }
    }

    /// The most recent screen content shown to the user.
    pub fn last_screen(&self) -> &Screen {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                Rendered::Edited(s) | Rendered::Sent(s) | Rendered::Photos(_, s) => Some(s),
                Rendered::Removed => None,
            })
            .expect("no screen was rendered")
    }

    /// All button tokens on the last screen, flattened.
    pub fn last_tokens(&self) -> Vec<String> {
        self.last_screen()
            .menu
            .iter()
            .flatten()
            .map(|b| b.token.clone())
            .collect()
    }
}

#[async_trait]
impl ScreenRenderer for FakeRenderer {
    async fn edit(&mut self, screen: &Screen) -> Result<(), RenderError> {
        if self.refuse_edits {
            return Err(RenderError::Conflict);
        }
        self.events.push(Rendered::Edited(screen.clone()));
        Ok(())
    }

    async fn send(&mut self, screen: &Screen) -> Result<(), RenderError> {
        self.events.push(Rendered::Sent(screen.clone()));
        Ok(())
    }

    async fn send_photos(
        &mut self,
        photos: &[PathBuf],
        screen: &Screen,
    ) -> Result<(), RenderError> {
        self.events
            .push(Rendered::Photos(photos.to_vec(), screen.clone()));
        Ok(())
    }

    async fn remove_previous(&mut self) -> Result<(), RenderError> {
        self.events.push(Rendered::Removed);
        Ok(())
    }
}

/// Isolated engine instance backed by an in-memory database and a temp
/// photo directory.
pub struct TestHarness {
    temp_dir: TempDir,
    pub store: JobStore,
    pub sessions: Arc<SessionStore>,
    pub router: Router,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_photo_quota(25)
    }

    pub fn with_photo_quota(quota: u32) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = JobStore::new(Database::open_in_memory().expect("open in-memory DB"));
        let sessions = Arc::new(SessionStore::new());

        let roster = Roster::from_config(&RosterConfig {
            devs: vec![DEV],
            directors: vec![Member {
                id: DIRECTOR,
                name: "Pat".to_string(),
            }],
            employees: vec![
                Member {
                    id: ANDY,
                    name: "Andy".to_string(),
                },
                Member {
                    id: ALEX,
                    name: "Alex".to_string(),
                },
            ],
        });

        let ledger = PhotoLedger::new(PhotoStorage::new(temp_dir.path().join("photos")), quota);
        let router = Router::new(
            store.clone(),
            sessions.clone(),
            ledger,
            roster,
            SiteDirectory::from_config(&SitesConfig::default()),
            None,
            10,
        );

        Self {
            temp_dir,
            store,
            sessions,
            router,
        }
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.temp_dir.path().join("photos")
    }

    /// A small but valid PNG payload.
    pub fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([20, 160, 40]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("encode test png");
        bytes
    }
}
