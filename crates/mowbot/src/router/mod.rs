//! Navigation router: decode, dispatch, render.
//!
//! Exactly one handler runs per interaction. Every handler returns a
//! typed result; this module is the single boundary that converts the
//! error taxonomy into user-facing screens, so nothing propagates to the
//! scheduler or to other users' sessions. Screens replace the previous
//! screen in place; when the transport refuses the edit, the content is
//! re-sent as a new screen instead of failing the interaction.

pub mod action;
pub mod screen;
pub mod templates;

pub use action::Action;
pub use screen::{Button, Menu, RenderError, Screen, ScreenRenderer};

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use thiserror::Error;

use crate::assignment::{AssignmentError, AssignmentPage, AssignmentWorkflow};
use crate::lifecycle::{JobAction, JobLifecycle, LifecycleError};
use crate::photos::{self, PhotoError, PhotoLedger};
use crate::roster::{Role, Roster};
use crate::session::{AwaitingInput, PhotoViewer, SessionStore};
use crate::sites::SiteDirectory;
use crate::store::{Job, JobId, JobStore, StoreError, UserId};
use crate::weather::WeatherProvider;

/// Photos per grid message.
const PHOTOS_PER_GRID_PAGE: usize = 10;
/// Completed jobs shown per employee on the review screen.
const COMPLETED_JOBS_LIMIT: u32 = 20;
/// Recent notes rendered on a job card.
const RECENT_NOTES_SHOWN: u32 = 5;

/// Everything a handler can fail with. Converted to a screen at the
/// dispatch boundary, never propagated past it.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What a handler produced: a screen for the router to render, or
/// confirmation that it already drove the renderer itself (photo grids).
enum Outcome {
    Screen(Screen),
    Rendered,
}

/// The interactive engine: owns the dispatch table and all handlers.
pub struct Router {
    store: JobStore,
    sessions: Arc<SessionStore>,
    assignment: AssignmentWorkflow,
    lifecycle: JobLifecycle,
    ledger: PhotoLedger,
    roster: Roster,
    sites: SiteDirectory,
    weather: Option<Arc<dyn WeatherProvider>>,
}

impl Router {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: JobStore,
        sessions: Arc<SessionStore>,
        ledger: PhotoLedger,
        roster: Roster,
        sites: SiteDirectory,
        weather: Option<Arc<dyn WeatherProvider>>,
        page_size: u32,
    ) -> Self {
        let photo_quota = ledger.daily_quota();
        Self {
            assignment: AssignmentWorkflow::new(store.clone(), sessions.clone(), page_size),
            lifecycle: JobLifecycle::new(store.clone(), sessions.clone(), photo_quota),
            store,
            sessions,
            ledger,
            roster,
            sites,
            weather,
        }
    }

    /// Entry point for one interaction token. Never faults: unknown
    /// tokens and handler errors all end in a rendered screen.
    pub async fn dispatch(&self, user_id: UserId, token: &str, renderer: &mut dyn ScreenRenderer) {
        let action = match Action::parse(token) {
            Some(action) => action,
            None => {
                log::warn!("Unsupported interaction token '{}' from user {}", token, user_id);
                self.render(renderer, unsupported_screen()).await;
                return;
            }
        };

        if self.roster.role(user_id) == Role::Unauthorized {
            self.render(renderer, access_denied_screen()).await;
            return;
        }

        match self.route(user_id, &action, renderer).await {
            Ok(Outcome::Screen(screen)) => self.render(renderer, screen).await,
            Ok(Outcome::Rendered) => {}
            Err(e) => {
                log::error!(
                    "Handler failed for token '{}' (user {}): {}",
                    token,
                    user_id,
                    e
                );
                self.render(renderer, error_screen(&e)).await;
            }
        }
    }

    /// Inbound photo content (not a token): routed by the awaiting-input
    /// flag. Confirmations and rejections arrive as new messages under
    /// the photo the user just sent.
    pub async fn handle_photo_message(
        &self,
        user_id: UserId,
        bytes: &[u8],
        renderer: &mut dyn ScreenRenderer,
    ) {
        let Some(AwaitingInput::Photo { job_id, bulk }) = self.sessions.awaiting(user_id) else {
            self.send(renderer, Screen::new("No photo expected at this time."))
                .await;
            return;
        };

        match self.ledger.ingest(&self.store, job_id, bytes, today()) {
            Ok(_) if bulk => {}
            Ok(_) => {
                let job = self.store.get(job_id).ok();
                let count = job
                    .map(|j| photos::count_for_date(&j.photos, today()))
                    .unwrap_or(0);
                let screen = Screen::with_menu(
                    templates::success(
                        "Photo uploaded",
                        &format!(
                            "Photo uploaded for job {}. ({}/{} photos today)",
                            job_id,
                            count,
                            self.ledger.daily_quota()
                        ),
                    ),
                    vec![
                        vec![Button::new(
                            "🖼 View today's photos",
                            Action::ViewPhotos(job_id).token(),
                        )],
                        vec![Button::new(
                            "📸 Add more photos",
                            Action::UploadPhoto(job_id).token(),
                        )],
                    ],
                );
                self.send(renderer, screen).await;
            }
            Err(e) => {
                log::warn!("Photo upload rejected for job {}: {}", job_id, e);
                self.send(renderer, error_screen(&e.into())).await;
            }
        }
    }

    /// Inbound free text: only meaningful while a note is awaited.
    /// Anything else is dropped quietly.
    pub async fn handle_text_message(
        &self,
        user_id: UserId,
        text: &str,
        renderer: &mut dyn ScreenRenderer,
    ) {
        let Some(AwaitingInput::Note { job_id }) = self.sessions.awaiting(user_id) else {
            log::debug!("Ignoring unexpected text from user {}", user_id);
            return;
        };

        let role = self.roster.role(user_id);
        let result = self
            .lifecycle
            .add_note(job_id, user_id, role, text, Utc::now());
        self.sessions.clear_awaiting(user_id);

        match result {
            Ok(()) => {
                let screen = Screen::with_menu(
                    templates::success("Note saved", &format!("Note added to job {}.", job_id)),
                    vec![vec![Button::new(
                        "← Back to job",
                        Action::ViewJob(job_id).token(),
                    )]],
                );
                self.send(renderer, screen).await;
            }
            Err(e) => {
                log::error!("Failed to save note for job {}: {}", job_id, e);
                self.send(renderer, error_screen(&e.into())).await;
            }
        }
    }

    /// Role-aware help text, reachable from the `help` command as well
    /// as the `help` token.
    pub fn help_screen(&self, user_id: UserId) -> Screen {
        let role_text = match self.roster.role(user_id) {
            Role::Dev => {
                "Developer\n\
                 • Open both dashboards from the dev home screen\n\
                 • Exercise director and employee flows end to end"
            }
            Role::Director => {
                "Director\n\
                 • Assign Jobs: select unassigned sites and assign them in bulk\n\
                 • View Completed Jobs: review each employee's finished work\n\
                 • Job cards include photos, notes and weather"
            }
            Role::Employee => {
                "Employee\n\
                 • View your assigned jobs\n\
                 • Start and finish jobs\n\
                 • Add notes and upload photos while a job is in progress\n\
                 • Check the weather for outdoor sites"
            }
            Role::Unauthorized => "You do not have a registered role. Contact your administrator.",
        };
        Screen::with_menu(
            format!("🤖 Mowbot help\n\n{}", role_text),
            vec![vec![Button::new("🏠 Home", Action::Home.token())]],
        )
    }

    async fn route(
        &self,
        user_id: UserId,
        action: &Action,
        renderer: &mut dyn ScreenRenderer,
    ) -> Result<Outcome, HandlerError> {
        let role = self.roster.role(user_id);

        // Director-only actions.
        let director = matches!(role, Role::Director | Role::Dev);
        // Employee-side actions; devs may drive both dashboards.
        let employee = matches!(role, Role::Employee | Role::Dev);

        let screen = match action {
            Action::Noop => return Ok(Outcome::Rendered),
            Action::Home => self.home_screen(user_id),
            Action::Help => self.help_screen(user_id),
            Action::DevHome if role == Role::Dev => dev_home_screen(),
            Action::DirectorHome if director => self.director_home_screen(user_id)?,
            Action::EmployeeHome if employee => self.employee_home_screen(user_id),
            Action::MyJobs if employee => self.my_jobs_screen(user_id)?,

            Action::AssignmentList if director => {
                assignment_screen(&self.assignment.enter(user_id)?)
            }
            Action::ToggleSelection(job_id) if director => {
                assignment_screen(&self.assignment.toggle(user_id, *job_id)?)
            }
            Action::Page(page) if director => {
                assignment_screen(&self.assignment.goto_page(user_id, *page)?)
            }
            Action::EmployeeChoiceList if director => {
                self.assignment.require_selection(user_id)?;
                self.employee_choice_screen()
            }
            Action::AssignToEmployee(employee_id) if director => {
                let assigned = self.assignment.assign_selected(user_id, *employee_id)?;
                let name = self
                    .roster
                    .employee_name(*employee_id)
                    .unwrap_or("employee");
                Screen::with_menu(
                    templates::success(
                        "Jobs assigned",
                        &format!("{} job(s) assigned to {}.", assigned, name),
                    ),
                    vec![vec![Button::new(
                        "← Back to dashboard",
                        Action::DirectorHome.token(),
                    )]],
                )
            }
            Action::CompletedChoiceList if director => self.completed_choice_screen(),
            Action::CompletedJobs(employee_id) if director => {
                self.completed_jobs_screen(*employee_id)?
            }

            Action::ViewJob(job_id) => {
                let job = self.store.get(*job_id)?;
                self.job_screen(role, &job).await?
            }
            Action::StartJob(job_id) if employee => {
                let job = self.lifecycle.start(*job_id, Utc::now())?;
                job_update_screen("Job started", &job)
            }
            Action::FinishJob(job_id) if employee => {
                let job = self.lifecycle.finish(*job_id, Utc::now())?;
                job_update_screen("Job completed", &job)
            }
            Action::UploadPhoto(job_id) if employee => {
                let count = self
                    .lifecycle
                    .begin_photo_upload(user_id, *job_id, today())?;
                Screen::with_menu(
                    format!(
                        "📸 Bulk photo upload\n\nSend photos one after another ({}/{} used today).\nPress 'Done uploading' when finished.",
                        count,
                        self.ledger.daily_quota()
                    ),
                    vec![
                        vec![Button::new(
                            "✅ Done uploading",
                            Action::FinishUpload(*job_id).token(),
                        )],
                        vec![Button::new("✖ Cancel", Action::ViewJob(*job_id).token())],
                    ],
                )
            }
            Action::FinishUpload(job_id) if employee => {
                let count = self.lifecycle.end_photo_upload(user_id, *job_id, today())?;
                log::info!(
                    "Bulk upload finished for job {}: {} photo(s) today",
                    job_id,
                    count
                );
                let job = self.store.get(*job_id)?;
                self.job_screen(role, &job).await?
            }
            Action::EditNote(job_id) => {
                let job = self.lifecycle.begin_note(user_id, *job_id)?;
                Screen::with_menu(
                    format!("📝 Send the note for {} (job {}):", job.site_name, job.id),
                    vec![vec![Button::new(
                        "✖ Cancel",
                        Action::CancelNote(*job_id).token(),
                    )]],
                )
            }
            Action::CancelNote(job_id) => {
                self.lifecycle.cancel_note(user_id);
                let job = self.store.get(*job_id)?;
                self.job_screen(role, &job).await?
            }

            Action::ViewPhotos(job_id) => {
                return self.enter_photo_viewer(user_id, *job_id, renderer).await;
            }
            Action::PhotoGridNavigation(page) => {
                return self.photo_grid_page(user_id, *page, renderer).await;
            }
            Action::PhotoNavigation(index) => {
                return self.photo_single(user_id, *index, renderer).await;
            }

            Action::SiteInfo(job_id) => self.site_info_screen(*job_id)?,
            Action::MapLink(job_id) => self.map_link_screen(*job_id)?,
            Action::RefreshWeather(job_id) => {
                let job = self.store.get(*job_id)?;
                if let Some(weather) = &self.weather {
                    weather.invalidate(&weather_location(&job));
                }
                self.job_screen(role, &job).await?
            }

            // Role mismatch for a known token: same screen as an
            // unknown token, the action just isn't offered to this user.
            _ => unsupported_screen(),
        };
        Ok(Outcome::Screen(screen))
    }

    // ─── Home screens ───────────────────────────────────────────────────

    fn home_screen(&self, user_id: UserId) -> Screen {
        match self.roster.role(user_id) {
            Role::Dev => dev_home_screen(),
            Role::Director => self
                .director_home_screen(user_id)
                .unwrap_or_else(|_| store_trouble_screen()),
            Role::Employee => self.employee_home_screen(user_id),
            Role::Unauthorized => access_denied_screen(),
        }
    }

    fn director_home_screen(&self, user_id: UserId) -> Result<Screen, HandlerError> {
        // A fresh dashboard means any half-finished input flow is dead.
        self.sessions.clear_awaiting(user_id);

        let stats = self.store.stats()?;
        let name = self.roster.display_name(user_id).unwrap_or("Director");
        let text = format!(
            "{}\n\n📊 Today's overview:\n• Total jobs: {}\n• Active: {}\n• Completed: {}",
            templates::dashboard_header(name, "Director"),
            stats.total,
            stats.active,
            stats.completed
        );
        Ok(Screen::with_menu(
            text,
            vec![
                vec![Button::new("Assign jobs", Action::AssignmentList.token())],
                vec![Button::new(
                    "View completed jobs",
                    Action::CompletedChoiceList.token(),
                )],
            ],
        ))
    }

    fn employee_home_screen(&self, user_id: UserId) -> Screen {
        self.sessions.clear_awaiting(user_id);

        let name = self.roster.display_name(user_id).unwrap_or("Employee");
        let back = if self.roster.role(user_id) == Role::Dev {
            Action::DevHome
        } else {
            Action::Home
        };
        Screen::with_menu(
            templates::dashboard_header(name, "Employee"),
            vec![
                vec![Button::new("📋 View my jobs", Action::MyJobs.token())],
                vec![Button::new("← Back", back.token())],
            ],
        )
    }

    fn my_jobs_screen(&self, user_id: UserId) -> Result<Screen, HandlerError> {
        let jobs = self.store.list_active_for(user_id)?;
        if jobs.is_empty() {
            return Ok(Screen::with_menu(
                templates::success("No jobs", "You have no assigned jobs today."),
                vec![vec![Button::new("← Back", Action::EmployeeHome.token())]],
            ));
        }

        let mut menu: Menu = jobs
            .iter()
            .map(|job| {
                let duration = job
                    .duration()
                    .map(|d| format!(" ({})", templates::format_duration(d)))
                    .unwrap_or_default();
                vec![Button::new(
                    format!(
                        "{} {} ({}) [{}]{}",
                        templates::status_emoji(job.status),
                        job.site_name,
                        job.area.as_deref().unwrap_or("No area"),
                        templates::status_label(job.status),
                        duration
                    ),
                    Action::ViewJob(job.id).token(),
                )]
            })
            .collect();
        menu.push(vec![Button::new("← Back", Action::EmployeeHome.token())]);

        Ok(Screen::with_menu(
            templates::job_list_header("Your jobs (today)", jobs.len()),
            menu,
        ))
    }

    fn employee_choice_screen(&self) -> Screen {
        let mut menu: Menu = self
            .roster
            .employees()
            .map(|(id, name)| {
                vec![Button::new(
                    format!("Assign to {}", name),
                    Action::AssignToEmployee(id).token(),
                )]
            })
            .collect();
        menu.push(vec![Button::new("← Back", Action::DirectorHome.token())]);
        Screen::with_menu(
            templates::success("Select employee", "Choose who takes the selected jobs."),
            menu,
        )
    }

    fn completed_choice_screen(&self) -> Screen {
        let mut menu: Menu = self
            .roster
            .employees()
            .map(|(id, name)| {
                vec![Button::new(
                    name.to_string(),
                    Action::CompletedJobs(id).token(),
                )]
            })
            .collect();
        menu.push(vec![Button::new("← Back", Action::DirectorHome.token())]);
        Screen::with_menu("Select an employee to view completed jobs:", menu)
    }

    fn completed_jobs_screen(&self, employee_id: UserId) -> Result<Screen, HandlerError> {
        let name = self
            .roster
            .employee_name(employee_id)
            .unwrap_or("Employee")
            .to_string();
        let jobs = self.store.list_completed_for(employee_id, COMPLETED_JOBS_LIMIT)?;
        if jobs.is_empty() {
            return Ok(Screen::with_menu(
                templates::success(
                    "No completed jobs",
                    &format!("No completed jobs found for {}.", name),
                ),
                vec![vec![Button::new(
                    "← Back",
                    Action::CompletedChoiceList.token(),
                )]],
            ));
        }

        let mut sections = vec![templates::job_list_header(
            &format!("{}'s completed jobs", name),
            jobs.len(),
        )];
        let mut menu: Menu = Vec::new();
        for job in &jobs {
            let photo_count =
                photos::count_for_date(&job.photos, photos::effective_date(job));
            let notes = self.store.recent_notes(job.id, RECENT_NOTES_SHOWN)?;
            sections.push(templates::job_card(job, &notes, photo_count));

            let label = if photo_count > 0 {
                format!("{} ({} 📸)", job.site_name, photo_count)
            } else {
                job.site_name.clone()
            };
            menu.push(vec![Button::new(label, Action::ViewJob(job.id).token())]);
        }
        menu.push(vec![Button::new(
            "← Back",
            Action::CompletedChoiceList.token(),
        )]);

        Ok(Screen::with_menu(sections.join("\n\n"), menu))
    }

    // ─── Job detail ─────────────────────────────────────────────────────

    async fn job_screen(&self, role: Role, job: &Job) -> Result<Screen, HandlerError> {
        let effective = photos::effective_date(job);
        let photo_count = photos::count_for_date(&job.photos, effective);
        let notes = self.store.recent_notes(job.id, RECENT_NOTES_SHOWN)?;

        let mut sections = vec![templates::job_card(job, &notes, photo_count)];

        let outdoor = job
            .area
            .as_deref()
            .map(crate::weather::is_outdoor_area)
            .unwrap_or(false);
        if outdoor {
            if let Some(weather) = &self.weather {
                match weather.forecast(&weather_location(job)).await {
                    Ok(forecast) => sections.push(format!(
                        "🌤 {}: {}, {:.0}°C, wind {:.0} m/s",
                        job.site_name,
                        forecast.summary,
                        forecast.temperature_c,
                        forecast.wind_mps
                    )),
                    Err(e) => log::warn!("Weather lookup failed for job {}: {}", job.id, e),
                }
            }
        }

        let (contact, gate_code) =
            self.sites
                .apply(&job.site_name, job.contact.clone(), job.gate_code.clone());
        if contact.is_some() || gate_code.is_some() {
            sections.push(templates::site_info(
                &job.site_name,
                contact.as_deref(),
                gate_code.as_deref(),
                job.address.as_deref(),
            ));
        }

        let mut menu: Menu = Vec::new();
        for action in self
            .lifecycle
            .available_actions(job, self.weather.is_some())
        {
            let button = match action {
                JobAction::Start => Button::new("▶ Start job", Action::StartJob(job.id).token()),
                JobAction::Finish => Button::new("✅ Finish job", Action::FinishJob(job.id).token()),
                JobAction::AddNote => Button::new("📝 Add note", Action::EditNote(job.id).token()),
                JobAction::UploadPhoto => {
                    Button::new("📸 Upload photo", Action::UploadPhoto(job.id).token())
                }
                JobAction::ViewPhotos(count) => Button::new(
                    format!("🖼 View photos ({})", count),
                    Action::ViewPhotos(job.id).token(),
                ),
                JobAction::SiteInfo => Button::new("ℹ️ Site info", Action::SiteInfo(job.id).token()),
                JobAction::MapLink => Button::new("🗺 Map link", Action::MapLink(job.id).token()),
                JobAction::Weather => Button::new(
                    "🌤 Refresh weather",
                    Action::RefreshWeather(job.id).token(),
                ),
            };
            menu.push(vec![button]);
        }

        let back = match role {
            Role::Director => Action::CompletedChoiceList,
            _ => Action::MyJobs,
        };
        menu.push(vec![Button::new("← Back", back.token())]);

        Ok(Screen::with_menu(sections.join("\n\n"), menu))
    }

    fn site_info_screen(&self, job_id: JobId) -> Result<Screen, HandlerError> {
        let job = self.store.get(job_id)?;
        let (contact, gate_code) =
            self.sites
                .apply(&job.site_name, job.contact.clone(), job.gate_code.clone());
        Ok(Screen::with_menu(
            templates::site_info(
                &job.site_name,
                contact.as_deref(),
                gate_code.as_deref(),
                job.address.as_deref(),
            ),
            vec![vec![Button::new("← Back", Action::ViewJob(job_id).token())]],
        ))
    }

    fn map_link_screen(&self, job_id: JobId) -> Result<Screen, HandlerError> {
        let job = self.store.get(job_id)?;
        let screen = match &job.map_link {
            Some(link) => Screen::with_menu(
                format!("🗺 Map link for {}:\n{}", job.site_name, link),
                vec![vec![Button::new("← Back", Action::ViewJob(job_id).token())]],
            ),
            None => Screen::with_menu(
                templates::error("No map link", "No map link available for this job."),
                vec![vec![Button::new("← Back", Action::ViewJob(job_id).token())]],
            ),
        };
        Ok(screen)
    }

    // ─── Photo viewing ──────────────────────────────────────────────────

    async fn enter_photo_viewer(
        &self,
        user_id: UserId,
        job_id: JobId,
        renderer: &mut dyn ScreenRenderer,
    ) -> Result<Outcome, HandlerError> {
        let job = self.store.get(job_id)?;
        let date = photos::effective_date(&job);
        let refs = photos::photos_for_date(&job.photos, date);
        if refs.is_empty() {
            return Ok(Outcome::Screen(Screen::with_menu(
                templates::error(
                    "No photos",
                    &format!("No photos available for this job on {}.", date_label(date)),
                ),
                vec![vec![Button::new("← Back", Action::ViewJob(job_id).token())]],
            )));
        }

        self.sessions.set_photo_viewer(
            user_id,
            PhotoViewer {
                job_id,
                refs,
                date,
                index: 0,
                page: 0,
            },
        );
        self.render_photo_grid(user_id, renderer).await
    }

    async fn photo_grid_page(
        &self,
        user_id: UserId,
        page: usize,
        renderer: &mut dyn ScreenRenderer,
    ) -> Result<Outcome, HandlerError> {
        let Some(viewer) = self.sessions.photo_viewer(user_id) else {
            return Ok(Outcome::Screen(expired_viewer_screen()));
        };
        let pages = grid_page_count(viewer.refs.len());
        if page >= pages {
            return Ok(Outcome::Screen(expired_viewer_screen()));
        }
        self.sessions.set_viewer_page(user_id, page);
        self.render_photo_grid(user_id, renderer).await
    }

    async fn photo_single(
        &self,
        user_id: UserId,
        index: usize,
        renderer: &mut dyn ScreenRenderer,
    ) -> Result<Outcome, HandlerError> {
        let Some(viewer) = self.sessions.photo_viewer(user_id) else {
            return Ok(Outcome::Screen(expired_viewer_screen()));
        };
        if index >= viewer.refs.len() {
            return Ok(Outcome::Screen(expired_viewer_screen()));
        }
        self.sessions.set_viewer_index(user_id, index);

        let job = self.store.get(viewer.job_id)?;
        let total = viewer.refs.len();
        let path = self.ledger.path_for(&viewer.refs[index]);

        let mut nav = Vec::new();
        if index > 0 {
            nav.push(Button::new(
                "⬅ Previous",
                Action::PhotoNavigation(index - 1).token(),
            ));
        }
        nav.push(Button::new(
            format!("{}/{}", index + 1, total),
            Action::Noop.token(),
        ));
        if index + 1 < total {
            nav.push(Button::new(
                "Next ➡",
                Action::PhotoNavigation(index + 1).token(),
            ));
        }

        let screen = Screen::with_menu(
            format!(
                "📸 {} ({}) — photo {}/{}",
                job.site_name,
                date_label(viewer.date),
                index + 1,
                total
            ),
            vec![
                nav,
                vec![Button::new(
                    "← Back to job",
                    Action::ViewJob(viewer.job_id).token(),
                )],
            ],
        );

        renderer.send_photos(&[path], &screen).await?;
        if let Err(e) = renderer.remove_previous().await {
            log::warn!("Could not remove previous screen: {}", e);
        }
        Ok(Outcome::Rendered)
    }

    async fn render_photo_grid(
        &self,
        user_id: UserId,
        renderer: &mut dyn ScreenRenderer,
    ) -> Result<Outcome, HandlerError> {
        let Some(viewer) = self.sessions.photo_viewer(user_id) else {
            return Ok(Outcome::Screen(expired_viewer_screen()));
        };

        let total = viewer.refs.len();
        let pages = grid_page_count(total);
        let start = viewer.page * PHOTOS_PER_GRID_PAGE;
        let end = (start + PHOTOS_PER_GRID_PAGE).min(total);
        let paths: Vec<_> = viewer.refs[start..end]
            .iter()
            .map(|r| self.ledger.path_for(r))
            .collect();

        let mut nav = Vec::new();
        if viewer.page > 0 {
            nav.push(Button::new(
                "⬅ Previous",
                Action::PhotoGridNavigation(viewer.page - 1).token(),
            ));
        }
        nav.push(Button::new(
            format!("Page {}/{}", viewer.page + 1, pages),
            Action::Noop.token(),
        ));
        if viewer.page + 1 < pages {
            nav.push(Button::new(
                "Next ➡",
                Action::PhotoGridNavigation(viewer.page + 1).token(),
            ));
        }

        let screen = Screen::with_menu(
            format!(
                "📸 Photos from {} ({}-{} of {})",
                date_label(viewer.date),
                start + 1,
                end,
                total
            ),
            vec![
                nav,
                vec![Button::new(
                    "🔍 Browse one by one",
                    Action::PhotoNavigation(0).token(),
                )],
                vec![Button::new(
                    "← Back to job",
                    Action::ViewJob(viewer.job_id).token(),
                )],
            ],
        );

        // Rich content needs a fresh message; removing the old screen
        // right after keeps a single screen visible.
        renderer.send_photos(&paths, &screen).await?;
        if let Err(e) = renderer.remove_previous().await {
            log::warn!("Could not remove previous screen: {}", e);
        }
        Ok(Outcome::Rendered)
    }

    // ─── Rendering ──────────────────────────────────────────────────────

    /// Replaces the current screen; falls back to a new message when the
    /// transport refuses the in-place edit.
    async fn render(&self, renderer: &mut dyn ScreenRenderer, screen: Screen) {
        match renderer.edit(&screen).await {
            Ok(()) => {}
            Err(RenderError::Conflict) => {
                log::debug!("In-place edit refused, resending as new screen");
                if let Err(e) = renderer.send(&screen).await {
                    log::error!("Failed to resend screen: {}", e);
                }
            }
            Err(e) => log::error!("Failed to render screen: {}", e),
        }
    }

    /// Always a new message (used under inbound photo/text messages).
    async fn send(&self, renderer: &mut dyn ScreenRenderer, screen: Screen) {
        if let Err(e) = renderer.send(&screen).await {
            log::error!("Failed to send screen: {}", e);
        }
    }
}

// ─── Free screen builders ──────────────────────────────────────────────

fn dev_home_screen() -> Screen {
    Screen::with_menu(
        templates::dashboard_header("Dev", "Developer"),
        vec![
            vec![Button::new(
                "Director dashboard",
                Action::DirectorHome.token(),
            )],
            vec![Button::new(
                "Employee dashboard",
                Action::EmployeeHome.token(),
            )],
        ],
    )
}

/// Renders one page of the assignment list.
fn assignment_screen(page: &AssignmentPage) -> Screen {
    if page.jobs.is_empty() && page.page == 1 {
        return Screen::with_menu(
            templates::success("No jobs available", "There are no unassigned jobs."),
            vec![vec![Button::new("← Back", Action::DirectorHome.token())]],
        );
    }

    let text = format!(
        "{}\n\nSelect jobs to assign by tapping the buttons below:",
        templates::job_list_header("Available jobs", page.jobs.len())
    );

    let mut menu: Menu = page
        .jobs
        .iter()
        .map(|job| {
            let mark = if page.selected.contains(&job.id) {
                "✅"
            } else {
                "⬜"
            };
            vec![Button::new(
                format!(
                    "{} {} ({})",
                    mark,
                    job.site_name,
                    job.area.as_deref().unwrap_or("No area")
                ),
                Action::ToggleSelection(job.id).token(),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page.page > 1 {
        nav.push(Button::new(
            "⬅ Previous",
            Action::Page(page.page - 1).token(),
        ));
    }
    nav.push(Button::new("← Back", Action::DirectorHome.token()));
    if page.has_next {
        nav.push(Button::new("Next ➡", Action::Page(page.page + 1).token()));
    }
    menu.push(nav);

    if !page.selected.is_empty() {
        menu.push(vec![Button::new(
            "✅ Assign selected",
            Action::EmployeeChoiceList.token(),
        )]);
    }

    Screen::with_menu(text, menu)
}

fn job_update_screen(title: &str, job: &Job) -> Screen {
    Screen::with_menu(
        templates::success(title, &format!("{} (job {}).", job.site_name, job.id)),
        vec![
            vec![Button::new("← Back to job", Action::ViewJob(job.id).token())],
            vec![Button::new("📋 My jobs", Action::MyJobs.token())],
        ],
    )
}

fn unsupported_screen() -> Screen {
    Screen::with_menu(
        templates::error("Unsupported action", "This action is not supported."),
        vec![vec![Button::new("🏠 Home", Action::Home.token())]],
    )
}

fn access_denied_screen() -> Screen {
    Screen::new(templates::error(
        "Access denied",
        "You do not have a registered role.",
    ))
}

fn store_trouble_screen() -> Screen {
    Screen::with_menu(
        templates::error("Something went wrong", "Please try again."),
        vec![vec![Button::new("🏠 Home", Action::Home.token())]],
    )
}

fn expired_viewer_screen() -> Screen {
    Screen::with_menu(
        templates::error(
            "Photo browsing expired",
            "Open the job again to view its photos.",
        ),
        vec![vec![Button::new("🏠 Home", Action::Home.token())]],
    )
}

/// Converts any taxonomy member into its user-facing screen. The single
/// adapter the dispatch boundary relies on.
fn error_screen(error: &HandlerError) -> Screen {
    let (title, body) = match error {
        HandlerError::Store(StoreError::NotFound(_))
        | HandlerError::Lifecycle(LifecycleError::NotFound(_)) => (
            "Job not found".to_string(),
            "The requested job was not found.".to_string(),
        ),
        HandlerError::Lifecycle(LifecycleError::AlreadyInProgress(_)) => (
            "Already started".to_string(),
            "This job is already in progress.".to_string(),
        ),
        HandlerError::Lifecycle(LifecycleError::AlreadyCompleted(_)) => (
            "Already completed".to_string(),
            "This job is already completed.".to_string(),
        ),
        HandlerError::Lifecycle(LifecycleError::NotStarted(_)) => (
            "Not started".to_string(),
            "This job has not been started yet.".to_string(),
        ),
        HandlerError::Assignment(AssignmentError::EmptySelection) => (
            "No jobs selected".to_string(),
            "Please select jobs before assigning.".to_string(),
        ),
        HandlerError::Photo(PhotoError::QuotaExceeded { count, quota, .. })
        | HandlerError::Lifecycle(LifecycleError::Photo(PhotoError::QuotaExceeded {
            count,
            quota,
            ..
        })) => (
            "Photo limit reached".to_string(),
            format!(
                "Maximum number of photos reached for this job today ({}/{}).",
                count, quota
            ),
        ),
        HandlerError::Photo(PhotoError::InvalidImage(_))
        | HandlerError::Lifecycle(LifecycleError::Photo(PhotoError::InvalidImage(_))) => (
            "Photo rejected".to_string(),
            "That upload is not a valid photo; it was discarded.".to_string(),
        ),
        // Store/render trouble: generic retry screen, details are in
        // the logs.
        _ => (
            "Something went wrong".to_string(),
            "Please try again.".to_string(),
        ),
    };
    Screen::with_menu(
        templates::error(&title, &body),
        vec![vec![Button::new("🏠 Home", Action::Home.token())]],
    )
}

fn weather_location(job: &Job) -> String {
    job.address
        .clone()
        .unwrap_or_else(|| format!("{},UK", job.site_name))
}

fn grid_page_count(total: usize) -> usize {
    total.div_ceil(PHOTOS_PER_GRID_PAGE).max(1)
}

fn date_label(date: NaiveDate) -> String {
    if date == Local::now().date_naive() {
        "today".to_string()
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
