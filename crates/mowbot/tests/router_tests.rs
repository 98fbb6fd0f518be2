//! Dispatch boundary behavior: token decoding, role routing, render
//! fallback, and the daily reset's effect on live screens.

mod common;

use chrono::Local;
use common::builders::JobBuilder;
use common::harness::{FakeRenderer, Rendered, TestHarness, ALEX, ANDY, DEV, DIRECTOR, STRANGER};
use mowbot::store::JobStatus;

#[tokio::test]
async fn unknown_token_renders_unsupported_screen() {
    let h = TestHarness::new();
    let mut renderer = FakeRenderer::new();

    h.router.dispatch(ANDY, "frobnicate_7", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Unsupported action"));

    h.router.dispatch(ANDY, "", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Unsupported action"));
}

#[tokio::test]
async fn unauthorized_user_is_denied() {
    let h = TestHarness::new();
    let mut renderer = FakeRenderer::new();

    h.router.dispatch(STRANGER, "home", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Access denied"));

    h.router.dispatch(STRANGER, "my-jobs", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Access denied"));
}

#[tokio::test]
async fn home_routes_by_role() {
    let h = TestHarness::new();

    let mut renderer = FakeRenderer::new();
    h.router.dispatch(DIRECTOR, "home", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Director Dashboard"));
    assert!(renderer
        .last_tokens()
        .contains(&"assignment-list".to_string()));

    let mut renderer = FakeRenderer::new();
    h.router.dispatch(ANDY, "home", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Andy"));
    assert!(renderer.last_tokens().contains(&"my-jobs".to_string()));

    let mut renderer = FakeRenderer::new();
    h.router.dispatch(DEV, "home", &mut renderer).await;
    let tokens = renderer.last_tokens();
    assert!(tokens.contains(&"director-home".to_string()));
    assert!(tokens.contains(&"employee-home".to_string()));
}

#[tokio::test]
async fn dev_can_drive_both_dashboards() {
    let h = TestHarness::new();
    JobBuilder::new("Trinity lodge").insert(&h.store);

    let mut renderer = FakeRenderer::new();
    h.router.dispatch(DEV, "assignment-list", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Available jobs"));

    h.router.dispatch(DEV, "my-jobs", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("No jobs"));
}

#[tokio::test]
async fn director_home_shows_overview_counters() {
    let h = TestHarness::new();
    let a = JobBuilder::new("Site A").assigned_to(ANDY).insert(&h.store);
    JobBuilder::new("Site B").insert(&h.store);

    let mut renderer = FakeRenderer::new();
    h.router
        .dispatch(ANDY, &format!("start-job_{}", a), &mut renderer)
        .await;

    h.router.dispatch(DIRECTOR, "director-home", &mut renderer).await;
    let text = &renderer.last_screen().text;
    assert!(text.contains("Total jobs: 2"));
    assert!(text.contains("Active: 1"));
    assert!(text.contains("Completed: 0"));
}

#[tokio::test]
async fn render_conflict_falls_back_to_new_message() {
    let h = TestHarness::new();

    let mut renderer = FakeRenderer::refusing_edits();
    h.router.dispatch(ANDY, "employee-home", &mut renderer).await;

    // The screen still reached the user, as a send instead of an edit.
    assert!(matches!(renderer.events.last(), Some(Rendered::Sent(_))));
    assert!(renderer.last_screen().text.contains("Employee Dashboard"));
}

#[tokio::test]
async fn help_is_role_specific() {
    let h = TestHarness::new();
    let mut renderer = FakeRenderer::new();

    h.router.dispatch(DIRECTOR, "help", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Assign Jobs"));

    h.router.dispatch(ANDY, "help", &mut renderer).await;
    assert!(renderer.last_screen().text.contains("Start and finish jobs"));
}

#[tokio::test]
async fn opening_a_dashboard_clears_stale_input_flags() {
    let h = TestHarness::new();
    let id = JobBuilder::new("Wessex water")
        .assigned_to(ANDY)
        .insert(&h.store);

    let mut renderer = FakeRenderer::new();
    h.router
        .dispatch(ANDY, &format!("edit-note_{}", id), &mut renderer)
        .await;
    assert!(h.sessions.awaiting(ANDY).is_some());

    // Navigating to the dashboard abandons the note flow.
    h.router.dispatch(ANDY, "employee-home", &mut renderer).await;
    assert!(h.sessions.awaiting(ANDY).is_none());

    // A later text message is not swallowed into a note.
    h.router
        .handle_text_message(ANDY, "hello?", &mut renderer)
        .await;
    assert!(h.store.recent_notes(id, 5).unwrap().is_empty());
}

#[tokio::test]
async fn sessions_are_independent_between_users() {
    let h = TestHarness::new();
    let a = JobBuilder::new("Site A").insert(&h.store);
    JobBuilder::new("Site B").insert(&h.store);

    let mut renderer = FakeRenderer::new();
    h.router.dispatch(DIRECTOR, "assignment-list", &mut renderer).await;
    h.router
        .dispatch(DIRECTOR, &format!("toggle-selection_{}", a), &mut renderer)
        .await;

    // Another employee's photo-upload state does not disturb the
    // director's selection, and vice versa.
    let id = JobBuilder::new("Site C").assigned_to(ALEX).insert(&h.store);
    h.router
        .dispatch(ALEX, &format!("start-job_{}", id), &mut renderer)
        .await;
    h.router
        .dispatch(ALEX, &format!("upload-photo_{}", id), &mut renderer)
        .await;

    assert!(h.sessions.selected_jobs(DIRECTOR).contains(&a));
    assert!(h.sessions.awaiting(ALEX).is_some());
    assert!(h.sessions.awaiting(DIRECTOR).is_none());
}

#[tokio::test]
async fn daily_reset_returns_finished_work_to_the_pool() {
    let h = TestHarness::new();
    let done = JobBuilder::new("Site A").assigned_to(ANDY).insert(&h.store);
    let scheduled = JobBuilder::new("Site B")
        .assigned_to(ANDY)
        .scheduled_date("2099-01-01")
        .insert(&h.store);

    let mut renderer = FakeRenderer::new();
    for id in [done, scheduled] {
        h.router
            .dispatch(ANDY, &format!("start-job_{}", id), &mut renderer)
            .await;
    }
    h.router
        .dispatch(ANDY, &format!("finish-job_{}", done), &mut renderer)
        .await;

    let reset = h.store.reset_stale_jobs(Local::now().date_naive()).unwrap();
    assert_eq!(reset, 1);

    // The finished job is pending and unassigned again...
    let job = h.store.get(done).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.assigned_to.is_none());

    // ...and reappears in the assignment pool.
    h.router.dispatch(DIRECTOR, "assignment-list", &mut renderer).await;
    assert!(renderer
        .last_tokens()
        .contains(&format!("toggle-selection_{}", done)));

    // The future-scheduled job kept its state.
    assert_eq!(h.store.get(scheduled).unwrap().status, JobStatus::InProgress);
}
