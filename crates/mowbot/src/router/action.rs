//! The interaction-token vocabulary.
//!
//! Every inbound token decodes into exactly one [`Action`] variant at
//! the boundary; handlers never touch raw strings. Fixed tokens name
//! whole screens, parameterized tokens are `<family>_<id>` with a
//! base-10 integer argument.

use crate::store::{JobId, UserId};

/// A decoded interaction token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Fixed screens.
    Home,
    Help,
    DevHome,
    DirectorHome,
    EmployeeHome,
    MyJobs,
    AssignmentList,
    EmployeeChoiceList,
    CompletedChoiceList,
    Noop,

    // Parameterized actions.
    ToggleSelection(JobId),
    Page(u32),
    AssignToEmployee(UserId),
    CompletedJobs(UserId),
    ViewJob(JobId),
    StartJob(JobId),
    FinishJob(JobId),
    UploadPhoto(JobId),
    FinishUpload(JobId),
    ViewPhotos(JobId),
    PhotoNavigation(usize),
    PhotoGridNavigation(usize),
    EditNote(JobId),
    CancelNote(JobId),
    SiteInfo(JobId),
    MapLink(JobId),
    RefreshWeather(JobId),
}

impl Action {
    /// Decodes a UTF-8 token. Returns None for anything outside the
    /// vocabulary; the router renders an "unsupported action" screen
    /// for those instead of failing.
    pub fn parse(token: &str) -> Option<Action> {
        match token {
            "home" => return Some(Action::Home),
            "help" => return Some(Action::Help),
            "dev-home" => return Some(Action::DevHome),
            "director-home" => return Some(Action::DirectorHome),
            "employee-home" => return Some(Action::EmployeeHome),
            "my-jobs" => return Some(Action::MyJobs),
            "assignment-list" => return Some(Action::AssignmentList),
            "employee-choice-list" => return Some(Action::EmployeeChoiceList),
            "completed-choice-list" => return Some(Action::CompletedChoiceList),
            "noop" => return Some(Action::Noop),
            _ => {}
        }

        let (family, arg) = token.rsplit_once('_')?;
        let id: i64 = arg.parse().ok()?;
        let index = usize::try_from(id).ok();
        let page = u32::try_from(id).ok();

        Some(match family {
            "toggle-selection" => Action::ToggleSelection(id),
            "page" => Action::Page(page?),
            "assign-to-employee" => Action::AssignToEmployee(id),
            "completed-jobs" => Action::CompletedJobs(id),
            "view-job" => Action::ViewJob(id),
            "start-job" => Action::StartJob(id),
            "finish-job" => Action::FinishJob(id),
            "upload-photo" => Action::UploadPhoto(id),
            "finish-upload" => Action::FinishUpload(id),
            "view-photos" => Action::ViewPhotos(id),
            "photo-navigation" => Action::PhotoNavigation(index?),
            "photo-grid-navigation" => Action::PhotoGridNavigation(index?),
            "edit-note" => Action::EditNote(id),
            "cancel-note" => Action::CancelNote(id),
            "site-info" => Action::SiteInfo(id),
            "map-link" => Action::MapLink(id),
            "refresh-weather" => Action::RefreshWeather(id),
            _ => return None,
        })
    }

    /// Encodes the action back into its wire token, for building menus.
    pub fn token(&self) -> String {
        match self {
            Action::Home => "home".to_string(),
            Action::Help => "help".to_string(),
            Action::DevHome => "dev-home".to_string(),
            Action::DirectorHome => "director-home".to_string(),
            Action::EmployeeHome => "employee-home".to_string(),
            Action::MyJobs => "my-jobs".to_string(),
            Action::AssignmentList => "assignment-list".to_string(),
            Action::EmployeeChoiceList => "employee-choice-list".to_string(),
            Action::CompletedChoiceList => "completed-choice-list".to_string(),
            Action::Noop => "noop".to_string(),
            Action::ToggleSelection(id) => format!("toggle-selection_{}", id),
            Action::Page(page) => format!("page_{}", page),
            Action::AssignToEmployee(id) => format!("assign-to-employee_{}", id),
            Action::CompletedJobs(id) => format!("completed-jobs_{}", id),
            Action::ViewJob(id) => format!("view-job_{}", id),
            Action::StartJob(id) => format!("start-job_{}", id),
            Action::FinishJob(id) => format!("finish-job_{}", id),
            Action::UploadPhoto(id) => format!("upload-photo_{}", id),
            Action::FinishUpload(id) => format!("finish-upload_{}", id),
            Action::ViewPhotos(id) => format!("view-photos_{}", id),
            Action::PhotoNavigation(index) => format!("photo-navigation_{}", index),
            Action::PhotoGridNavigation(page) => format!("photo-grid-navigation_{}", page),
            Action::EditNote(id) => format!("edit-note_{}", id),
            Action::CancelNote(id) => format!("cancel-note_{}", id),
            Action::SiteInfo(id) => format!("site-info_{}", id),
            Action::MapLink(id) => format!("map-link_{}", id),
            Action::RefreshWeather(id) => format!("refresh-weather_{}", id),
        }
    }
}
