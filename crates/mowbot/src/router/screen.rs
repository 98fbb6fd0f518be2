//! Screens and the renderer boundary.
//!
//! A screen is one logical (text, action-menu) unit. The engine renders
//! it by replacing whatever the user currently sees; the transport
//! adapter behind [`ScreenRenderer`] decides how that maps onto its
//! messaging surface.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// One tappable action button. The token feeds back into dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Rows of buttons below the screen text.
pub type Menu = Vec<Vec<Button>>;

/// The single logical screen shown to a user at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub menu: Menu,
}

impl Screen {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: Vec::new(),
        }
    }

    pub fn with_menu(text: impl Into<String>, menu: Menu) -> Self {
        Self {
            text: text.into(),
            menu,
        }
    }
}

/// Rendering failures surfaced by the transport adapter.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The previous screen can no longer be edited in place (expired,
    /// deleted, ...). The router falls back to sending a new screen.
    #[error("previous screen can no longer be edited in place")]
    Conflict,

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Transport boundary. One implementor per connected chat surface.
#[async_trait]
pub trait ScreenRenderer: Send {
    /// Replaces the currently displayed screen in place.
    async fn edit(&mut self, screen: &Screen) -> Result<(), RenderError>;

    /// Sends the screen as a new message, making it the current screen.
    async fn send(&mut self, screen: &Screen) -> Result<(), RenderError>;

    /// Sends photo content as a new message with the screen as its
    /// caption and menu. Always a new message: rich content cannot be
    /// edited into an existing text screen.
    async fn send_photos(&mut self, photos: &[PathBuf], screen: &Screen)
        -> Result<(), RenderError>;

    /// Removes the previously displayed screen, preserving the
    /// single-visible-screen illusion after `send_photos`.
    async fn remove_previous(&mut self) -> Result<(), RenderError>;
}
