//! Root application state.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::reflection::Reflection;
use crate::user::Identity;

/// The screens the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Screen {
    Auth,
    Home,
    Input,
    Simulation,
    Report,
    Diary,
}

impl Screen {
    /// Every screen except `Auth` needs a logged-in identity.
    pub fn requires_identity(self) -> bool {
        !matches!(self, Screen::Auth)
    }
}

/// In-memory state rendered by the front end.
///
/// While `screen == Report`, the viewed reflection (historical, read-only)
/// takes precedence over the current one (freshly completed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub identity: Option<Identity>,
    pub diary: Vec<Reflection>,
    pub current_reflection: Option<Reflection>,
    pub viewing_reflection: Option<Reflection>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Auth,
            identity: None,
            diary: Vec::new(),
            current_reflection: None,
            viewing_reflection: None,
        }
    }
}

impl AppState {
    /// Creates the logged-out state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Reflection the Report screen should show, if any.
    pub fn report_subject(&self) -> Option<&Reflection> {
        self.viewing_reflection
            .as_ref()
            .or(self.current_reflection.as_ref())
    }

    /// True while the Report screen shows a historical diary entry.
    pub fn is_viewing_history(&self) -> bool {
        self.viewing_reflection.is_some()
    }
}
