//! Login-session state for the current viewer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Populated by the external login collaborator; this crate never sees
//! credentials, only the display name the e-diary reports back.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::store::Store;

/// Session state tracking who is logged in and whether a login or lesson
/// fetch is in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub student_name: Option<String>,
    pub loading: bool,
}

impl SessionState {
    #[must_use]
    pub fn logged_in(&self) -> bool {
        self.student_name.is_some()
    }
}

/// A fresh session store with nobody logged in.
#[must_use]
pub fn session_store() -> Store<SessionState> {
    Store::new(SessionState::default())
}
