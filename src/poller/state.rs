//! Selection state and change detection

use crate::track::Track;
use crate::types::Username;

/// What the poller remembers between cycles.
///
/// Starts empty and lives only as long as the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Formatted string of the last track handed to the hooks
    last_reported: String,

    /// Last user confirmed to be actively playing
    sticky_user: Option<Username>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_reported(&self) -> &str {
        &self.last_reported
    }

    #[must_use]
    pub const fn sticky_user(&self) -> Option<&Username> {
        self.sticky_user.as_ref()
    }

    /// Whether `track` would produce a different display string than the
    /// last reported one.
    ///
    /// No track is never a change, so a failed cycle keeps the baseline.
    #[must_use]
    pub fn has_changed(&self, track: Option<&Track>, show_inactive: bool) -> bool {
        track.is_some_and(|track| track.formatted(show_inactive) != self.last_reported)
    }

    /// Accept `formatted` as the new comparison baseline.
    pub fn record(&mut self, formatted: String) {
        self.last_reported = formatted;
    }

    /// Prefer `user` when no candidate is actively playing.
    pub fn mark_sticky(&mut self, user: Username) {
        self.sticky_user = Some(user);
    }
}
