//! Last.fm poll loop
//!
//! Polls on a fixed interval, decides which track is current, and hands
//! changes to the hook dispatcher. Cycles never overlap: a slow cycle delays
//! the next tick instead of running alongside it.

mod selection;
mod state;

pub use selection::{select_track, Selection, Unavailable};
pub use state::SelectionState;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::config::Settings;
use crate::hooks::HookDispatcher;
use crate::lastfm::RecentTracksSource;
use crate::track::Track;
use crate::types::{Milliseconds, Username};

/// Where the poller is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Evaluating,
    Notifying,
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The display string changed and hooks were notified
    Changed,
    /// A track was found but it formats the same as before
    Unchanged,
    /// No track could be determined; state was left alone
    NoTrack,
}

/// Requests a graceful stop of a running [`Poller`].
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    /// Stop after the current cycle finishes.
    ///
    /// This method is synchronous and may be called any number of times.
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// The poll loop
pub struct Poller<S> {
    source: S,
    dispatcher: HookDispatcher,
    users: Vec<Username>,
    interval: Milliseconds,
    cycle_timeout: Duration,
    show_inactive_tracks: bool,
    state: SelectionState,
    phase: Phase,
    stop: Arc<watch::Sender<bool>>,
}

impl<S: RecentTracksSource> Poller<S> {
    /// Create a poller over `source` that notifies `dispatcher`.
    #[must_use]
    pub fn new(source: S, dispatcher: HookDispatcher, settings: &Settings) -> Self {
        let (stop, _) = watch::channel(false);

        Self {
            source,
            dispatcher,
            users: settings.users.clone(),
            interval: settings.interval,
            cycle_timeout: settings.cycle_timeout,
            show_inactive_tracks: settings.show_inactive_tracks,
            state: SelectionState::new(),
            phase: Phase::Idle,
            stop: Arc::new(stop),
        }
    }

    /// Handle for stopping the loop from a signal handler or another task.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Set up hooks, poll immediately and then every interval until stopped,
    /// then tear the hooks down.
    pub async fn run(mut self) {
        let mut stop_rx = self.stop.subscribe();

        info!(hooks = self.dispatcher.len(), "Setting up hooks...");
        self.dispatcher.setup_all().await;
        info!("Hooks set up");

        // The first tick completes immediately
        let mut ticker = time::interval(self.interval.as_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*stop_rx.borrow_and_update() {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => {}
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }

        info!("Received shutdown signal, tearing down hooks...");
        self.dispatcher.teardown_all().await;
        info!("Poller stopped");
    }

    /// Run one full query, select, detect and notify pass.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        self.set_phase(Phase::Fetching);
        let sticky = self.state.sticky_user().cloned();
        let selection = time::timeout(
            self.cycle_timeout,
            select_track(&self.source, &self.users, sticky.as_ref()),
        )
        .await;

        self.set_phase(Phase::Evaluating);
        let outcome = match selection {
            Ok(Selection::Found { user, track }) => self.evaluate(user, track).await,
            Ok(Selection::Unavailable(reason)) => {
                self.report_unavailable(&reason);
                CycleOutcome::NoTrack
            }
            Err(_) => {
                warn!(
                    timeout = %humantime::format_duration(self.cycle_timeout),
                    "Last.fm did not answer in time, trying again in {}",
                    self.interval
                );
                CycleOutcome::NoTrack
            }
        };

        self.set_phase(Phase::Idle);
        outcome
    }

    async fn evaluate(&mut self, user: Username, track: Track) -> CycleOutcome {
        if track.is_active() {
            debug!(user = %user, "Found currently playing track");
            self.state.mark_sticky(user);
        }

        if !self.state.has_changed(Some(&track), self.show_inactive_tracks) {
            trace!("Track unchanged");
            return CycleOutcome::Unchanged;
        }

        let formatted = track.formatted(self.show_inactive_tracks);
        if formatted.is_empty() {
            info!("Nothing playing any more");
        } else {
            info!(track = %formatted, "Received new track");
        }
        self.state.record(formatted);

        self.set_phase(Phase::Notifying);
        self.dispatcher.notify_all(&track).await;
        CycleOutcome::Changed
    }

    fn report_unavailable(&self, reason: &Unavailable) {
        match reason {
            Unavailable::NoRecentTracks { user } => {
                debug!(user = %user, "No recent tracks to report");
            }
            Unavailable::NoCandidates | Unavailable::Failed { .. } => {
                warn!(
                    reason = %reason,
                    "Failed to fetch recent tracks from Last.fm, trying again in {}",
                    self.interval
                );
            }
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        trace!(from = ?self.phase, to = ?phase, "Poller phase");
        self.phase = phase;
    }
}
