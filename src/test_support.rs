//! Shared fakes for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::hooks::Hook;
use crate::lastfm::{FetchError, PollResult, RecentTracksQuery, RecentTracksSource};
use crate::poller::StopHandle;
use crate::track::{sample_track, Track};
use crate::types::{Milliseconds, Username};

pub(crate) fn users(names: &[&str]) -> Vec<Username> {
    names.iter().copied().map(Username::from).collect()
}

/// Settings with a 10s interval and 30s cycle timeout.
pub(crate) fn settings(names: &[&str]) -> Settings {
    Settings {
        log_level: "info".to_string(),
        api_url: Url::parse("http://lastfm.test/2.0/").unwrap(),
        api_key: "key".to_string(),
        users: users(names),
        interval: Milliseconds::new(10_000),
        show_inactive_tracks: false,
        cycle_timeout: Duration::from_secs(30),
        hooks: Vec::new(),
    }
}

/// One scripted answer to a recent-tracks query.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// A single track that is playing now
    Playing(&'static str, &'static str),
    /// A single track that was scrobbled earlier
    Recent(&'static str, &'static str),
    /// A successful response without tracks
    Empty,
    /// An upstream error status
    Fail(u16),
    /// Never answers
    Hang,
}

/// Upstream fake answering from per-user reply queues.
///
/// The last reply of a queue repeats once the others are used up. Users
/// without a script get an empty history.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, u32)>>,
    stop_after: Mutex<Option<(usize, StopHandle)>>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, user: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(user.to_string(), replies.into_iter().collect());
        self
    }

    /// Request a stop once `calls` queries have been made.
    pub(crate) fn stop_after_calls(&self, calls: usize, handle: StopHandle) {
        *self.stop_after.lock().unwrap() = Some((calls, handle));
    }

    /// Users queried so far, in order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(user, _)| user.clone())
            .collect()
    }

    pub(crate) fn limits(&self) -> Vec<u32> {
        self.calls.lock().unwrap().iter().map(|(_, limit)| *limit).collect()
    }

    fn next_reply(&self, user: &str) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(user) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Empty),
            None => Reply::Empty,
        }
    }
}

#[async_trait]
impl RecentTracksSource for ScriptedSource {
    async fn recent_tracks(&self, query: &RecentTracksQuery) -> PollResult {
        let user = query.user.to_string();
        let made = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((user.clone(), query.limit));
            calls.len()
        };
        if let Some((after, handle)) = self.stop_after.lock().unwrap().as_ref() {
            if made >= *after {
                handle.stop();
            }
        }

        match self.next_reply(&user) {
            Reply::Playing(artist, name) => Ok(vec![sample_track(artist, name, true)]),
            Reply::Recent(artist, name) => Ok(vec![sample_track(artist, name, false)]),
            Reply::Empty => Ok(Vec::new()),
            Reply::Fail(status) => Err(FetchError::Status {
                status,
                text: "Scripted failure".to_string(),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Ordered record of hook calls shared between several hooks.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub(crate) fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Hook that logs `name:setup`, `name:change:<track>` and `name:teardown`.
pub(crate) struct RecordingHook {
    name: &'static str,
    log: EventLog,
    fail_setup: bool,
    fail_change: bool,
}

impl RecordingHook {
    pub(crate) fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_setup: false,
            fail_change: false,
        }
    }

    pub(crate) fn failing_on_setup(mut self) -> Self {
        self.fail_setup = true;
        self
    }

    pub(crate) fn failing_on_change(mut self) -> Self {
        self.fail_change = true;
        self
    }
}

#[async_trait]
impl Hook for RecordingHook {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn setup(&mut self) -> Result<()> {
        self.log.push(format!("{}:setup", self.name));
        if self.fail_setup {
            return Err(Error::hook(self.name, "setup refused"));
        }
        Ok(())
    }

    async fn on_track_change(&mut self, track: &Track) -> Result<()> {
        self.log
            .push(format!("{}:change:{}", self.name, track.formatted(true)));
        if self.fail_change {
            return Err(Error::hook(self.name, "boom"));
        }
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        self.log.push(format!("{}:teardown", self.name));
        Ok(())
    }
}
