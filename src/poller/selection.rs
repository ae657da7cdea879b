//! Candidate user selection
//!
//! Users are queried one after another in configured order. The first one
//! actively playing wins and the rest are not queried. Without a winner the
//! sticky user's latest track is preferred, then the most recently queried
//! user that returned a track, then whatever the last query produced.

use thiserror::Error;
use tracing::debug;

use crate::lastfm::{FetchError, PollResult, RecentTracksQuery, RecentTracksSource};
use crate::track::Track;
use crate::types::Username;

/// Only the most recent track matters for now-playing detection.
const RECENT_LIMIT: u32 = 1;

/// Result of one selection pass.
#[derive(Debug)]
pub enum Selection {
    /// The track to report this cycle and the user it belongs to
    Found { user: Username, track: Track },

    /// No track could be determined this cycle
    Unavailable(Unavailable),
}

/// Why a cycle produced no track.
#[derive(Error, Debug)]
pub enum Unavailable {
    #[error("no Last.fm users configured")]
    NoCandidates,

    #[error("{user} has no recent tracks")]
    NoRecentTracks { user: Username },

    #[error("fetching recent tracks for {user} failed: {error}")]
    Failed { user: Username, error: FetchError },
}

/// Pick the track to report from `candidates`, given the previous sticky user.
pub async fn select_track<S>(
    source: &S,
    candidates: &[Username],
    sticky: Option<&Username>,
) -> Selection
where
    S: RecentTracksSource + ?Sized,
{
    let mut results: Vec<(&Username, PollResult)> = Vec::with_capacity(candidates.len());

    for user in candidates {
        let result = source
            .recent_tracks(&RecentTracksQuery::new(user.clone(), RECENT_LIMIT))
            .await;

        if let Some(track) = active_track(&result) {
            return Selection::Found {
                user: user.clone(),
                track: track.clone(),
            };
        }

        match &result {
            Ok(tracks) if tracks.is_empty() => debug!(user = %user, "No recent tracks"),
            Ok(_) => debug!(user = %user, "Not playing right now"),
            Err(error) => debug!(user = %user, error = %error, "Recent tracks query failed"),
        }
        results.push((user, result));
    }

    let chosen = sticky
        .and_then(|sticky| {
            results
                .iter()
                .position(|(user, result)| *user == sticky && has_track(result))
        })
        .or_else(|| results.iter().rposition(|(_, result)| has_track(result)))
        .or_else(|| results.len().checked_sub(1));

    let Some(index) = chosen else {
        return Selection::Unavailable(Unavailable::NoCandidates);
    };

    let (user, result) = results.swap_remove(index);
    let user = user.clone();
    match result {
        Ok(tracks) => match tracks.into_iter().next() {
            Some(track) => Selection::Found { user, track },
            None => Selection::Unavailable(Unavailable::NoRecentTracks { user }),
        },
        Err(error) => Selection::Unavailable(Unavailable::Failed { user, error }),
    }
}

fn active_track(result: &PollResult) -> Option<&Track> {
    result
        .as_ref()
        .ok()
        .and_then(|tracks| tracks.first())
        .filter(|track| track.is_active())
}

fn has_track(result: &PollResult) -> bool {
    result.as_ref().is_ok_and(|tracks| !tracks.is_empty())
}
