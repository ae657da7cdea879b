//! Last.fm upstream access
//!
//! One query per candidate user, classified into a [`PollResult`]. Retry
//! policy belongs to the poller, not to this module.

mod client;
pub mod model;

pub use client::{
    FetchError, LastFmClient, PollResult, RecentTracksQuery, RecentTracksSource,
    RECENT_TRACKS_METHOD,
};
