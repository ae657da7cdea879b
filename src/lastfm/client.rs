//! Last.fm HTTP client

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::track::Track;
use crate::types::Username;

use super::model::RecentTracksResponse;

/// Last.fm method used to read a user's recent scrobbles.
pub const RECENT_TRACKS_METHOD: &str = "user.getrecenttracks";

/// Why a recent-tracks query produced no usable data.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("[{status}]: {text}")]
    Status { status: u16, text: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Validation(String),
}

/// Outcome of querying one candidate user.
pub type PollResult = std::result::Result<Vec<Track>, FetchError>;

/// Parameters of a `user.getrecenttracks` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTracksQuery {
    pub user: Username,
    pub limit: u32,
    pub page: Option<u32>,
    pub extended: bool,
}

impl RecentTracksQuery {
    /// Query for the `limit` most recent tracks of `user`.
    #[must_use]
    pub fn new(user: Username, limit: u32) -> Self {
        Self {
            user,
            limit,
            page: None,
            extended: false,
        }
    }

    /// Query parameters, skipping unset optional ones.
    fn params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("method", RECENT_TRACKS_METHOD.to_string()),
            ("format", "json".to_string()),
            ("api_key", api_key.to_string()),
            ("user", self.user.to_string()),
        ];
        if self.limit > 0 {
            params.push(("limit", self.limit.to_string()));
        }
        if let Some(page) = self.page.filter(|p| *p > 0) {
            params.push(("page", page.to_string()));
        }
        if self.extended {
            params.push(("extended", "1".to_string()));
        }
        params
    }
}

/// Anything that can answer a recent-tracks query.
///
/// Implementations never retry and never fail outside of [`PollResult`].
#[async_trait]
pub trait RecentTracksSource: Send + Sync {
    async fn recent_tracks(&self, query: &RecentTracksQuery) -> PollResult;
}

#[async_trait]
impl<T: RecentTracksSource + ?Sized> RecentTracksSource for std::sync::Arc<T> {
    async fn recent_tracks(&self, query: &RecentTracksQuery) -> PollResult {
        (**self).recent_tracks(query).await
    }
}

/// `reqwest`-backed Last.fm client
#[derive(Debug, Clone)]
pub struct LastFmClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl LastFmClient {
    /// Create a client for the given API base URL and key.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl RecentTracksSource for LastFmClient {
    async fn recent_tracks(&self, query: &RecentTracksQuery) -> PollResult {
        debug!(user = %query.user, limit = query.limit, "Fetching recent tracks");

        let response = self
            .http
            .get(self.base_url.clone())
            .query(&query.params(&self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: RecentTracksResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Validation(e.to_string()))?;
        let mut tracks = parsed.into_tracks().map_err(FetchError::Validation)?;

        if query.limit > 0 {
            tracks.truncate(query.limit as usize);
        }
        Ok(tracks)
    }
}
