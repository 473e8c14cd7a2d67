// HTTP client for the fantasy API using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::schema;
use super::Upstream;
use crate::config::UpstreamConfig;
use crate::error::{LeagueError, Result};
use crate::model::{
    Bootstrap, EntryId, Gameweek, LeagueId, LeagueStandings, LivePoints, Squad, TransferEvent,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api/";
pub const DEFAULT_USER_AGENT: &str = concat!("minileague/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// FplClient
// ---------------------------------------------------------------------------

/// reqwest-backed [`Upstream`] implementation.
pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
    max_standings_pages: u32,
}

impl FplClient {
    /// Create a client rooted at `base_url`. Every request is bounded by
    /// `timeout`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        max_standings_pages: u32,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| LeagueError::UpstreamUnavailable(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            max_standings_pages: max_standings_pages.max(1),
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
            config.max_standings_pages,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}{path}` and return the body of a 2xx response.
    async fn get_text(&self, path: &str, resource: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "upstream request");

        let response = self.http.get(&url).send().await.map_err(|e| {
            warn!(%url, error = %e, "upstream request failed");
            if e.is_timeout() {
                LeagueError::UpstreamUnavailable(format!("{resource} request timed out"))
            } else {
                LeagueError::UpstreamUnavailable(format!("{resource} request failed: {e}"))
            }
        })?;

        let status = response.status();
        if let Some(err) = status_error(status, resource) {
            warn!(%url, %status, "upstream returned an error status");
            return Err(err);
        }

        response
            .text()
            .await
            .map_err(|e| LeagueError::UpstreamUnavailable(format!("failed reading {resource} body: {e}")))
    }
}

#[async_trait]
impl Upstream for FplClient {
    async fn bootstrap(&self) -> Result<Bootstrap> {
        let body = self.get_text("bootstrap-static/", "bootstrap").await?;
        schema::parse_bootstrap(&body)
    }

    async fn league_standings(&self, league_id: LeagueId) -> Result<LeagueStandings> {
        let resource = format!("league {league_id}");
        let mut pages = Vec::new();

        for page in 1..=self.max_standings_pages {
            let path = format!(
                "leagues-classic/{league_id}/standings/?page_standings={page}&page_new_entries={page}"
            );
            let body = self.get_text(&path, &resource).await?;
            let parsed = schema::parse_standings_page(&body)?;
            let more = parsed.standings.has_next
                || parsed.new_entries.as_ref().is_some_and(|n| n.has_next);
            pages.push(parsed);
            if !more {
                break;
            }
            if page == self.max_standings_pages {
                warn!(league_id, page, "standings truncated at page limit");
            }
        }

        schema::merge_standings_pages(pages)
    }

    async fn picks(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Squad> {
        let path = format!("entry/{entry_id}/event/{gameweek}/picks/");
        let body = self
            .get_text(&path, &format!("picks for team {entry_id} in gameweek {gameweek}"))
            .await?;
        schema::parse_picks(entry_id, gameweek, &body)
    }

    async fn transfers(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Vec<TransferEvent>> {
        let path = format!("entry/{entry_id}/transfers/");
        let body = self
            .get_text(&path, &format!("transfers for team {entry_id}"))
            .await?;
        schema::parse_transfers(entry_id, gameweek, &body)
    }

    async fn live_points(&self, gameweek: Gameweek) -> Result<LivePoints> {
        let path = format!("event/{gameweek}/live/");
        let body = self
            .get_text(&path, &format!("live scores for gameweek {gameweek}"))
            .await?;
        schema::parse_live(gameweek, &body)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

/// Map a non-2xx status to the error taxonomy. Private leagues answer 403.
pub(crate) fn status_error(status: StatusCode, resource: &str) -> Option<LeagueError> {
    if status.is_success() {
        return None;
    }
    match status {
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Some(LeagueError::UpstreamNotFound {
            resource: resource.to_string(),
        }),
        _ => Some(LeagueError::UpstreamUnavailable(format!(
            "{resource} returned HTTP {status}"
        ))),
    }
}
