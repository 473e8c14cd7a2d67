// Error taxonomy shared by the upstream client, cache, and engines.

use thiserror::Error;

/// Everything that can go wrong while answering a league query.
///
/// Per-team fetch failures inside a fan-out are not represented here: they
/// are collected as [`crate::source::FailedTeam`] records and reported next to
/// the (still successful) result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeagueError {
    #[error("no league configured; set a league id first")]
    NoLeagueConfigured,

    #[error("league {league_id} not found (invalid or private id)")]
    LeagueNotFound { league_id: u64 },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("unexpected {resource} payload from upstream: {message}")]
    UpstreamMalformed {
        resource: &'static str,
        message: String,
    },

    #[error("upstream has no {resource}")]
    UpstreamNotFound { resource: String },

    #[error("gameweek {gameweek} is out of range 1..={max}")]
    GameweekOutOfRange { gameweek: u32, max: u32 },

    #[error("unknown stat type: {0}")]
    UnknownStat(String),

    #[error("team {entry_id} is not a member of this league")]
    TeamNotInLeague { entry_id: u64 },
}

impl LeagueError {
    /// Whether re-issuing the same query later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeagueError::UpstreamUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, LeagueError>;
