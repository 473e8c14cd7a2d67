// League context: the resolved member list and season position a session
// operates against.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::debug;

use crate::error::{LeagueError, Result};
use crate::model::{
    Bootstrap, EntryId, Gameweek, LeagueId, LeagueInfo, LeagueStandings, PendingTeam, Team,
};
use crate::source::DataSource;

// ---------------------------------------------------------------------------
// LeagueContext
// ---------------------------------------------------------------------------

/// Immutable snapshot of one league. Replaced wholesale on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueContext {
    pub league: LeagueInfo,
    /// Active members in upstream standings order.
    pub teams: Vec<Team>,
    /// Members that joined but have not played a scored gameweek yet.
    pub pending: Vec<PendingTeam>,
    pub current_gameweek: Gameweek,
    pub max_gameweek: Gameweek,
    pub completed_gameweeks: Gameweek,
    pub is_pre_season: bool,
}

impl LeagueContext {
    /// Fetch standings and bootstrap and resolve a new context.
    pub async fn load(source: &DataSource, league_id: LeagueId) -> Result<Self> {
        let standings = source.league(league_id).await?;
        let bootstrap = source.bootstrap().await?;
        let ctx = Self::resolve(&standings, &bootstrap);

        debug!(
            league_id,
            teams = ctx.teams.len(),
            gameweek = ctx.current_gameweek,
            "league resolved"
        );
        Ok(ctx)
    }

    pub fn resolve(standings: &LeagueStandings, bootstrap: &Bootstrap) -> Self {
        let completed_gameweeks = bootstrap.completed_gameweeks();
        Self {
            league: standings.league.clone(),
            teams: standings.teams.clone(),
            pending: standings.pending.clone(),
            current_gameweek: bootstrap.current_gameweek(),
            max_gameweek: bootstrap.total_gameweeks(),
            completed_gameweeks,
            is_pre_season: completed_gameweeks == 0,
        }
    }

    pub fn league_id(&self) -> LeagueId {
        self.league.id
    }

    pub fn league_name(&self) -> &str {
        &self.league.name
    }

    pub fn total_teams(&self) -> usize {
        self.teams.len()
    }

    /// Check `gameweek` lies in `1..=max_gameweek`.
    pub fn validate_gameweek(&self, gameweek: Gameweek) -> Result<Gameweek> {
        if gameweek == 0 || gameweek > self.max_gameweek {
            return Err(LeagueError::GameweekOutOfRange {
                gameweek,
                max: self.max_gameweek,
            });
        }
        Ok(gameweek)
    }

    /// The requested gameweek, or the current one when none is given.
    pub fn resolve_gameweek(&self, gameweek: Option<Gameweek>) -> Result<Gameweek> {
        self.validate_gameweek(gameweek.unwrap_or(self.current_gameweek))
    }

    pub fn team(&self, entry_id: EntryId) -> Result<&Team> {
        self.teams
            .iter()
            .find(|t| t.entry_id == entry_id)
            .ok_or(LeagueError::TeamNotInLeague { entry_id })
    }

    /// Names for the pre-season listing: active members, or pending ones if
    /// nobody is active yet.
    pub fn roster(&self) -> Vec<RosterEntry> {
        if self.teams.is_empty() {
            self.pending
                .iter()
                .map(|p| RosterEntry {
                    entry_id: p.entry_id,
                    team_name: p.team_name.clone(),
                    manager_name: p.manager_name.clone(),
                })
                .collect()
        } else {
            self.teams
                .iter()
                .map(|t| RosterEntry {
                    entry_id: t.entry_id,
                    team_name: t.team_name.clone(),
                    manager_name: t.manager_name.clone(),
                })
                .collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub entry_id: EntryId,
    pub team_name: String,
    pub manager_name: String,
}

// ---------------------------------------------------------------------------
// LeagueSlot
// ---------------------------------------------------------------------------

/// Holder for the session's current league. Readers get an `Arc` snapshot
/// and never observe a half-updated context.
#[derive(Debug, Default)]
pub struct LeagueSlot {
    current: RwLock<Option<Arc<LeagueContext>>>,
}

impl LeagueSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Result<Arc<LeagueContext>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(LeagueError::NoLeagueConfigured)
    }

    pub fn replace(&self, ctx: LeagueContext) -> Arc<LeagueContext> {
        let ctx = Arc::new(ctx);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&ctx));
        ctx
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
