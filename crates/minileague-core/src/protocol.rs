// Result shapes handed to the surrounding application, plus the error object.
//
// View structs for the statistics and tables live next to the code that
// computes them; this module holds the wrapper types and the season-level
// listings that do not belong to an engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{LeagueError, Result};
use crate::league::LeagueContext;
use crate::model::{Bootstrap, EntryId, Gameweek, LeagueInfo};
use crate::stats::StatKind;

// ---------------------------------------------------------------------------
// Error object
// ---------------------------------------------------------------------------

/// `{ "error": "<message>" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&LeagueError> for ErrorBody {
    fn from(err: &LeagueError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Either a successful view or the error object. Consumers check for the
/// `error` key before reading anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Ok(T),
    Err(ErrorBody),
}

impl<T> From<Result<T>> for Reply<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Reply::Ok(value),
            Err(err) => Reply::Err(ErrorBody::from(&err)),
        }
    }
}

impl<T> Reply<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Err(_))
    }
}

// ---------------------------------------------------------------------------
// Season-level listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatInfo {
    pub id: &'static str,
    pub name: &'static str,
}

pub fn available_stats() -> Vec<StatInfo> {
    StatKind::ALL
        .iter()
        .map(|kind| StatInfo {
            id: kind.id(),
            name: kind.title(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonInfo {
    pub current_gameweek: Gameweek,
    pub total_gameweeks: Gameweek,
    pub completed_gameweeks: Gameweek,
}

impl SeasonInfo {
    pub fn from_bootstrap(bootstrap: &Bootstrap) -> Self {
        Self {
            current_gameweek: bootstrap.current_gameweek(),
            total_gameweeks: bootstrap.total_gameweeks(),
            completed_gameweeks: bootstrap.completed_gameweeks(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deadline {
    pub gameweek: Gameweek,
    pub name: String,
    pub deadline_time: Option<DateTime<Utc>>,
    pub finished: bool,
    pub is_current: bool,
    pub is_next: bool,
}

pub fn deadlines(bootstrap: &Bootstrap) -> Vec<Deadline> {
    bootstrap
        .gameweeks
        .iter()
        .map(|g| Deadline {
            gameweek: g.id,
            name: g.name.clone(),
            deadline_time: g.deadline,
            finished: g.finished,
            is_current: g.is_current,
            is_next: g.is_next,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// League status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonStatus {
    pub season_started: bool,
    pub current_gameweek: Gameweek,
    pub completed_gameweeks: Gameweek,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberLine {
    pub entry_id: EntryId,
    pub team_name: String,
    pub manager_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_points: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberGroup {
    pub count: usize,
    pub teams: Vec<MemberLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueStatus {
    pub league: LeagueInfo,
    pub season_status: SeasonStatus,
    pub active: MemberGroup,
    pub pending: MemberGroup,
}

impl LeagueStatus {
    pub fn from_context(ctx: &LeagueContext) -> Self {
        let active: Vec<MemberLine> = ctx
            .teams
            .iter()
            .map(|t| MemberLine {
                entry_id: t.entry_id,
                team_name: t.team_name.clone(),
                manager_name: t.manager_name.clone(),
                total_points: Some(t.total_points),
                rank: Some(t.rank),
                joined_time: None,
            })
            .collect();
        let pending: Vec<MemberLine> = ctx
            .pending
            .iter()
            .map(|p| MemberLine {
                entry_id: p.entry_id,
                team_name: p.team_name.clone(),
                manager_name: p.manager_name.clone(),
                total_points: None,
                rank: None,
                joined_time: p.joined_time.clone(),
            })
            .collect();

        Self {
            league: ctx.league.clone(),
            season_status: SeasonStatus {
                season_started: !ctx.is_pre_season,
                current_gameweek: ctx.current_gameweek,
                completed_gameweeks: ctx.completed_gameweeks,
            },
            active: MemberGroup {
                count: active.len(),
                teams: active,
            },
            pending: MemberGroup {
                count: pending.len(),
                teams: pending,
            },
        }
    }
}
