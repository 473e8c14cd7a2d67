// Wire schemas for the four upstream resources plus live scores.
//
// Each raw struct mirrors only the fields the engines read. Parsing goes
// through `parse_*` helpers that turn any shape mismatch into
// `LeagueError::UpstreamMalformed` at the client boundary.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{LeagueError, Result};
use crate::model::{
    Bootstrap, Club, EntryId, Gameweek, GameweekInfo, LeagueInfo, LeagueStandings, LivePlayerStats,
    LivePoints, PendingTeam, Pick, Player, Squad, Team, TransferEvent,
};

pub(crate) fn parse<T: DeserializeOwned>(resource: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| LeagueError::UpstreamMalformed {
        resource,
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// bootstrap-static/
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawBootstrap {
    pub events: Vec<RawEvent>,
    pub teams: Vec<RawClub>,
    pub elements: Vec<RawElement>,
    #[serde(default)]
    pub element_types: Vec<RawElementType>,
}

#[derive(Debug, Deserialize)]
pub struct RawEvent {
    pub id: Gameweek,
    pub name: String,
    #[serde(default)]
    pub deadline_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub data_checked: bool,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub average_entry_score: i32,
    #[serde(default)]
    pub highest_score: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RawClub {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RawElement {
    pub id: u32,
    pub web_name: String,
    pub team: u32,
    #[serde(default)]
    pub element_type: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawElementType {
    pub id: u32,
    pub singular_name_short: String,
}

impl From<RawBootstrap> for Bootstrap {
    fn from(raw: RawBootstrap) -> Self {
        let players = raw
            .elements
            .into_iter()
            .map(|e| {
                (
                    e.id,
                    Player {
                        id: e.id,
                        web_name: e.web_name,
                        club_id: e.team,
                        position_id: e.element_type,
                    },
                )
            })
            .collect();
        let clubs = raw
            .teams
            .into_iter()
            .map(|c| {
                (
                    c.id,
                    Club {
                        id: c.id,
                        name: c.name,
                        short_name: c.short_name,
                    },
                )
            })
            .collect();
        let positions = raw
            .element_types
            .into_iter()
            .map(|t| (t.id, t.singular_name_short))
            .collect();
        let mut gameweeks: Vec<GameweekInfo> = raw
            .events
            .into_iter()
            .map(|e| GameweekInfo {
                id: e.id,
                name: e.name,
                deadline: e.deadline_time,
                finished: e.finished,
                data_checked: e.data_checked,
                is_current: e.is_current,
                is_next: e.is_next,
                average_entry_score: e.average_entry_score,
                highest_score: e.highest_score,
            })
            .collect();
        gameweeks.sort_by_key(|g| g.id);

        Bootstrap {
            players,
            clubs,
            positions,
            gameweeks,
        }
    }
}

pub fn parse_bootstrap(body: &str) -> Result<Bootstrap> {
    parse::<RawBootstrap>("bootstrap", body).map(Bootstrap::from)
}

// ---------------------------------------------------------------------------
// leagues-classic/{id}/standings/
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawStandingsPage {
    pub league: RawLeague,
    pub standings: RawStandings,
    #[serde(default)]
    pub new_entries: Option<RawNewEntries>,
}

#[derive(Debug, Deserialize)]
pub struct RawLeague {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default = "first_gameweek")]
    pub start_event: Gameweek,
    #[serde(default)]
    pub admin_entry: Option<EntryId>,
}

fn first_gameweek() -> Gameweek {
    1
}

#[derive(Debug, Deserialize)]
pub struct RawStandings {
    #[serde(default)]
    pub has_next: bool,
    pub results: Vec<RawStandingRow>,
}

#[derive(Debug, Deserialize)]
pub struct RawStandingRow {
    pub entry: EntryId,
    pub entry_name: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub last_rank: u32,
    #[serde(default)]
    pub total: i32,
    #[serde(default)]
    pub event_total: i32,
}

#[derive(Debug, Deserialize)]
pub struct RawNewEntries {
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub results: Vec<RawNewEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RawNewEntry {
    pub entry: EntryId,
    pub entry_name: String,
    #[serde(default)]
    pub player_first_name: String,
    #[serde(default)]
    pub player_last_name: String,
    #[serde(default)]
    pub joined_time: Option<String>,
}

impl From<RawStandingRow> for Team {
    fn from(row: RawStandingRow) -> Self {
        Team {
            entry_id: row.entry,
            team_name: row.entry_name,
            manager_name: row.player_name,
            rank: row.rank,
            last_rank: row.last_rank,
            total_points: row.total,
            event_total: row.event_total,
        }
    }
}

impl From<RawNewEntry> for PendingTeam {
    fn from(row: RawNewEntry) -> Self {
        let manager_name = format!("{} {}", row.player_first_name, row.player_last_name)
            .trim()
            .to_string();
        PendingTeam {
            entry_id: row.entry,
            team_name: row.entry_name,
            manager_name,
            joined_time: row.joined_time,
        }
    }
}

pub fn parse_standings_page(body: &str) -> Result<RawStandingsPage> {
    parse("league standings", body)
}

/// Merge paginated standings into one membership record. Entries appearing on
/// more than one page (ranks shifting between requests) are kept once.
pub fn merge_standings_pages(pages: Vec<RawStandingsPage>) -> Result<LeagueStandings> {
    let mut pages = pages.into_iter();
    let first = pages.next().ok_or_else(|| LeagueError::UpstreamMalformed {
        resource: "league standings",
        message: "no pages returned".to_string(),
    })?;

    let league = LeagueInfo {
        id: first.league.id,
        name: first.league.name,
        created: first.league.created,
        start_event: first.league.start_event,
        admin_entry: first.league.admin_entry,
    };

    let mut seen = std::collections::HashSet::new();
    let mut teams = Vec::new();
    let mut pending = Vec::new();

    let rest = std::iter::once((first.standings, first.new_entries))
        .chain(pages.map(|p| (p.standings, p.new_entries)));
    for (standings, new_entries) in rest {
        for row in standings.results {
            if seen.insert(row.entry) {
                teams.push(Team::from(row));
            }
        }
        for row in new_entries.map(|n| n.results).unwrap_or_default() {
            if seen.insert(row.entry) {
                pending.push(PendingTeam::from(row));
            }
        }
    }

    Ok(LeagueStandings {
        league,
        teams,
        pending,
    })
}

// ---------------------------------------------------------------------------
// entry/{entry}/event/{gw}/picks/
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawPicks {
    #[serde(default)]
    pub active_chip: Option<String>,
    pub entry_history: RawEntryHistory,
    pub picks: Vec<RawPick>,
}

#[derive(Debug, Deserialize)]
pub struct RawEntryHistory {
    pub points: i32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub event_transfers: u32,
    #[serde(default)]
    pub event_transfers_cost: i32,
    #[serde(default)]
    pub points_on_bench: i32,
    #[serde(default)]
    pub bank: i32,
    #[serde(default)]
    pub value: i32,
}

#[derive(Debug, Deserialize)]
pub struct RawPick {
    pub element: u32,
    #[serde(default)]
    pub position: u8,
    pub multiplier: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

pub fn parse_picks(entry_id: EntryId, gameweek: Gameweek, body: &str) -> Result<Squad> {
    let raw: RawPicks = parse("picks", body)?;
    let mut picks: Vec<Pick> = raw
        .picks
        .into_iter()
        .map(|p| Pick {
            player_id: p.element,
            position: p.position,
            multiplier: p.multiplier,
            is_captain: p.is_captain,
            is_vice_captain: p.is_vice_captain,
        })
        .collect();
    picks.sort_by_key(|p| p.position);

    Ok(Squad {
        entry_id,
        gameweek,
        picks,
        active_chip: raw.active_chip,
        points: raw.entry_history.points,
        total_points: raw.entry_history.total_points,
        transfers_made: raw.entry_history.event_transfers,
        transfer_cost: raw.entry_history.event_transfers_cost,
        points_on_bench: raw.entry_history.points_on_bench,
        bank: raw.entry_history.bank,
        value: raw.entry_history.value,
    })
}

// ---------------------------------------------------------------------------
// entry/{entry}/transfers/
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawTransfer {
    pub element_in: u32,
    pub element_out: u32,
    pub event: Gameweek,
}

/// Parse a team's season transfer history, keeping only `gameweek`.
pub fn parse_transfers(
    entry_id: EntryId,
    gameweek: Gameweek,
    body: &str,
) -> Result<Vec<TransferEvent>> {
    let raw: Vec<RawTransfer> = parse("transfers", body)?;
    Ok(raw
        .into_iter()
        .filter(|t| t.event == gameweek)
        .map(|t| TransferEvent {
            entry_id,
            gameweek,
            player_in: t.element_in,
            player_out: t.element_out,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// event/{gw}/live/
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawLive {
    pub elements: Vec<RawLiveElement>,
}

#[derive(Debug, Deserialize)]
pub struct RawLiveElement {
    pub id: u32,
    #[serde(default)]
    pub stats: RawLiveStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLiveStats {
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub goals_scored: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub bonus: u32,
}

pub fn parse_live(gameweek: Gameweek, body: &str) -> Result<LivePoints> {
    let raw: RawLive = parse("live scores", body)?;
    let players: HashMap<u32, LivePlayerStats> = raw
        .elements
        .into_iter()
        .map(|e| {
            (
                e.id,
                LivePlayerStats {
                    total_points: e.stats.total_points,
                    minutes: e.stats.minutes,
                    goals_scored: e.stats.goals_scored,
                    assists: e.stats.assists,
                    bonus: e.stats.bonus,
                },
            )
        })
        .collect();
    Ok(LivePoints { gameweek, players })
}
