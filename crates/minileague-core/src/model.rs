// Normalized domain records built from upstream payloads.
//
// Everything here is read-only once constructed. Cache entries hold these
// behind `Arc` and every engine borrows them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub type PlayerId = u32;
pub type ClubId = u32;
pub type EntryId = u64;
pub type LeagueId = u64;
pub type Gameweek = u32;

/// Number of gameweeks in a full season when bootstrap does not say otherwise.
pub const DEFAULT_MAX_GAMEWEEK: Gameweek = 38;

// ---------------------------------------------------------------------------
// Season-global reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub web_name: String,
    pub club_id: ClubId,
    /// 1 = GKP, 2 = DEF, 3 = MID, 4 = FWD.
    pub position_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub short_name: String,
}

/// Where a gameweek sits in its lifecycle. Drives cache lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameweekPhase {
    /// Over and bonus points confirmed; upstream data no longer changes.
    Finished,
    /// In progress; scores move as matches are played.
    Live,
    /// Deadline not yet passed.
    Upcoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameweekInfo {
    pub id: Gameweek,
    pub name: String,
    pub deadline: Option<DateTime<Utc>>,
    pub finished: bool,
    pub data_checked: bool,
    pub is_current: bool,
    pub is_next: bool,
    pub average_entry_score: i32,
    pub highest_score: Option<i32>,
}

impl GameweekInfo {
    pub fn phase(&self) -> GameweekPhase {
        if self.finished && self.data_checked {
            GameweekPhase::Finished
        } else if self.is_current || self.finished {
            GameweekPhase::Live
        } else {
            GameweekPhase::Upcoming
        }
    }
}

/// The bootstrap resource: players, clubs, positions and the gameweek list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bootstrap {
    pub players: HashMap<PlayerId, Player>,
    pub clubs: HashMap<ClubId, Club>,
    pub positions: HashMap<u32, String>,
    pub gameweeks: Vec<GameweekInfo>,
}

impl Bootstrap {
    /// Display name for a player, falling back to `Player {id}` for ids the
    /// bootstrap data does not know about.
    pub fn player_name(&self, id: PlayerId) -> String {
        self.players
            .get(&id)
            .map(|p| p.web_name.clone())
            .unwrap_or_else(|| format!("Player {id}"))
    }

    pub fn club_of(&self, player: PlayerId) -> Option<&Club> {
        let player = self.players.get(&player)?;
        self.clubs.get(&player.club_id)
    }

    pub fn club_name(&self, id: ClubId) -> String {
        self.clubs
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Team {id}"))
    }

    pub fn position_name(&self, position_id: u32) -> String {
        self.positions
            .get(&position_id)
            .cloned()
            .unwrap_or_else(|| "UNK".to_string())
    }

    pub fn total_gameweeks(&self) -> Gameweek {
        if self.gameweeks.is_empty() {
            DEFAULT_MAX_GAMEWEEK
        } else {
            self.gameweeks.len() as Gameweek
        }
    }

    pub fn completed_gameweeks(&self) -> Gameweek {
        self.gameweeks.iter().filter(|g| g.finished).count() as Gameweek
    }

    /// Resolve the gameweek a user most likely wants to look at.
    ///
    /// First `is_current` event; otherwise the event before the first
    /// `is_next` one; otherwise the last finished event; otherwise 1.
    pub fn current_gameweek(&self) -> Gameweek {
        let mut current = None;
        for (idx, event) in self.gameweeks.iter().enumerate() {
            if event.is_current {
                current = Some(idx as Gameweek + 1);
                break;
            }
            if event.is_next {
                current = Some((idx as Gameweek).max(1));
                break;
            }
        }

        let current = current.unwrap_or_else(|| {
            self.gameweeks
                .iter()
                .enumerate()
                .filter(|(_, e)| e.finished)
                .map(|(idx, _)| idx as Gameweek + 1)
                .last()
                .unwrap_or(1)
        });

        current.min(self.total_gameweeks())
    }

    pub fn gameweek(&self, gw: Gameweek) -> Option<&GameweekInfo> {
        self.gameweeks.iter().find(|g| g.id == gw)
    }

    /// Phase of a gameweek. Unknown gameweeks are treated as upcoming so they
    /// never get cached indefinitely.
    pub fn phase(&self, gw: Gameweek) -> GameweekPhase {
        self.gameweek(gw)
            .map(GameweekInfo::phase)
            .unwrap_or(GameweekPhase::Upcoming)
    }
}

// ---------------------------------------------------------------------------
// League membership
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueInfo {
    pub id: LeagueId,
    pub name: String,
    pub created: Option<String>,
    pub start_event: Gameweek,
    pub admin_entry: Option<EntryId>,
}

/// A league member's fantasy squad, as listed in the league standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub entry_id: EntryId,
    pub team_name: String,
    pub manager_name: String,
    /// League rank as last published upstream (0 before the season starts).
    pub rank: u32,
    pub last_rank: u32,
    pub total_points: i32,
    pub event_total: i32,
}

/// A team that has joined but not yet played a scored gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTeam {
    pub entry_id: EntryId,
    pub team_name: String,
    pub manager_name: String,
    pub joined_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueStandings {
    pub league: LeagueInfo,
    pub teams: Vec<Team>,
    pub pending: Vec<PendingTeam>,
}

// ---------------------------------------------------------------------------
// Per-(team, gameweek) data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    pub player_id: PlayerId,
    /// Squad slot 1..=15; 1..=11 start, 12..=15 are the bench.
    pub position: u8,
    /// 0 = benched, 1 = starting, 2 = captain, 3 = triple captain.
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

impl Pick {
    pub fn is_starting(&self) -> bool {
        self.multiplier > 0
    }
}

/// One team's picks for one gameweek plus the gameweek's scoring header.
#[derive(Debug, Clone, PartialEq)]
pub struct Squad {
    pub entry_id: EntryId,
    pub gameweek: Gameweek,
    pub picks: Vec<Pick>,
    pub active_chip: Option<String>,
    /// Gross gameweek points as scored upstream.
    pub points: i32,
    pub total_points: i32,
    pub transfers_made: u32,
    pub transfer_cost: i32,
    pub points_on_bench: i32,
    /// Tenths of a million.
    pub bank: i32,
    pub value: i32,
}

impl Squad {
    pub fn captain(&self) -> Option<&Pick> {
        self.picks.iter().find(|p| p.is_captain)
    }

    pub fn vice_captain(&self) -> Option<&Pick> {
        self.picks.iter().find(|p| p.is_vice_captain)
    }

    pub fn net_points(&self) -> i32 {
        self.points - self.transfer_cost
    }

    /// Gameweek points, recomputed from live player scores when given.
    pub fn gross_points(&self, live: Option<&LivePoints>) -> i32 {
        live.map(|l| l.gross_for(self)).unwrap_or(self.points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferEvent {
    pub entry_id: EntryId,
    pub gameweek: Gameweek,
    pub player_in: PlayerId,
    pub player_out: PlayerId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LivePlayerStats {
    pub total_points: i32,
    pub minutes: u32,
    pub goals_scored: u32,
    pub assists: u32,
    pub bonus: u32,
}

/// Per-player scores for a gameweek as they currently stand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LivePoints {
    pub gameweek: Gameweek,
    pub players: HashMap<PlayerId, LivePlayerStats>,
}

impl LivePoints {
    pub fn points_for(&self, player: PlayerId) -> i32 {
        self.players.get(&player).map(|s| s.total_points).unwrap_or(0)
    }

    /// Starting slots' live points times multiplier.
    pub fn gross_for(&self, squad: &Squad) -> i32 {
        squad
            .picks
            .iter()
            .filter(|p| p.is_starting())
            .map(|p| self.points_for(p.player_id) * i32::from(p.multiplier))
            .sum()
    }
}
