// Fixtures and an in-memory upstream shared by the unit tests.
//
// The three-team league:
//   Team A (1): players 1..=15, captains 1, vice 2.
//   Team B (2): players 1 and 16..=29, captains 16, vice 1.
//   Team C (3): players 16..=30, captains 16, vice 17.
// Slots 12..=15 are the bench. Player `p` plays for club `(p - 1) % 4 + 1`.
// Gameweeks 1..=5 are finished, 6 is live, 7 onward upcoming.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LeagueError, Result};
use crate::model::{
    Bootstrap, Club, EntryId, Gameweek, GameweekInfo, LeagueId, LeagueInfo, LeagueStandings,
    LivePlayerStats, LivePoints, PendingTeam, Pick, Player, PlayerId, Squad, Team, TransferEvent,
};
use crate::upstream::Upstream;

pub(crate) const LEAGUE_ID: LeagueId = 100;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub(crate) fn gameweek(id: Gameweek, finished: bool, is_current: bool, is_next: bool) -> GameweekInfo {
    GameweekInfo {
        id,
        name: format!("Gameweek {id}"),
        deadline: None,
        finished,
        data_checked: finished,
        is_current,
        is_next,
        average_entry_score: 50,
        highest_score: finished.then_some(90),
    }
}

pub(crate) fn bootstrap(completed: Gameweek) -> Bootstrap {
    let mut b = Bootstrap::default();
    for (id, name, short) in [
        (1, "Arsenal", "ARS"),
        (2, "Brighton", "BHA"),
        (3, "Chelsea", "CHE"),
        (4, "Everton", "EVE"),
    ] {
        b.clubs.insert(
            id,
            Club {
                id,
                name: name.to_string(),
                short_name: short.to_string(),
            },
        );
    }
    for (id, name) in [(1, "GKP"), (2, "DEF"), (3, "MID"), (4, "FWD")] {
        b.positions.insert(id, name.to_string());
    }
    for id in 1..=32 {
        b.players.insert(
            id,
            Player {
                id,
                web_name: format!("P{id}"),
                club_id: (id - 1) % 4 + 1,
                position_id: (id - 1) % 4 + 1,
            },
        );
    }
    for id in 1..=38 {
        let finished = id <= completed;
        b.gameweeks.push(gameweek(
            id,
            finished,
            completed > 0 && id == completed + 1,
            if completed == 0 { id == 1 } else { id == completed + 2 },
        ));
    }
    b
}

pub(crate) fn team(entry_id: EntryId, name: &str, rank: u32, total_points: i32) -> Team {
    Team {
        entry_id,
        team_name: name.to_string(),
        manager_name: format!("Manager {entry_id}"),
        rank,
        last_rank: rank,
        total_points,
        event_total: 0,
    }
}

pub(crate) fn three_teams() -> Vec<Team> {
    vec![
        team(1, "Team A", 2, 300),
        team(2, "Team B", 1, 320),
        team(3, "Team C", 3, 290),
    ]
}

pub(crate) fn standings(teams: Vec<Team>, pending: Vec<PendingTeam>) -> LeagueStandings {
    LeagueStandings {
        league: LeagueInfo {
            id: LEAGUE_ID,
            name: "Test League".to_string(),
            created: Some("2024-07-01T10:00:00Z".to_string()),
            start_event: 1,
            admin_entry: Some(1),
        },
        teams,
        pending,
    }
}

/// Picks in slot order; the first 11 start, `captain` gets multiplier 2.
pub(crate) fn picks(players: &[PlayerId], captain: PlayerId, vice: PlayerId) -> Vec<Pick> {
    players
        .iter()
        .enumerate()
        .map(|(idx, &player_id)| {
            let position = idx as u8 + 1;
            let multiplier = if position > 11 {
                0
            } else if player_id == captain {
                2
            } else {
                1
            };
            Pick {
                player_id,
                position,
                multiplier,
                is_captain: player_id == captain,
                is_vice_captain: player_id == vice,
            }
        })
        .collect()
}

pub(crate) fn squad(entry_id: EntryId, gameweek: Gameweek, picks: Vec<Pick>, points: i32, cost: i32) -> Squad {
    Squad {
        entry_id,
        gameweek,
        picks,
        active_chip: None,
        points,
        total_points: 0,
        transfers_made: (cost / 4) as u32,
        transfer_cost: cost,
        points_on_bench: 0,
        bank: 5,
        value: 1000,
    }
}

pub(crate) fn squad_a(gameweek: Gameweek, points: i32, cost: i32) -> Squad {
    let players: Vec<PlayerId> = (1..=15).collect();
    squad(1, gameweek, picks(&players, 1, 2), points, cost)
}

pub(crate) fn squad_b(gameweek: Gameweek, points: i32, cost: i32) -> Squad {
    let players: Vec<PlayerId> = std::iter::once(1).chain(16..=29).collect();
    squad(2, gameweek, picks(&players, 16, 1), points, cost)
}

pub(crate) fn squad_c(gameweek: Gameweek, points: i32, cost: i32) -> Squad {
    let players: Vec<PlayerId> = (16..=30).collect();
    squad(3, gameweek, picks(&players, 16, 17), points, cost)
}

/// Gameweek 5 squads: net points A 56, B 55, C 56.
pub(crate) fn gameweek_five_squads() -> Vec<Squad> {
    vec![squad_a(5, 60, 4), squad_b(5, 55, 0), squad_c(5, 56, 0)]
}

pub(crate) fn live(gameweek: Gameweek, points: &[(PlayerId, i32)], default: i32) -> LivePoints {
    let mut live = LivePoints {
        gameweek,
        ..Default::default()
    };
    for id in 1..=32 {
        live.players.insert(
            id,
            LivePlayerStats {
                total_points: default,
                minutes: 90,
                ..Default::default()
            },
        );
    }
    for &(id, pts) in points {
        if let Some(stats) = live.players.get_mut(&id) {
            stats.total_points = pts;
        }
    }
    live
}

// ---------------------------------------------------------------------------
// FakeUpstream
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct FakeUpstream {
    bootstrap: Mutex<Bootstrap>,
    leagues: Mutex<HashMap<LeagueId, LeagueStandings>>,
    squads: Mutex<HashMap<(EntryId, Gameweek), Squad>>,
    transfers: Mutex<HashMap<EntryId, Vec<TransferEvent>>>,
    live: Mutex<HashMap<Gameweek, LivePoints>>,
    failing_picks: Mutex<HashSet<EntryId>>,
    delays: Mutex<HashMap<EntryId, Duration>>,
    picks_calls: AtomicUsize,
    transfers_calls: AtomicUsize,
    live_calls: AtomicUsize,
    league_calls: AtomicUsize,
}

impl FakeUpstream {
    pub(crate) fn new(bootstrap: Bootstrap) -> Self {
        Self {
            bootstrap: Mutex::new(bootstrap),
            ..Default::default()
        }
    }

    pub(crate) fn with_league(self, standings: LeagueStandings) -> Self {
        self.set_league(standings);
        self
    }

    pub(crate) fn set_league(&self, standings: LeagueStandings) {
        self.leagues.lock().unwrap().insert(standings.league.id, standings);
    }

    pub(crate) fn remove_league(&self, league_id: LeagueId) {
        self.leagues.lock().unwrap().remove(&league_id);
    }

    pub(crate) fn set_bootstrap(&self, bootstrap: Bootstrap) {
        *self.bootstrap.lock().unwrap() = bootstrap;
    }

    pub(crate) fn set_squad(&self, squad: Squad) {
        self.squads
            .lock()
            .unwrap()
            .insert((squad.entry_id, squad.gameweek), squad);
    }

    pub(crate) fn add_transfer(&self, entry_id: EntryId, gameweek: Gameweek, player_in: PlayerId, player_out: PlayerId) {
        self.transfers
            .lock()
            .unwrap()
            .entry(entry_id)
            .or_default()
            .push(TransferEvent {
                entry_id,
                gameweek,
                player_in,
                player_out,
            });
    }

    pub(crate) fn set_live(&self, live: LivePoints) {
        self.live.lock().unwrap().insert(live.gameweek, live);
    }

    pub(crate) fn fail_picks(&self, entry_id: EntryId) {
        self.failing_picks.lock().unwrap().insert(entry_id);
    }

    pub(crate) fn delay_picks(&self, entry_id: EntryId, delay: Duration) {
        self.delays.lock().unwrap().insert(entry_id, delay);
    }

    pub(crate) fn picks_calls(&self) -> usize {
        self.picks_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn transfers_calls(&self) -> usize {
        self.transfers_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn live_calls(&self) -> usize {
        self.live_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn league_calls(&self) -> usize {
        self.league_calls.load(Ordering::SeqCst)
    }
}

/// The three-team league with gameweek 5 and 6 squads, gameweek 5 transfers
/// and gameweek 6 live scores.
pub(crate) fn three_team_league() -> FakeUpstream {
    let upstream = FakeUpstream::new(bootstrap(5)).with_league(standings(three_teams(), vec![]));
    for squad in gameweek_five_squads() {
        upstream.set_squad(squad);
    }
    upstream.set_squad(squad_a(6, 12, 0));
    upstream.set_squad(squad_b(6, 10, 0));
    upstream.set_squad(squad_c(6, 8, 4));

    upstream.add_transfer(1, 5, 2, 31);
    upstream.add_transfer(2, 5, 16, 31);
    upstream.add_transfer(3, 5, 30, 32);
    upstream.add_transfer(3, 4, 29, 1);

    // A gross 30, B gross 35, C gross 26.
    upstream.set_live(live(6, &[(1, 10), (16, 8)], 1));
    upstream
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn bootstrap(&self) -> Result<Bootstrap> {
        Ok(self.bootstrap.lock().unwrap().clone())
    }

    async fn league_standings(&self, league_id: LeagueId) -> Result<LeagueStandings> {
        self.league_calls.fetch_add(1, Ordering::SeqCst);
        self.leagues
            .lock()
            .unwrap()
            .get(&league_id)
            .cloned()
            .ok_or(LeagueError::UpstreamNotFound {
                resource: format!("league {league_id}"),
            })
    }

    async fn picks(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Squad> {
        self.picks_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(&entry_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_picks.lock().unwrap().contains(&entry_id) {
            return Err(LeagueError::UpstreamUnavailable(format!("picks for {entry_id} failed")));
        }
        self.squads
            .lock()
            .unwrap()
            .get(&(entry_id, gameweek))
            .cloned()
            .ok_or(LeagueError::UpstreamNotFound {
                resource: format!("picks for team {entry_id} in gameweek {gameweek}"),
            })
    }

    async fn transfers(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Vec<TransferEvent>> {
        self.transfers_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .transfers
            .lock()
            .unwrap()
            .get(&entry_id)
            .map(|all| all.iter().filter(|t| t.gameweek == gameweek).copied().collect())
            .unwrap_or_default())
    }

    async fn live_points(&self, gameweek: Gameweek) -> Result<LivePoints> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        self.live
            .lock()
            .unwrap()
            .get(&gameweek)
            .cloned()
            .ok_or(LeagueError::UpstreamNotFound {
                resource: format!("live scores for gameweek {gameweek}"),
            })
    }
}
