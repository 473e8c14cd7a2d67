// Shared helpers for the integration tests: a stub upstream that serves
// JSON bodies through the real payload parsers, and builders for those
// bodies.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use minileague_core::config::Config;
use minileague_core::error::{LeagueError, Result};
use minileague_core::model::{
    Bootstrap, EntryId, Gameweek, LeagueId, LeagueStandings, LivePoints, Squad, TransferEvent,
};
use minileague_core::upstream::{schema, Upstream};
use minileague_core::App;

pub const LEAGUE_ID: LeagueId = 314159;

// ===========================================================================
// StubUpstream
// ===========================================================================

/// In-memory upstream keyed by a short path:
/// `bootstrap`, `league/{id}`, `picks/{entry}/{gw}`, `transfers/{entry}`,
/// `live/{gw}`. Missing bodies answer `UpstreamNotFound`; paths marked with
/// `fail` answer `UpstreamUnavailable`.
#[derive(Default)]
pub struct StubUpstream {
    bodies: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl StubUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, path: &str, body: Value) {
        self.set_raw(path, &body.to_string());
    }

    pub fn set_raw(&self, path: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(path.to_string(), body.to_string());
    }

    pub fn fail(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn heal(&self, path: &str) {
        self.failing.lock().unwrap().remove(path);
    }

    /// Number of upstream calls made for one resource kind.
    pub fn calls(&self, kind: &str) -> usize {
        self.calls.lock().unwrap().get(kind).copied().unwrap_or(0)
    }

    fn body(&self, kind: &'static str, path: String) -> Result<String> {
        *self.calls.lock().unwrap().entry(kind).or_default() += 1;
        if self.failing.lock().unwrap().contains(&path) {
            return Err(LeagueError::UpstreamUnavailable(format!("{path} unavailable")));
        }
        self.bodies
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .ok_or(LeagueError::UpstreamNotFound { resource: path })
    }
}

#[async_trait]
impl Upstream for StubUpstream {
    async fn bootstrap(&self) -> Result<Bootstrap> {
        let body = self.body("bootstrap", "bootstrap".to_string())?;
        schema::parse_bootstrap(&body)
    }

    async fn league_standings(&self, league_id: LeagueId) -> Result<LeagueStandings> {
        let body = self.body("standings", format!("league/{league_id}"))?;
        let page = schema::parse_standings_page(&body)?;
        schema::merge_standings_pages(vec![page])
    }

    async fn picks(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Squad> {
        let body = self.body("picks", format!("picks/{entry_id}/{gameweek}"))?;
        schema::parse_picks(entry_id, gameweek, &body)
    }

    async fn transfers(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Vec<TransferEvent>> {
        let body = self.body("transfers", format!("transfers/{entry_id}"))?;
        schema::parse_transfers(entry_id, gameweek, &body)
    }

    async fn live_points(&self, gameweek: Gameweek) -> Result<LivePoints> {
        let body = self.body("live", format!("live/{gameweek}"))?;
        schema::parse_live(gameweek, &body)
    }
}

// ===========================================================================
// Payload builders
// ===========================================================================

/// 38 gameweeks, `completed` of them finished and checked. The one after is
/// current. Players 1..=40; player `p` plays for club `(p - 1) % 5 + 1`.
pub fn bootstrap_json(completed: Gameweek) -> Value {
    let events: Vec<Value> = (1..=38)
        .map(|id: Gameweek| {
            json!({
                "id": id,
                "name": format!("Gameweek {id}"),
                "deadline_time": format!("2024-08-{:02}T17:30:00Z", (id % 28) + 1),
                "finished": id <= completed,
                "data_checked": id <= completed,
                "is_current": completed > 0 && id == completed + 1,
                "is_next": if completed == 0 { id == 1 } else { id == completed + 2 },
                "average_entry_score": 48,
                "highest_score": if id <= completed { Value::from(101) } else { Value::Null },
            })
        })
        .collect();
    let clubs = ["Arsenal", "Brentford", "Chelsea", "Fulham", "Liverpool"];
    let teams: Vec<Value> = clubs
        .iter()
        .enumerate()
        .map(|(idx, name)| json!({"id": idx + 1, "name": name, "short_name": &name[..3].to_uppercase()}))
        .collect();
    let elements: Vec<Value> = (1..=40u32)
        .map(|id| {
            json!({
                "id": id,
                "web_name": format!("Player{id}"),
                "team": (id - 1) % 5 + 1,
                "element_type": (id - 1) % 4 + 1,
            })
        })
        .collect();
    json!({
        "events": events,
        "teams": teams,
        "elements": elements,
        "element_types": [
            {"id": 1, "singular_name_short": "GKP"},
            {"id": 2, "singular_name_short": "DEF"},
            {"id": 3, "singular_name_short": "MID"},
            {"id": 4, "singular_name_short": "FWD"},
        ],
    })
}

/// `(entry, team name, manager, rank, total)` rows.
pub fn standings_json(name: &str, rows: &[(EntryId, &str, &str, u32, i32)]) -> Value {
    let results: Vec<Value> = rows
        .iter()
        .map(|(entry, team, manager, rank, total)| {
            json!({
                "entry": entry,
                "entry_name": team,
                "player_name": manager,
                "rank": rank,
                "last_rank": rank,
                "total": total,
                "event_total": 0,
            })
        })
        .collect();
    json!({
        "league": {"id": LEAGUE_ID, "name": name, "created": "2024-07-10T09:00:00Z", "start_event": 1},
        "standings": {"has_next": false, "results": results},
        "new_entries": {"has_next": false, "results": []},
    })
}

/// Picks in slot order; slots 12..=15 are the bench.
pub fn picks_json(players: &[u32], captain: u32, vice: u32, points: i32, cost: i32) -> Value {
    let picks: Vec<Value> = players
        .iter()
        .enumerate()
        .map(|(idx, &element)| {
            let position = idx + 1;
            let multiplier = match (position > 11, element == captain) {
                (true, _) => 0,
                (false, true) => 2,
                (false, false) => 1,
            };
            json!({
                "element": element,
                "position": position,
                "multiplier": multiplier,
                "is_captain": element == captain,
                "is_vice_captain": element == vice,
            })
        })
        .collect();
    json!({
        "active_chip": null,
        "entry_history": {
            "points": points,
            "total_points": 0,
            "event_transfers": cost / 4,
            "event_transfers_cost": cost,
            "points_on_bench": 0,
            "bank": 3,
            "value": 1002,
        },
        "picks": picks,
    })
}

/// `(in, out, gameweek)` events.
pub fn transfers_json(events: &[(u32, u32, Gameweek)]) -> Value {
    Value::Array(
        events
            .iter()
            .map(|(element_in, element_out, event)| {
                json!({"element_in": element_in, "element_out": element_out, "event": event})
            })
            .collect(),
    )
}

/// Every player scores `default` except the listed overrides.
pub fn live_json(overrides: &[(u32, i32)], default: i32) -> Value {
    let elements: Vec<Value> = (1..=40u32)
        .map(|id| {
            let points = overrides
                .iter()
                .find(|(pid, _)| *pid == id)
                .map(|(_, p)| *p)
                .unwrap_or(default);
            json!({"id": id, "stats": {"total_points": points, "minutes": 90, "goals_scored": 0, "assists": 0, "bonus": 0}})
        })
        .collect();
    json!({"elements": elements})
}

pub fn squad(start: u32) -> Vec<u32> {
    (start..start + 15).collect()
}

// ===========================================================================
// Scenario
// ===========================================================================

/// Three-team league, gameweeks 1..=4 finished, 5 live.
///
/// Gameweek 4: Team A and Team B both own player 1 and Team A captains it;
/// Team C does not own it. Team C captains player 40.
pub fn three_team_league() -> Arc<StubUpstream> {
    let stub = Arc::new(StubUpstream::new());
    stub.set("bootstrap", bootstrap_json(4));
    stub.set(
        &format!("league/{LEAGUE_ID}"),
        standings_json(
            "Sunday League",
            &[
                (11, "Team A", "Alice Archer", 2, 250),
                (22, "Team B", "Bob Baker", 1, 260),
                (33, "Team C", "Cara Cole", 3, 240),
            ],
        ),
    );

    let team_a = squad(1);
    let mut team_b = squad(16);
    team_b[0] = 1;
    let team_c: Vec<u32> = (26..=40).rev().collect();

    stub.set("picks/11/4", picks_json(&team_a, 1, 2, 70, 4));
    stub.set("picks/22/4", picks_json(&team_b, 17, 1, 62, 0));
    stub.set("picks/33/4", picks_json(&team_c, 40, 39, 66, 0));

    stub.set("picks/11/5", picks_json(&team_a, 1, 2, 20, 0));
    stub.set("picks/22/5", picks_json(&team_b, 17, 1, 18, 0));
    stub.set("picks/33/5", picks_json(&team_c, 40, 39, 15, 0));
    stub.set("live/5", live_json(&[(1, 6), (17, 9), (40, 2)], 2));

    stub.set("transfers/11", transfers_json(&[(2, 30, 4), (3, 31, 3)]));
    stub.set("transfers/22", transfers_json(&[(17, 30, 4)]));
    stub.set("transfers/33", transfers_json(&[]));
    stub
}

pub fn app_for(stub: Arc<StubUpstream>) -> App {
    App::with_upstream(Config::default(), stub)
}

pub async fn loaded_app(stub: Arc<StubUpstream>) -> App {
    let app = app_for(stub);
    app.set_league(LEAGUE_ID).await.expect("league loads");
    app
}
