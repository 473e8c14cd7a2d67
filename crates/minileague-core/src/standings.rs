// Standings engine: season and gameweek tables plus the gameweek digests
// built on them.
//
// Both tables rank independently. Before any gameweek has finished they
// return the roster listing instead of a scored table.

use std::cmp::Reverse;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::league::{LeagueContext, RosterEntry};
use crate::model::{EntryId, Gameweek, PlayerId, Team};
use crate::source::{Coverage, DataSource};
use crate::stats::round_to;

/// Rows returned in each of the climbers and fallers lists.
pub const MOVERS_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Result shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreSeasonView {
    pub is_pre_season: bool,
    pub league_name: String,
    pub total_teams: usize,
    pub start_event: Gameweek,
    pub teams: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonRow {
    pub rank: u32,
    pub entry_id: EntryId,
    pub team_name: String,
    pub manager_name: String,
    pub total_points: i32,
    pub gameweek_points: i32,
    /// League rank as last published upstream.
    pub previous_rank: u32,
    pub rank_change: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonTableView {
    pub league_name: String,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    /// Totals include live scores of the unfinished current gameweek.
    pub is_live: bool,
    pub table: Vec<SeasonRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameweekRow {
    pub rank: u32,
    pub entry_id: EntryId,
    pub team_name: String,
    pub manager_name: String,
    pub total_points: i32,
    pub overall_rank: u32,
    pub gameweek_points: i32,
    pub gameweek_transfers: u32,
    pub gameweek_transfer_cost: i32,
    pub gameweek_net_points: i32,
    /// Overall rank minus gameweek rank; positive means the team beat its
    /// league position this week.
    pub rank_movement: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameweekTableView {
    pub league_name: String,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub is_live: bool,
    pub table: Vec<GameweekRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SeasonTable {
    PreSeason(PreSeasonView),
    Table(SeasonTableView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GameweekTable {
    PreSeason(PreSeasonView),
    Table(GameweekTableView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorerLine {
    pub team_name: String,
    pub manager_name: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferLine {
    pub team_name: String,
    pub manager_name: String,
    pub transfers: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferStats {
    pub teams_with_transfers: usize,
    pub total_transfer_cost: i32,
    pub percentage_with_transfers: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PointsDistribution {
    pub max_points: i32,
    pub min_points: i32,
    pub points_range: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameweekSummary {
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub average_points: f64,
    pub average_net_points: f64,
    pub average_transfers: f64,
    pub highest_scorer: Option<ScorerLine>,
    pub lowest_scorer: Option<ScorerLine>,
    pub most_transfers: Option<TransferLine>,
    pub transfer_stats: TransferStats,
    pub points_distribution: PointsDistribution,
    #[serde(flatten)]
    pub coverage: Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerPerformance {
    pub player_id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: String,
    pub points: i32,
    pub goals: u32,
    pub assists: u32,
    pub bonus: u32,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPerformers {
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub top_teams: Vec<GameweekRow>,
    pub top_players: Vec<PlayerPerformance>,
    pub biggest_climbers: Vec<GameweekRow>,
    pub biggest_fallers: Vec<GameweekRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

// ---------------------------------------------------------------------------
// StandingsEngine
// ---------------------------------------------------------------------------

pub struct StandingsEngine {
    source: Arc<DataSource>,
}

impl StandingsEngine {
    pub fn new(source: Arc<DataSource>) -> Self {
        Self { source }
    }

    pub fn pre_season(&self, ctx: &LeagueContext) -> PreSeasonView {
        let teams = ctx.roster();
        PreSeasonView {
            is_pre_season: true,
            league_name: ctx.league_name().to_string(),
            total_teams: teams.len(),
            start_event: ctx.league.start_event,
            teams,
        }
    }

    /// Cumulative table, ranked by total points then entry id.
    ///
    /// Totals and the season position are read from the cached standings and
    /// bootstrap rather than `ctx`, so they follow those resources' TTLs.
    /// While a gameweek is live only teams whose picks were fetched are
    /// ranked; the rest are listed in `failed_teams`.
    pub async fn season_table(&self, ctx: &LeagueContext) -> Result<SeasonTable> {
        let bootstrap = self.source.bootstrap().await?;
        let standings = self.source.league(ctx.league_id()).await?;
        let ctx = LeagueContext::resolve(&standings, &bootstrap);
        if ctx.is_pre_season {
            return Ok(SeasonTable::PreSeason(self.pre_season(&ctx)));
        }

        let gameweek = ctx.current_gameweek;
        let live = self.source.live_scores(&bootstrap, gameweek).await;

        let (mut table, coverage): (Vec<SeasonRow>, Coverage) = match live.as_deref() {
            Some(live) => {
                let fanout = self
                    .source
                    .squads(&ctx.teams, gameweek, bootstrap.phase(gameweek))
                    .await;
                let rows = fanout
                    .ok
                    .iter()
                    .map(|(team, squad)| {
                        let gross = live.gross_for(squad);
                        season_row(team, team.total_points - squad.points + gross, gross)
                    })
                    .collect();
                (rows, fanout.coverage())
            }
            // Without live scores the upstream totals are already current.
            None => (
                ctx.teams
                    .iter()
                    .map(|team| season_row(team, team.total_points, team.event_total))
                    .collect(),
                Coverage {
                    fetched_teams: ctx.total_teams(),
                    failed_teams: vec![],
                },
            ),
        };

        table.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then(a.entry_id.cmp(&b.entry_id))
        });
        for (idx, row) in table.iter_mut().enumerate() {
            row.rank = idx as u32 + 1;
            if row.previous_rank > 0 {
                row.rank_change = i64::from(row.previous_rank) - i64::from(row.rank);
            }
        }

        info!(league_id = ctx.league_id(), gameweek, live = live.is_some(), "season table built");
        Ok(SeasonTable::Table(SeasonTableView {
            league_name: ctx.league_name().to_string(),
            gameweek,
            total_teams: ctx.total_teams(),
            is_live: live.is_some(),
            table,
            coverage,
        }))
    }

    /// Single-gameweek table, ranked by net points then entry id.
    pub async fn gameweek_table(
        &self,
        ctx: &LeagueContext,
        gameweek: Gameweek,
    ) -> Result<GameweekTable> {
        ctx.validate_gameweek(gameweek)?;
        if ctx.is_pre_season {
            return Ok(GameweekTable::PreSeason(self.pre_season(ctx)));
        }
        Ok(GameweekTable::Table(self.scored_gameweek(ctx, gameweek).await?))
    }

    async fn scored_gameweek(
        &self,
        ctx: &LeagueContext,
        gameweek: Gameweek,
    ) -> Result<GameweekTableView> {
        let bootstrap = self.source.bootstrap().await?;
        let squads = self
            .source
            .squads(&ctx.teams, gameweek, bootstrap.phase(gameweek))
            .await;
        let live = self.source.live_scores(&bootstrap, gameweek).await;

        let mut table: Vec<GameweekRow> = squads
            .ok
            .iter()
            .map(|(team, squad)| {
                let points = squad.gross_points(live.as_deref());
                GameweekRow {
                    rank: 0,
                    entry_id: team.entry_id,
                    team_name: team.team_name.clone(),
                    manager_name: team.manager_name.clone(),
                    total_points: team.total_points,
                    overall_rank: team.rank,
                    gameweek_points: points,
                    gameweek_transfers: squad.transfers_made,
                    gameweek_transfer_cost: squad.transfer_cost,
                    gameweek_net_points: points - squad.transfer_cost,
                    rank_movement: 0,
                }
            })
            .collect();

        table.sort_by(|a, b| {
            b.gameweek_net_points
                .cmp(&a.gameweek_net_points)
                .then(a.entry_id.cmp(&b.entry_id))
        });
        for (idx, row) in table.iter_mut().enumerate() {
            row.rank = idx as u32 + 1;
            row.rank_movement = i64::from(row.overall_rank) - i64::from(row.rank);
        }

        Ok(GameweekTableView {
            league_name: ctx.league_name().to_string(),
            gameweek,
            total_teams: ctx.total_teams(),
            is_live: live.is_some(),
            table,
            coverage: squads.coverage(),
        })
    }

    pub async fn gameweek_summary(
        &self,
        ctx: &LeagueContext,
        gameweek: Gameweek,
    ) -> Result<GameweekSummary> {
        ctx.validate_gameweek(gameweek)?;
        if ctx.is_pre_season {
            return Ok(summarize(gameweek, &[], Coverage::default()));
        }
        let view = self.scored_gameweek(ctx, gameweek).await?;
        Ok(summarize(gameweek, &view.table, view.coverage))
    }

    pub async fn top_performers(
        &self,
        ctx: &LeagueContext,
        gameweek: Gameweek,
        limit: usize,
    ) -> Result<TopPerformers> {
        ctx.validate_gameweek(gameweek)?;
        if ctx.is_pre_season {
            return Ok(TopPerformers {
                gameweek,
                total_teams: 0,
                top_teams: vec![],
                top_players: vec![],
                biggest_climbers: vec![],
                biggest_fallers: vec![],
                coverage: Coverage::default(),
            });
        }

        let view = self.scored_gameweek(ctx, gameweek).await?;
        let top_players = self.top_players(gameweek, limit).await?;

        let mut climbers: Vec<GameweekRow> = view
            .table
            .iter()
            .filter(|r| r.rank_movement > 0)
            .cloned()
            .collect();
        climbers.sort_by_key(|r| (Reverse(r.rank_movement), r.entry_id));
        climbers.truncate(MOVERS_LIMIT);

        let mut fallers: Vec<GameweekRow> = view
            .table
            .iter()
            .filter(|r| r.rank_movement < 0)
            .cloned()
            .collect();
        fallers.sort_by_key(|r| (r.rank_movement, r.entry_id));
        fallers.truncate(MOVERS_LIMIT);

        Ok(TopPerformers {
            gameweek,
            total_teams: view.table.len(),
            top_teams: view.table.iter().take(limit).cloned().collect(),
            top_players,
            biggest_climbers: climbers,
            biggest_fallers: fallers,
            coverage: view.coverage,
        })
    }

    /// Best individual scores of the gameweek. Empty when live scores are
    /// unavailable.
    async fn top_players(&self, gameweek: Gameweek, limit: usize) -> Result<Vec<PlayerPerformance>> {
        let bootstrap = self.source.bootstrap().await?;
        let live = match self.source.live(gameweek, bootstrap.phase(gameweek)).await {
            Ok(live) => live,
            Err(e) => {
                warn!(gameweek, error = %e, "no live scores for top players");
                return Ok(vec![]);
            }
        };

        let mut ranked: Vec<(PlayerId, i32)> = live
            .players
            .iter()
            .map(|(id, stats)| (*id, stats.total_points))
            .collect();
        ranked.sort_by_key(|(id, points)| (Reverse(*points), *id));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(player_id, _)| {
                let stats = live.players.get(&player_id).copied().unwrap_or_default();
                let player = bootstrap.players.get(&player_id);
                PlayerPerformance {
                    player_id,
                    name: bootstrap.player_name(player_id),
                    team: player
                        .map(|p| bootstrap.club_name(p.club_id))
                        .unwrap_or_default(),
                    position: player
                        .map(|p| bootstrap.position_name(p.position_id))
                        .unwrap_or_else(|| bootstrap.position_name(0)),
                    points: stats.total_points,
                    goals: stats.goals_scored,
                    assists: stats.assists,
                    bonus: stats.bonus,
                    minutes: stats.minutes,
                }
            })
            .collect())
    }
}

/// Digest of a ranked gameweek table. An empty table gives zeroed figures
/// and no named teams.
fn season_row(team: &Team, total_points: i32, gameweek_points: i32) -> SeasonRow {
    SeasonRow {
        rank: 0,
        entry_id: team.entry_id,
        team_name: team.team_name.clone(),
        manager_name: team.manager_name.clone(),
        total_points,
        gameweek_points,
        previous_rank: team.rank,
        rank_change: 0,
    }
}

pub fn summarize(gameweek: Gameweek, table: &[GameweekRow], coverage: Coverage) -> GameweekSummary {
    let n = table.len();
    let mean = |sum: i64| if n == 0 { 0.0 } else { round_to(sum as f64 / n as f64, 1) };

    let scorer = |row: &GameweekRow| ScorerLine {
        team_name: row.team_name.clone(),
        manager_name: row.manager_name.clone(),
        points: row.gameweek_points,
    };

    let highest = table.iter().min_by_key(|r| Reverse(r.gameweek_points));
    let lowest = table.iter().min_by_key(|r| r.gameweek_points);
    let busiest = table.iter().min_by_key(|r| Reverse(r.gameweek_transfers));

    let teams_with_transfers = table.iter().filter(|r| r.gameweek_transfers > 0).count();
    let max_points = highest.map(|r| r.gameweek_points).unwrap_or(0);
    let min_points = lowest.map(|r| r.gameweek_points).unwrap_or(0);

    GameweekSummary {
        gameweek,
        total_teams: n,
        average_points: mean(table.iter().map(|r| i64::from(r.gameweek_points)).sum()),
        average_net_points: mean(table.iter().map(|r| i64::from(r.gameweek_net_points)).sum()),
        average_transfers: mean(table.iter().map(|r| i64::from(r.gameweek_transfers)).sum()),
        highest_scorer: highest.map(scorer),
        lowest_scorer: lowest.map(scorer),
        most_transfers: busiest.map(|r| TransferLine {
            team_name: r.team_name.clone(),
            manager_name: r.manager_name.clone(),
            transfers: r.gameweek_transfers,
        }),
        transfer_stats: TransferStats {
            teams_with_transfers,
            total_transfer_cost: table.iter().map(|r| r.gameweek_transfer_cost).sum(),
            percentage_with_transfers: if n == 0 {
                0.0
            } else {
                round_to(teams_with_transfers as f64 * 100.0 / n as f64, 1)
            },
        },
        points_distribution: PointsDistribution {
            max_points,
            min_points,
            points_range: max_points - min_points,
        },
        coverage,
    }
}
