// Manager rankings: gameweek net points, highest first.

use serde::Serialize;

use super::StatKind;
use crate::model::{EntryId, Gameweek, LivePoints, Squad};
use crate::source::{Coverage, Fanout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingRow {
    pub rank: u32,
    pub entry_id: EntryId,
    pub manager: String,
    pub points: i32,
    pub net_points: i32,
    pub transfer_cost: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingsView {
    pub title: &'static str,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub data: Vec<RankingRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

/// Ranks by net points descending, ties by entry id ascending. `live`
/// replaces reported points for an unfinished gameweek.
pub fn compute(
    gameweek: Gameweek,
    total_teams: usize,
    squads: &Fanout<Squad>,
    live: Option<&LivePoints>,
) -> RankingsView {
    let mut data: Vec<RankingRow> = squads
        .ok
        .iter()
        .map(|(team, squad)| {
            let points = squad.gross_points(live);
            RankingRow {
                rank: 0,
                entry_id: team.entry_id,
                manager: team.team_name.clone(),
                points,
                net_points: points - squad.transfer_cost,
                transfer_cost: squad.transfer_cost,
            }
        })
        .collect();

    data.sort_by(|a, b| {
        b.net_points
            .cmp(&a.net_points)
            .then(a.entry_id.cmp(&b.entry_id))
    });
    for (idx, row) in data.iter_mut().enumerate() {
        row.rank = idx as u32 + 1;
    }

    RankingsView {
        title: StatKind::Rankings.title(),
        gameweek,
        total_teams,
        data,
        coverage: squads.coverage(),
    }
}
