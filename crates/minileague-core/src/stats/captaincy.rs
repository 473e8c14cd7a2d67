// Captaincy: which player each team captained.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{percentage, StatKind};
use crate::model::{Bootstrap, Gameweek, PlayerId, Squad};
use crate::source::{Coverage, Fanout};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptaincyRow {
    pub player_id: PlayerId,
    pub player: String,
    pub count: u32,
    pub percentage: f64,
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptaincyView {
    pub title: &'static str,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub data: Vec<CaptaincyRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

pub fn compute(
    bootstrap: &Bootstrap,
    gameweek: Gameweek,
    total_teams: usize,
    squads: &Fanout<Squad>,
) -> CaptaincyView {
    let mut by_captain: BTreeMap<PlayerId, Vec<String>> = BTreeMap::new();
    for (team, squad) in &squads.ok {
        if let Some(captain) = squad.captain() {
            by_captain
                .entry(captain.player_id)
                .or_default()
                .push(team.team_name.clone());
        }
    }

    let fetched = squads.ok.len();
    let mut data: Vec<CaptaincyRow> = by_captain
        .into_iter()
        .map(|(player_id, teams)| CaptaincyRow {
            player_id,
            player: bootstrap.player_name(player_id),
            count: teams.len() as u32,
            percentage: percentage(teams.len() as f64, fetched),
            teams,
        })
        .collect();
    data.sort_by(|a, b| b.count.cmp(&a.count).then(a.player_id.cmp(&b.player_id)));

    CaptaincyView {
        title: StatKind::Captaincy.title(),
        gameweek,
        total_teams,
        data,
        coverage: squads.coverage(),
    }
}
