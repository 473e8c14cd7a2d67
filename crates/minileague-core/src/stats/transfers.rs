// Transfers: players moved in and out across the league for a gameweek.

use std::collections::BTreeMap;

use serde::Serialize;

use super::StatKind;
use crate::model::{Bootstrap, Gameweek, PlayerId, TransferEvent};
use crate::source::{Coverage, Fanout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRow {
    pub player_id: PlayerId,
    pub player: String,
    pub count: u32,
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransfersView {
    pub title: &'static str,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub transfers_in: Vec<TransferRow>,
    pub transfers_out: Vec<TransferRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

pub fn compute(
    bootstrap: &Bootstrap,
    gameweek: Gameweek,
    total_teams: usize,
    lists: &Fanout<Vec<TransferEvent>>,
) -> TransfersView {
    let mut ins: BTreeMap<PlayerId, Vec<String>> = BTreeMap::new();
    let mut outs: BTreeMap<PlayerId, Vec<String>> = BTreeMap::new();

    for (team, events) in &lists.ok {
        for event in events.iter().filter(|e| e.gameweek == gameweek) {
            ins.entry(event.player_in)
                .or_default()
                .push(team.team_name.clone());
            outs.entry(event.player_out)
                .or_default()
                .push(team.team_name.clone());
        }
    }

    TransfersView {
        title: StatKind::Transfers.title(),
        gameweek,
        total_teams,
        transfers_in: rows(bootstrap, ins),
        transfers_out: rows(bootstrap, outs),
        coverage: lists.coverage(),
    }
}

fn rows(bootstrap: &Bootstrap, grouped: BTreeMap<PlayerId, Vec<String>>) -> Vec<TransferRow> {
    let mut rows: Vec<TransferRow> = grouped
        .into_iter()
        .map(|(player_id, teams)| TransferRow {
            player_id,
            player: bootstrap.player_name(player_id),
            count: teams.len() as u32,
            teams,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.player_id.cmp(&b.player_id)));
    rows
}
