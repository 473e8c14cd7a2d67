// Effective ownership: multiplier-weighted share of the league holding each player.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{percentage, StatKind};
use crate::model::{Bootstrap, Gameweek, PlayerId, Squad};
use crate::source::{Coverage, Fanout};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipRow {
    pub player_id: PlayerId,
    pub player: String,
    /// Share of fetched teams with the player anywhere in their 15.
    pub ownership: f64,
    /// Sum of multipliers over fetched teams, as a percentage of the team
    /// count. A player captained by everyone reads 200.
    pub effective_ownership: f64,
    pub raw_ownership: u32,
    pub teams: Vec<String>,
    pub captains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipView {
    pub title: &'static str,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub data: Vec<OwnershipRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

#[derive(Default)]
struct Tally {
    weight: u32,
    teams: Vec<String>,
    captains: Vec<String>,
}

/// Sorted by effective ownership descending, then player id. `top_k` keeps
/// only the first rows.
pub fn compute(
    bootstrap: &Bootstrap,
    gameweek: Gameweek,
    total_teams: usize,
    squads: &Fanout<Squad>,
    top_k: Option<usize>,
) -> OwnershipView {
    let mut tallies: BTreeMap<PlayerId, Tally> = BTreeMap::new();

    for (team, squad) in &squads.ok {
        for pick in &squad.picks {
            let tally = tallies.entry(pick.player_id).or_default();
            tally.weight += u32::from(pick.multiplier);
            tally.teams.push(team.team_name.clone());
            if pick.is_captain {
                tally.captains.push(team.team_name.clone());
            }
        }
    }

    let fetched = squads.ok.len();
    let mut data: Vec<OwnershipRow> = tallies
        .into_iter()
        .map(|(player_id, tally)| OwnershipRow {
            player_id,
            player: bootstrap.player_name(player_id),
            ownership: percentage(tally.teams.len() as f64, fetched),
            effective_ownership: percentage(f64::from(tally.weight), fetched),
            raw_ownership: tally.weight,
            teams: tally.teams,
            captains: tally.captains,
        })
        .collect();

    // BTreeMap iteration already orders by player id; a stable sort keeps it
    // as the tie-break.
    data.sort_by(|a, b| b.raw_ownership.cmp(&a.raw_ownership));
    if let Some(k) = top_k {
        data.truncate(k);
    }

    OwnershipView {
        title: StatKind::Ownership.title(),
        gameweek,
        total_teams,
        data,
        coverage: squads.coverage(),
    }
}
