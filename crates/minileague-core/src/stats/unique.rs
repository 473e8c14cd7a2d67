// Unique picks: players exactly one team in the league owns.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::StatKind;
use crate::model::{Bootstrap, EntryId, Gameweek, PlayerId, Squad};
use crate::source::{Coverage, Fanout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueRow {
    pub entry_id: EntryId,
    pub manager: String,
    pub count: usize,
    pub unique_players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueView {
    pub title: &'static str,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    pub data: Vec<UniqueRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

pub fn compute(
    bootstrap: &Bootstrap,
    gameweek: Gameweek,
    total_teams: usize,
    squads: &Fanout<Squad>,
) -> UniqueView {
    // player -> indexes of owning teams in `squads.ok`
    let mut owners: BTreeMap<PlayerId, Vec<usize>> = BTreeMap::new();
    for (idx, (_, squad)) in squads.ok.iter().enumerate() {
        for pick in &squad.picks {
            let teams = owners.entry(pick.player_id).or_default();
            if teams.last() != Some(&idx) {
                teams.push(idx);
            }
        }
    }

    let mut by_team: HashMap<usize, Vec<String>> = HashMap::new();
    for (player_id, teams) in owners {
        if let [only] = teams.as_slice() {
            by_team
                .entry(*only)
                .or_default()
                .push(bootstrap.player_name(player_id));
        }
    }

    let mut data: Vec<UniqueRow> = by_team
        .into_iter()
        .map(|(idx, unique_players)| {
            let team = &squads.ok[idx].0;
            UniqueRow {
                entry_id: team.entry_id,
                manager: team.team_name.clone(),
                count: unique_players.len(),
                unique_players,
            }
        })
        .collect();
    data.sort_by(|a, b| b.count.cmp(&a.count).then(a.entry_id.cmp(&b.entry_id)));

    UniqueView {
        title: StatKind::Unique.title(),
        gameweek,
        total_teams,
        data,
        coverage: squads.coverage(),
    }
}
