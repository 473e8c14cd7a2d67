// Club representation: how many squad slots league-wide each real club fills.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{percentage, StatKind};
use crate::model::{Bootstrap, ClubId, Gameweek, Squad};
use crate::source::{Coverage, Fanout};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubRow {
    pub club_id: ClubId,
    pub team: String,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepresentationView {
    pub title: &'static str,
    pub gameweek: Gameweek,
    pub total_teams: usize,
    /// Slots counted, i.e. picks whose player is known to bootstrap.
    pub total_players: usize,
    pub data: Vec<ClubRow>,
    #[serde(flatten)]
    pub coverage: Coverage,
}

pub fn compute(
    bootstrap: &Bootstrap,
    gameweek: Gameweek,
    total_teams: usize,
    squads: &Fanout<Squad>,
) -> RepresentationView {
    let mut counts: BTreeMap<ClubId, u32> = BTreeMap::new();
    let mut total_players = 0usize;

    for (_, squad) in &squads.ok {
        for pick in &squad.picks {
            if let Some(club) = bootstrap.club_of(pick.player_id) {
                *counts.entry(club.id).or_default() += 1;
                total_players += 1;
            }
        }
    }

    let mut data: Vec<ClubRow> = counts
        .into_iter()
        .map(|(club_id, count)| ClubRow {
            club_id,
            team: bootstrap.club_name(club_id),
            count,
            percentage: percentage(f64::from(count), total_players),
        })
        .collect();
    data.sort_by(|a, b| b.count.cmp(&a.count).then(a.club_id.cmp(&b.club_id)));

    RepresentationView {
        title: StatKind::Representation.title(),
        gameweek,
        total_teams,
        total_players,
        data,
        coverage: squads.coverage(),
    }
}
