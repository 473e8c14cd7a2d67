// Per-team gameweek breakdown: each pick with its live score.

use serde::Serialize;

use crate::error::Result;
use crate::league::LeagueContext;
use crate::model::{Bootstrap, EntryId, Gameweek, LivePoints, PlayerId, Squad, Team};
use crate::source::DataSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickBreakdown {
    pub player_id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: String,
    pub position_in_squad: u8,
    pub multiplier: u8,
    pub live_points: i32,
    /// `live_points * multiplier`.
    pub total_points: i32,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub minutes: u32,
    pub goals: u32,
    pub assists: u32,
    pub bonus: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamBreakdown {
    pub entry_id: EntryId,
    pub team_name: String,
    pub manager_name: String,
    pub gameweek: Gameweek,
    pub active_chip: Option<String>,
    pub players: Vec<PickBreakdown>,
    /// Sum over starting slots.
    pub total_live_points: i32,
    pub captain_points: i32,
    /// The vice-captain's own score, unmultiplied.
    pub vice_captain_points: i32,
    pub transfer_cost: i32,
    pub net_points: i32,
}

/// Fetch one member's picks and the gameweek's live scores and break the
/// squad down slot by slot.
pub async fn team_breakdown(
    source: &DataSource,
    ctx: &LeagueContext,
    entry_id: EntryId,
    gameweek: Gameweek,
) -> Result<TeamBreakdown> {
    ctx.validate_gameweek(gameweek)?;
    let team = ctx.team(entry_id)?;
    let bootstrap = source.bootstrap().await?;
    let phase = bootstrap.phase(gameweek);
    let squad = source.squad(entry_id, gameweek, phase).await?;
    let live = source.live(gameweek, phase).await?;
    Ok(build(&bootstrap, team, &squad, &live))
}

pub fn build(bootstrap: &Bootstrap, team: &Team, squad: &Squad, live: &LivePoints) -> TeamBreakdown {
    let mut breakdown = TeamBreakdown {
        entry_id: team.entry_id,
        team_name: team.team_name.clone(),
        manager_name: team.manager_name.clone(),
        gameweek: squad.gameweek,
        active_chip: squad.active_chip.clone(),
        players: Vec::with_capacity(squad.picks.len()),
        total_live_points: 0,
        captain_points: 0,
        vice_captain_points: 0,
        transfer_cost: squad.transfer_cost,
        net_points: 0,
    };

    for pick in &squad.picks {
        let stats = live.players.get(&pick.player_id).copied().unwrap_or_default();
        let player = bootstrap.players.get(&pick.player_id);
        let multiplied = stats.total_points * i32::from(pick.multiplier);

        if pick.is_starting() {
            breakdown.total_live_points += multiplied;
            if pick.is_captain {
                breakdown.captain_points = multiplied;
            } else if pick.is_vice_captain {
                breakdown.vice_captain_points = stats.total_points;
            }
        }

        breakdown.players.push(PickBreakdown {
            player_id: pick.player_id,
            name: bootstrap.player_name(pick.player_id),
            team: player
                .map(|p| bootstrap.club_name(p.club_id))
                .unwrap_or_default(),
            position: bootstrap.position_name(player.map(|p| p.position_id).unwrap_or(0)),
            position_in_squad: pick.position,
            multiplier: pick.multiplier,
            live_points: stats.total_points,
            total_points: multiplied,
            is_captain: pick.is_captain,
            is_vice_captain: pick.is_vice_captain,
            minutes: stats.minutes,
            goals: stats.goals_scored,
            assists: stats.assists,
            bonus: stats.bonus,
        });
    }

    breakdown.net_points = breakdown.total_live_points - breakdown.transfer_cost;
    breakdown
}
