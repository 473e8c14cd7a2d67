// Upstream API boundary: the fetch contract and its HTTP implementation.

pub mod client;
pub mod schema;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Bootstrap, EntryId, Gameweek, LeagueId, LeagueStandings, LivePoints, Squad, TransferEvent,
};

pub use client::FplClient;

/// The upstream fetch operations, each returning a normalized record.
///
/// Implementations do not retry and do not touch the cache. A failed call
/// surfaces as `UpstreamUnavailable`, `UpstreamNotFound` or
/// `UpstreamMalformed`.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Season-global players, clubs and gameweeks.
    async fn bootstrap(&self) -> Result<Bootstrap>;

    /// League header and member list.
    async fn league_standings(&self, league_id: LeagueId) -> Result<LeagueStandings>;

    /// One team's picks for one gameweek.
    async fn picks(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Squad>;

    /// One team's transfers made for one gameweek.
    async fn transfers(&self, entry_id: EntryId, gameweek: Gameweek) -> Result<Vec<TransferEvent>>;

    /// Per-player scores for one gameweek.
    async fn live_points(&self, gameweek: Gameweek) -> Result<LivePoints>;
}
