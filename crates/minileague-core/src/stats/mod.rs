// Statistics engine: league-wide aggregates over every member's gameweek data.
//
// Each view lives in its own module as a pure `compute` function over the
// fetched squads (or transfers). `StatsEngine` does the fan-out and hands the
// successes to those functions; teams whose fetch failed are reported in the
// view's coverage instead of failing the query.

pub mod captaincy;
pub mod ownership;
pub mod rankings;
pub mod representation;
pub mod transfers;
pub mod unique;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::StatsConfig;
use crate::error::{LeagueError, Result};
use crate::league::LeagueContext;
use crate::model::{Bootstrap, Gameweek, Squad};
use crate::source::{DataSource, Fanout};

pub use captaincy::CaptaincyView;
pub use ownership::OwnershipView;
pub use rankings::RankingsView;
pub use representation::RepresentationView;
pub use transfers::TransfersView;
pub use unique::UniqueView;

// ---------------------------------------------------------------------------
// StatKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Ownership,
    Captaincy,
    Transfers,
    Rankings,
    Unique,
    Representation,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::Ownership,
        StatKind::Captaincy,
        StatKind::Transfers,
        StatKind::Rankings,
        StatKind::Unique,
        StatKind::Representation,
    ];

    /// Parse a stat id as used on the command line. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ownership" => Ok(StatKind::Ownership),
            "captaincy" => Ok(StatKind::Captaincy),
            "transfers" => Ok(StatKind::Transfers),
            "rankings" => Ok(StatKind::Rankings),
            "unique" => Ok(StatKind::Unique),
            "representation" => Ok(StatKind::Representation),
            _ => Err(LeagueError::UnknownStat(s.to_string())),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            StatKind::Ownership => "ownership",
            StatKind::Captaincy => "captaincy",
            StatKind::Transfers => "transfers",
            StatKind::Rankings => "rankings",
            StatKind::Unique => "unique",
            StatKind::Representation => "representation",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StatKind::Ownership => "Effective Ownership",
            StatKind::Captaincy => "Captaincy Choices",
            StatKind::Transfers => "Transfer Summary",
            StatKind::Rankings => "Manager Rankings",
            StatKind::Unique => "Unique Players",
            StatKind::Representation => "Club Representation",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Any of the six statistic views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatView {
    Ownership(OwnershipView),
    Captaincy(CaptaincyView),
    Transfers(TransfersView),
    Rankings(RankingsView),
    Unique(UniqueView),
    Representation(RepresentationView),
}

// ---------------------------------------------------------------------------
// StatsEngine
// ---------------------------------------------------------------------------

pub struct StatsEngine {
    source: Arc<DataSource>,
    ownership_top_k: Option<usize>,
}

impl StatsEngine {
    pub fn new(source: Arc<DataSource>, config: &StatsConfig) -> Self {
        Self {
            source,
            ownership_top_k: config.ownership_top_k,
        }
    }

    pub async fn compute(
        &self,
        ctx: &LeagueContext,
        kind: StatKind,
        gameweek: Gameweek,
    ) -> Result<StatView> {
        let view = match kind {
            StatKind::Ownership => StatView::Ownership(self.ownership(ctx, gameweek).await?),
            StatKind::Captaincy => StatView::Captaincy(self.captaincy(ctx, gameweek).await?),
            StatKind::Transfers => StatView::Transfers(self.transfers(ctx, gameweek).await?),
            StatKind::Rankings => StatView::Rankings(self.rankings(ctx, gameweek).await?),
            StatKind::Unique => StatView::Unique(self.unique(ctx, gameweek).await?),
            StatKind::Representation => {
                StatView::Representation(self.representation(ctx, gameweek).await?)
            }
        };
        info!(league_id = ctx.league_id(), stat = %kind, gameweek, "stat computed");
        Ok(view)
    }

    pub async fn ownership(&self, ctx: &LeagueContext, gameweek: Gameweek) -> Result<OwnershipView> {
        let (bootstrap, squads) = self.squads(ctx, gameweek).await?;
        Ok(ownership::compute(
            &bootstrap,
            gameweek,
            ctx.total_teams(),
            &squads,
            self.ownership_top_k,
        ))
    }

    pub async fn captaincy(&self, ctx: &LeagueContext, gameweek: Gameweek) -> Result<CaptaincyView> {
        let (bootstrap, squads) = self.squads(ctx, gameweek).await?;
        Ok(captaincy::compute(&bootstrap, gameweek, ctx.total_teams(), &squads))
    }

    pub async fn transfers(&self, ctx: &LeagueContext, gameweek: Gameweek) -> Result<TransfersView> {
        ctx.validate_gameweek(gameweek)?;
        let bootstrap = self.source.bootstrap().await?;
        let lists = self
            .source
            .transfer_lists(&ctx.teams, gameweek, bootstrap.phase(gameweek))
            .await;
        Ok(transfers::compute(&bootstrap, gameweek, ctx.total_teams(), &lists))
    }

    pub async fn rankings(&self, ctx: &LeagueContext, gameweek: Gameweek) -> Result<RankingsView> {
        let (bootstrap, squads) = self.squads(ctx, gameweek).await?;
        let live = self.source.live_scores(&bootstrap, gameweek).await;
        Ok(rankings::compute(gameweek, ctx.total_teams(), &squads, live.as_deref()))
    }

    pub async fn unique(&self, ctx: &LeagueContext, gameweek: Gameweek) -> Result<UniqueView> {
        let (bootstrap, squads) = self.squads(ctx, gameweek).await?;
        Ok(unique::compute(&bootstrap, gameweek, ctx.total_teams(), &squads))
    }

    pub async fn representation(
        &self,
        ctx: &LeagueContext,
        gameweek: Gameweek,
    ) -> Result<RepresentationView> {
        let (bootstrap, squads) = self.squads(ctx, gameweek).await?;
        Ok(representation::compute(&bootstrap, gameweek, ctx.total_teams(), &squads))
    }

    async fn squads(
        &self,
        ctx: &LeagueContext,
        gameweek: Gameweek,
    ) -> Result<(Arc<Bootstrap>, Fanout<Squad>)> {
        ctx.validate_gameweek(gameweek)?;
        let bootstrap = self.source.bootstrap().await?;
        let squads = self
            .source
            .squads(&ctx.teams, gameweek, bootstrap.phase(gameweek))
            .await;
        Ok((bootstrap, squads))
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// `part / whole * 100`, rounded to two decimals. Zero for an empty whole.
pub(crate) fn percentage(part: f64, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part * 100.0 / whole as f64, 2)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
