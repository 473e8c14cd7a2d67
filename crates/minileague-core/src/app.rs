// Application facade: one session's league plus the shared cache and engines.
//
// The CLI (or any other front end) talks only to `App`. Every league-scoped
// query fails with `NoLeagueConfigured` until `set_league` has succeeded.

use std::sync::Arc;

use tracing::{info, warn};

use crate::breakdown::{self, TeamBreakdown};
use crate::cache::{Cache, CacheStats, TtlPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::league::{LeagueContext, LeagueSlot};
use crate::model::{EntryId, Gameweek, LeagueId};
use crate::protocol::{self, Deadline, LeagueStatus, SeasonInfo};
use crate::source::DataSource;
use crate::standings::{GameweekSummary, GameweekTable, SeasonTable, StandingsEngine, TopPerformers};
use crate::stats::{StatKind, StatView, StatsEngine};
use crate::upstream::{FplClient, Upstream};

/// Rows in each top-performers list unless the caller asks otherwise.
pub const DEFAULT_TOP_LIMIT: usize = 10;

pub struct App {
    config: Config,
    source: Arc<DataSource>,
    stats: StatsEngine,
    standings: StandingsEngine,
    league: LeagueSlot,
}

impl App {
    /// Build an app backed by the HTTP client described in `config`.
    pub fn new(config: Config) -> Result<Self> {
        let client = FplClient::from_config(&config.upstream)?;
        Ok(Self::with_upstream(config, Arc::new(client)))
    }

    pub fn with_upstream(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        let source = Arc::new(DataSource::new(
            upstream,
            Arc::new(Cache::new()),
            TtlPolicy::from_config(&config.cache),
            &config.stats,
        ));
        Self {
            stats: StatsEngine::new(Arc::clone(&source), &config.stats),
            standings: StandingsEngine::new(Arc::clone(&source)),
            source,
            league: LeagueSlot::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // -- league ------------------------------------------------------------

    /// Resolve `league_id` and make it the session's league. On failure the
    /// previous league, if any, stays in place.
    pub async fn set_league(&self, league_id: LeagueId) -> Result<Arc<LeagueContext>> {
        let ctx = LeagueContext::load(&self.source, league_id).await?;
        info!(
            league_id,
            league = %ctx.league.name,
            teams = ctx.teams.len(),
            pending = ctx.pending.len(),
            gameweek = ctx.current_gameweek,
            pre_season = ctx.is_pre_season,
            "league loaded"
        );
        Ok(self.league.replace(ctx))
    }

    /// The last resolved league, without touching the upstream.
    pub fn context(&self) -> Result<Arc<LeagueContext>> {
        self.league.get()
    }

    pub fn league_status(&self) -> Result<LeagueStatus> {
        let ctx = self.context()?;
        Ok(LeagueStatus::from_context(&ctx))
    }

    /// The session's league re-resolved from the cached standings and
    /// bootstrap, so members' totals and the season position follow those
    /// resources' TTLs. If the reload fails the last snapshot is served.
    async fn current(&self) -> Result<Arc<LeagueContext>> {
        let ctx = self.context()?;
        match LeagueContext::load(&self.source, ctx.league_id()).await {
            Ok(fresh) if fresh == *ctx => Ok(ctx),
            Ok(fresh) => Ok(self.league.replace(fresh)),
            Err(e) => {
                warn!(league_id = ctx.league_id(), error = %e, "league reload failed, serving last snapshot");
                Ok(ctx)
            }
        }
    }

    // -- statistics --------------------------------------------------------

    /// Compute a statistic by id. `gameweek` defaults to the current one.
    pub async fn stat(&self, kind: &str, gameweek: Option<Gameweek>) -> Result<StatView> {
        let ctx = self.current().await?;
        let kind = StatKind::parse(kind)?;
        let gameweek = ctx.resolve_gameweek(gameweek)?;
        self.stats.compute(&ctx, kind, gameweek).await
    }

    // -- tables ------------------------------------------------------------

    pub async fn season_table(&self) -> Result<SeasonTable> {
        let ctx = self.current().await?;
        self.standings.season_table(&ctx).await
    }

    pub async fn gameweek_table(&self, gameweek: Option<Gameweek>) -> Result<GameweekTable> {
        let ctx = self.current().await?;
        let gameweek = ctx.resolve_gameweek(gameweek)?;
        self.standings.gameweek_table(&ctx, gameweek).await
    }

    pub async fn summary(&self, gameweek: Option<Gameweek>) -> Result<GameweekSummary> {
        let ctx = self.current().await?;
        let gameweek = ctx.resolve_gameweek(gameweek)?;
        self.standings.gameweek_summary(&ctx, gameweek).await
    }

    pub async fn top_performers(
        &self,
        gameweek: Option<Gameweek>,
        limit: usize,
    ) -> Result<TopPerformers> {
        let ctx = self.current().await?;
        let gameweek = ctx.resolve_gameweek(gameweek)?;
        self.standings.top_performers(&ctx, gameweek, limit).await
    }

    pub async fn breakdown(
        &self,
        entry_id: EntryId,
        gameweek: Option<Gameweek>,
    ) -> Result<TeamBreakdown> {
        let ctx = self.current().await?;
        let gameweek = ctx.resolve_gameweek(gameweek)?;
        breakdown::team_breakdown(&self.source, &ctx, entry_id, gameweek).await
    }

    // -- season ------------------------------------------------------------

    pub async fn season_info(&self) -> Result<SeasonInfo> {
        let bootstrap = self.source.bootstrap().await?;
        Ok(SeasonInfo::from_bootstrap(&bootstrap))
    }

    pub async fn deadlines(&self) -> Result<Vec<Deadline>> {
        let bootstrap = self.source.bootstrap().await?;
        Ok(protocol::deadlines(&bootstrap))
    }

    // -- cache -------------------------------------------------------------

    /// Drop every cached resource and reload the session's league from
    /// upstream. If the reload fails the previous league stays selected and
    /// the error is returned.
    pub async fn refresh(&self) -> Result<()> {
        let before = self.source.cache().stats();
        self.source.cache().clear();
        info!(dropped = before.entries, "cache cleared");

        let Ok(ctx) = self.context() else {
            return Ok(());
        };
        let fresh = LeagueContext::load(&self.source, ctx.league_id()).await?;
        info!(league_id = fresh.league_id(), pre_season = fresh.is_pre_season, "league reloaded");
        self.league.replace(fresh);
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.source.cache().stats()
    }
}
