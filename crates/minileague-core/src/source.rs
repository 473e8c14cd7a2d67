// Cached access to upstream resources and the per-team fan-out.
//
// Every engine goes through `DataSource`: it picks the TTL for each key from
// the gameweek phase, routes misses to the `Upstream`, and scatters per-team
// fetches with bounded concurrency and a per-team timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{Cache, CacheKey, ResourceKind, TtlPolicy};
use crate::config::StatsConfig;
use crate::error::{LeagueError, Result};
use crate::model::{
    Bootstrap, EntryId, Gameweek, GameweekPhase, LeagueId, LeagueStandings, LivePoints, Squad,
    Team, TransferEvent,
};
use crate::upstream::Upstream;

// ---------------------------------------------------------------------------
// Fan-out results
// ---------------------------------------------------------------------------

/// A member team whose data could not be fetched for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTeam {
    pub entry_id: EntryId,
    pub team_name: String,
    pub reason: String,
}

/// Successes and failures of one scatter/gather over the league's teams.
/// Successes keep the league's team order.
#[derive(Debug)]
pub struct Fanout<T> {
    pub ok: Vec<(Team, Arc<T>)>,
    pub failed: Vec<FailedTeam>,
}

impl<T> Fanout<T> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn coverage(&self) -> Coverage {
        Coverage {
            fetched_teams: self.ok.len(),
            failed_teams: self.failed.clone(),
        }
    }
}

/// How many teams a view was computed over, and which were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub fetched_teams: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_teams: Vec<FailedTeam>,
}

impl Coverage {
    pub fn is_complete(&self) -> bool {
        self.failed_teams.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

pub struct DataSource {
    upstream: Arc<dyn Upstream>,
    cache: Arc<Cache>,
    policy: TtlPolicy,
    concurrency: usize,
    team_timeout: Duration,
    live_scoring: bool,
}

impl DataSource {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        cache: Arc<Cache>,
        policy: TtlPolicy,
        stats: &StatsConfig,
    ) -> Self {
        Self {
            upstream,
            cache,
            policy,
            concurrency: stats.fanout_concurrency.max(1),
            team_timeout: Duration::from_secs(stats.team_fetch_timeout_secs),
            live_scoring: stats.live_scoring,
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn live_scoring(&self) -> bool {
        self.live_scoring
    }

    pub async fn bootstrap(&self) -> Result<Arc<Bootstrap>> {
        let ttl = self.policy.ttl(ResourceKind::Bootstrap, GameweekPhase::Live);
        self.cache
            .get_or_fetch(CacheKey::bootstrap(), ttl, || self.upstream.bootstrap())
            .await
    }

    /// League standings. An unknown or private league id surfaces as
    /// `LeagueNotFound`.
    pub async fn league(&self, league_id: LeagueId) -> Result<Arc<LeagueStandings>> {
        let ttl = self.policy.ttl(ResourceKind::LeagueStandings, GameweekPhase::Live);
        self.cache
            .get_or_fetch(CacheKey::league(league_id), ttl, || {
                self.upstream.league_standings(league_id)
            })
            .await
            .map_err(|e| match e {
                LeagueError::UpstreamNotFound { .. } => LeagueError::LeagueNotFound { league_id },
                other => other,
            })
    }

    pub async fn squad(
        &self,
        entry_id: EntryId,
        gameweek: Gameweek,
        phase: GameweekPhase,
    ) -> Result<Arc<Squad>> {
        let ttl = self.policy.ttl(ResourceKind::Picks, phase);
        self.cache
            .get_or_fetch(CacheKey::picks(entry_id, gameweek), ttl, || {
                self.upstream.picks(entry_id, gameweek)
            })
            .await
    }

    pub async fn transfers(
        &self,
        entry_id: EntryId,
        gameweek: Gameweek,
        phase: GameweekPhase,
    ) -> Result<Arc<Vec<TransferEvent>>> {
        let ttl = self.policy.ttl(ResourceKind::Transfers, phase);
        self.cache
            .get_or_fetch(CacheKey::transfers(entry_id, gameweek), ttl, || {
                self.upstream.transfers(entry_id, gameweek)
            })
            .await
    }

    pub async fn live(&self, gameweek: Gameweek, phase: GameweekPhase) -> Result<Arc<LivePoints>> {
        let ttl = self.policy.ttl(ResourceKind::LivePoints, phase);
        self.cache
            .get_or_fetch(CacheKey::live(gameweek), ttl, || {
                self.upstream.live_points(gameweek)
            })
            .await
    }

    /// Live player scores to recompute an unfinished gameweek's points.
    ///
    /// `None` when the gameweek is finished, live scoring is disabled, or the
    /// live resource could not be fetched; callers then use the points
    /// reported with each squad.
    pub async fn live_scores(
        &self,
        bootstrap: &Bootstrap,
        gameweek: Gameweek,
    ) -> Option<Arc<LivePoints>> {
        let phase = bootstrap.phase(gameweek);
        if !self.live_scoring || phase == GameweekPhase::Finished {
            return None;
        }
        match self.live(gameweek, phase).await {
            Ok(live) => Some(live),
            Err(e) => {
                warn!(gameweek, error = %e, "live scores unavailable, using reported points");
                None
            }
        }
    }

    /// Every team's squad for `gameweek`.
    pub async fn squads(
        &self,
        teams: &[Team],
        gameweek: Gameweek,
        phase: GameweekPhase,
    ) -> Fanout<Squad> {
        self.fan_out(teams, "picks", |entry_id| self.squad(entry_id, gameweek, phase))
            .await
    }

    /// Every team's transfers for `gameweek`.
    pub async fn transfer_lists(
        &self,
        teams: &[Team],
        gameweek: Gameweek,
        phase: GameweekPhase,
    ) -> Fanout<Vec<TransferEvent>> {
        self.fan_out(teams, "transfers", |entry_id| {
            self.transfers(entry_id, gameweek, phase)
        })
        .await
    }

    async fn fan_out<T, F, Fut>(&self, teams: &[Team], resource: &str, fetch: F) -> Fanout<T>
    where
        F: Fn(EntryId) -> Fut,
        Fut: Future<Output = Result<Arc<T>>>,
    {
        let timeout = self.team_timeout;
        let fetch = &fetch;

        let mut outcomes: Vec<(usize, std::result::Result<Arc<T>, String>)> =
            stream::iter(teams.iter().enumerate())
                .map(|(idx, team)| async move {
                    let outcome = match tokio::time::timeout(timeout, fetch(team.entry_id)).await {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err(format!("timed out after {}s", timeout.as_secs())),
                    };
                    (idx, outcome)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut fanout = Fanout {
            ok: Vec::with_capacity(teams.len()),
            failed: Vec::new(),
        };
        for (idx, outcome) in outcomes {
            let team = &teams[idx];
            match outcome {
                Ok(value) => fanout.ok.push((team.clone(), value)),
                Err(reason) => {
                    warn!(entry_id = team.entry_id, resource, %reason, "team fetch failed, excluding");
                    fanout.failed.push(FailedTeam {
                        entry_id: team.entry_id,
                        team_name: team.team_name.clone(),
                        reason,
                    });
                }
            }
        }

        debug!(
            resource,
            fetched = fanout.ok.len(),
            failed = fanout.failed.len(),
            "fan-out complete"
        );
        fanout
    }
}
