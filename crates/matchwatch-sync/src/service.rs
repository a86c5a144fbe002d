use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use matchwatch_cache::{CacheError, FixtureCache, RoundTracker, ROSTER_TTL_DAYS};
use matchwatch_core::{Fixture, FixtureStatus, Player, Team};
use matchwatch_providers::{FixtureSource, GoalSource, ProviderError, UpstreamMatch};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{Result, SyncError},
    goals::{partition_scorers, GoalScorers},
    reference::TeamDirectory,
};

/// Reconciles provider data into the fixture cache.
///
/// Holds no lock across provider calls: every cache access is a short,
/// self-contained read or transaction.
pub struct FixtureSyncService {
    cache: Arc<FixtureCache>,
    rounds: RoundTracker,
    fixtures: Arc<dyn FixtureSource>,
    goals: Arc<dyn GoalSource>,
    teams: Arc<dyn TeamDirectory>,
    timezone: Tz,
}

impl FixtureSyncService {
    pub fn new(
        cache: Arc<FixtureCache>,
        fixtures: Arc<dyn FixtureSource>,
        goals: Arc<dyn GoalSource>,
        teams: Arc<dyn TeamDirectory>,
        timezone: Tz,
    ) -> Self {
        let rounds = RoundTracker::new(Arc::clone(&cache));
        Self {
            cache,
            rounds,
            fixtures,
            goals,
            teams,
            timezone,
        }
    }

    pub fn cache(&self) -> &Arc<FixtureCache> {
        &self.cache
    }

    pub fn rounds(&self) -> &RoundTracker {
        &self.rounds
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Fetch `round` from the authoritative provider and swap it into the cache.
    ///
    /// Only fixtures with at least one tracked side are kept. Enrichment
    /// already in the cache (correlation id, scorers, a later status) is carried
    /// over, and the list is written only when it differs element-wise from the
    /// cached one. Returns whether the cached list was replaced.
    #[instrument(skip(self))]
    pub async fn refresh_fixture_list(&self, round: u32) -> Result<bool> {
        let matches = self
            .fixtures
            .fixtures_for_round(round)
            .await
            .map_err(|e| upstream(self.fixtures.name(), e))?;

        // rosters first: they touch the cache and must not run inside the swap
        let mut built = Vec::new();
        let mut seen = HashSet::new();
        for m in &matches {
            let Some((home, away)) = self.resolve_sides(m) else {
                continue;
            };
            if !seen.insert(m.id) {
                warn!(fixture_id = m.id, "duplicate fixture in upstream listing");
                continue;
            }
            built.push(self.build_fixture(m, &home, &away, round)?);
        }
        let kept = built.len();

        let replaced = self.cache.reconcile_fixture_list(|cached| {
            let mut fresh = built;
            if let Some(cached) = &cached {
                for fixture in &mut fresh {
                    if let Some(prev) = cached.iter().find(|c| c.id == fixture.id) {
                        fixture.carry_enrichment(prev);
                    }
                }
            }
            (cached.as_ref() != Some(&fresh)).then_some(fresh)
        })?;

        if replaced {
            info!(round, upstream = matches.len(), kept, "fixture list refreshed");
        } else {
            debug!(round, count = kept, "fixture list unchanged");
        }
        Ok(replaced)
    }

    /// Refresh whatever round the round tracker currently points at.
    pub async fn refresh_active_round(&self) -> Result<bool> {
        let round = self.rounds.active_round()?;
        self.refresh_fixture_list(round).await
    }

    /// Ask the authoritative provider for the current round and store it.
    pub async fn sync_active_round(&self) -> Result<u32> {
        let round = self
            .fixtures
            .current_round()
            .await
            .map_err(|e| upstream(self.fixtures.name(), e))?;
        self.rounds.set_active_round(round)?;
        Ok(round)
    }

    /// Cached fixtures; if the list was never populated, sync it first.
    pub async fn fixtures_or_refresh(&self) -> Result<Vec<Fixture>> {
        match self.cache.try_list_fixtures() {
            Ok(list) => Ok(list),
            Err(CacheError::Uninitialized { .. }) => {
                info!("fixture cache empty, syncing on demand");
                self.refresh_active_round().await?;
                Ok(self.cache.list_fixtures()?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve correlation ids for every cached fixture kicking off on `date`.
    pub async fn resolve_secondary_ids(&self, date: NaiveDate) -> Result<usize> {
        let fixtures: Vec<Fixture> = self
            .cache
            .list_fixtures()?
            .into_iter()
            .filter(|f| f.kickoff_date(&self.timezone) == date)
            .collect();
        self.resolve_secondary_id(&fixtures, date).await
    }

    /// Match `fixtures` to the secondary provider's records for `date` by exact
    /// (home team id, away team id) pair and store the correlation ids.
    ///
    /// Fixtures with no matching record, or that already have an id, are left
    /// alone. Returns how many ids were newly resolved.
    #[instrument(skip(self, fixtures), fields(count = fixtures.len()))]
    pub async fn resolve_secondary_id(&self, fixtures: &[Fixture], date: NaiveDate) -> Result<usize> {
        let pending: Vec<&Fixture> = fixtures.iter().filter(|f| f.secondary_id.is_none()).collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let records = match self.goals.matches_on(date).await {
            Ok(records) => records,
            Err(ProviderError::Empty(reason)) => {
                info!(%date, %reason, "secondary provider has no matches for date");
                return Ok(0);
            }
            Err(e) => return Err(upstream(self.goals.name(), e)),
        };

        let mut resolved = 0;
        for fixture in pending {
            let Some(record) = records.iter().find(|r| {
                r.home_team_id == fixture.home_team_id && r.away_team_id == fixture.away_team_id
            }) else {
                info!(
                    fixture_id = fixture.id,
                    home = %fixture.home_team,
                    away = %fixture.away_team,
                    "no secondary match for team pair"
                );
                continue;
            };
            let updated = self
                .cache
                .update_fixture(fixture.id, |f| f.resolve_secondary_id(&record.match_id))?;
            if updated.is_some_and(|f| f.secondary_id.as_deref() == Some(record.match_id.as_str())) {
                info!(fixture_id = fixture.id, secondary_id = %record.match_id, "correlation id resolved");
                resolved += 1;
            }
        }
        Ok(resolved)
    }

    /// Goal scorers for `fixture` from the secondary provider.
    ///
    /// Fails with [`SyncError::GoalDataUnavailable`] when the correlation id is
    /// not resolved yet or the provider has nothing for the match.
    pub async fn fetch_goal_scorers(&self, fixture: &Fixture) -> Result<GoalScorers> {
        let unavailable = |reason: String| SyncError::GoalDataUnavailable {
            fixture_id: fixture.id,
            reason,
        };
        let Some(match_id) = fixture.secondary_id.as_deref() else {
            return Err(unavailable("correlation id not resolved".to_string()));
        };
        let date = fixture.kickoff_date(&self.timezone);

        let records = self
            .goals
            .match_detail(match_id, date)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let record = records
            .iter()
            .find(|r| r.match_id == match_id)
            .ok_or_else(|| unavailable(format!("no record for match {match_id}")))?;

        Ok(partition_scorers(&record.goals))
    }

    /// Union `scorers` into the cached fixture. Applying the same result twice
    /// leaves the fixture as after the first application.
    pub fn merge_goal_scorers(&self, fixture_id: u64, scorers: &GoalScorers) -> Result<Option<Fixture>> {
        let updated = self.cache.update_fixture(fixture_id, |f| {
            let added = f.merge_scorers(&scorers.home, &scorers.away);
            if added > 0 {
                info!(fixture_id, added, "new goal scorers");
            }
            added > 0
        })?;
        Ok(updated)
    }

    /// Poll the authoritative provider for one fixture and record what it says.
    pub async fn fetch_status(&self, fixture_id: u64) -> Result<FixtureStatus> {
        let snapshot = self
            .fixtures
            .fixture(fixture_id)
            .await
            .map_err(|e| upstream(self.fixtures.name(), e))?;
        self.record_snapshot(&snapshot)
    }

    /// Write an observed status and score into the cached fixture.
    ///
    /// Unknown status strings return [`SyncError::UnknownFixtureStatus`]
    /// without touching the cache. A status older than the cached one is
    /// ignored. Returns the parsed status.
    pub fn record_snapshot(&self, snapshot: &UpstreamMatch) -> Result<FixtureStatus> {
        let status: FixtureStatus = snapshot
            .status
            .parse()
            .map_err(|_| SyncError::UnknownFixtureStatus(snapshot.status.clone()))?;

        self.cache.update_fixture(snapshot.id, |f| {
            let mut changed = false;
            if f.status != status && f.advance_status(status) {
                changed = true;
            }
            if let (Some(home), Some(away)) = (snapshot.full_time.home, snapshot.full_time.away) {
                if f.home_score != Some(home) || f.away_score != Some(away) {
                    f.home_score = Some(home);
                    f.away_score = Some(away);
                    changed = true;
                }
            }
            changed
        })?;
        Ok(status)
    }

    /// Roster for `team_id`, rebuilt from reference data on a cache miss.
    pub fn roster_for(&self, team_id: u64) -> Result<Vec<Player>> {
        if let Some(players) = self.cache.get_roster(team_id)? {
            return Ok(players);
        }
        let players = self.teams.players(team_id);
        self.cache
            .put_roster(team_id, &players, Duration::days(ROSTER_TTL_DAYS))?;
        debug!(team_id, count = players.len(), "roster repopulated from reference data");
        Ok(players)
    }

    /// Both sides from reference data, or `None` when the match is not worth keeping.
    fn resolve_sides(&self, m: &UpstreamMatch) -> Option<(Team, Team)> {
        let home = self.teams.team_by_code(&m.home_code);
        let away = self.teams.team_by_code(&m.away_code);
        let tracked = home.as_ref().is_some_and(|t| t.tracked) || away.as_ref().is_some_and(|t| t.tracked);
        if !tracked {
            debug!(fixture_id = m.id, home = %m.home_code, away = %m.away_code, "discarding untracked fixture");
            return None;
        }
        match (home, away) {
            (Some(home), Some(away)) => Some((home, away)),
            _ => {
                warn!(
                    fixture_id = m.id,
                    home = %m.home_code,
                    away = %m.away_code,
                    "tracked fixture has a side missing from reference data"
                );
                None
            }
        }
    }

    fn build_fixture(&self, m: &UpstreamMatch, home: &Team, away: &Team, round: u32) -> Result<Fixture> {
        let status = match m.status.parse::<FixtureStatus>() {
            Ok(status) => status,
            Err(_) => {
                warn!(fixture_id = m.id, status = %m.status, "unknown fixture status, treating as scheduled");
                FixtureStatus::Scheduled
            }
        };
        Ok(Fixture {
            id: m.id,
            home_team_id: home.id,
            away_team_id: away.id,
            home_team: home.name.clone(),
            away_team: away.name.clone(),
            home_code: home.code.clone(),
            away_code: away.code.clone(),
            kickoff: m.kickoff,
            competition: m.competition.clone(),
            status,
            venue: home.venue.clone(),
            round,
            home_score: m.full_time.home,
            away_score: m.full_time.away,
            home_players: self.roster_for(home.id)?,
            away_players: self.roster_for(away.id)?,
            home_scorers: Vec::new(),
            away_scorers: Vec::new(),
            secondary_id: None,
        })
    }
}

fn upstream(provider: &str, e: ProviderError) -> SyncError {
    warn!(provider, error = %e, "upstream call failed");
    SyncError::UpstreamUnavailable {
        provider: provider.to_string(),
        reason: e.to_string(),
    }
}
