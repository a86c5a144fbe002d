use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use matchwatch_cache::CacheError;
use matchwatch_core::{config::SchedulerConfig, Fixture};
use matchwatch_sync::{FixtureSyncService, SyncError};
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    error::{Result, SchedulerError},
    schedule::{backoff_delay, local_day, next_local_midnight},
    types::{WatchPhase, WatchStatus},
    watch::{WatchContext, WatchState, WatchTask},
};

struct WatchHandle {
    kickoff: DateTime<Utc>,
    state: Arc<WatchState>,
    cancel: CancellationToken,
}

/// Arms one watch pipeline per fixture kicking off today and owns their
/// cancellation.
///
/// At most one pipeline exists per fixture id; re-running the daily pass
/// never arms a second one while the first is still live.
pub struct FixtureScheduler {
    ctx: Arc<WatchContext>,
    config: SchedulerConfig,
    watches: DashMap<u64, WatchHandle>,
    /// Parent of every pipeline's token; cancelled on shutdown.
    root: CancellationToken,
}

impl FixtureScheduler {
    pub fn new(sync: Arc<FixtureSyncService>, config: SchedulerConfig) -> Self {
        let ctx = WatchContext {
            sync,
            slots: Arc::new(Semaphore::new(config.poll_slots.max(1))),
            watch_interval: Duration::from_secs(config.watch_interval_secs.max(1)),
            goal_interval: Duration::from_secs(config.goal_interval_secs.max(1)),
            max_pipeline: Duration::from_secs(config.max_pipeline_mins * 60),
        };
        Self {
            ctx: Arc::new(ctx),
            config,
            watches: DashMap::new(),
            root: CancellationToken::new(),
        }
    }

    pub fn sync(&self) -> &Arc<FixtureSyncService> {
        &self.ctx.sync
    }

    /// Arm pipelines for fixtures kicking off later today.
    pub async fn schedule_today(&self) -> Result<usize> {
        self.schedule_day(Utc::now()).await
    }

    /// Arm a pipeline for every cached fixture whose kickoff falls on `now`'s
    /// calendar day (configured timezone) and is not already in the past.
    ///
    /// Waits for the fixture cache to be initialized first and fails with
    /// [`SchedulerError::CacheUninitialized`] if it never is. Returns how many
    /// pipelines were armed.
    pub async fn schedule_day(&self, now: DateTime<Utc>) -> Result<usize> {
        let tz = self.ctx.sync.timezone();
        let day = local_day(&tz, now);
        let fixtures = self.wait_for_fixtures().await?;

        // finished and cancelled pipelines stay visible for the rest of their day
        self.watches
            .retain(|_, h| !h.state.phase().is_terminal() || local_day(&tz, h.kickoff) >= day);

        let todays: Vec<Fixture> = fixtures
            .into_iter()
            .filter(|f| f.kickoff_date(&tz) == day)
            .collect();
        if todays.is_empty() {
            info!(%day, "no fixtures today");
            return Ok(0);
        }

        if let Err(e) = self.ctx.sync.resolve_secondary_id(&todays, day).await {
            warn!(%day, error = %e, "correlation id lookup failed, goal polling will retry");
        }

        let mut armed = 0;
        for fixture in todays {
            if fixture.kickoff < now {
                debug!(fixture_id = fixture.id, kickoff = %fixture.kickoff, "kickoff already passed, not arming");
                continue;
            }
            if fixture.status.is_terminal() {
                info!(fixture_id = fixture.id, status = %fixture.status, "fixture will not be played, not arming");
                continue;
            }
            if self.arm(fixture, now) {
                armed += 1;
            }
        }
        info!(%day, armed, active = self.active_count(), "fixtures scheduled");
        Ok(armed)
    }

    /// Fixtures sync, round refresh and scheduling for the current day.
    ///
    /// Provider failures during the sync steps are logged and scheduling
    /// proceeds from whatever the cache holds.
    pub async fn daily_pass(&self) -> Result<usize> {
        let sync = &self.ctx.sync;
        match sync.sync_active_round().await {
            Ok(round) => info!(round, "active round synced"),
            Err(e) => warn!(error = %e, "could not sync active round, using stored value"),
        }
        match sync.refresh_active_round().await {
            Ok(changed) => debug!(changed, "fixture list refreshed"),
            Err(e) => warn!(error = %e, "fixture list refresh failed, scheduling from cache"),
        }
        self.schedule_today().await
    }

    /// Daily loop: run [`Self::daily_pass`] at every local midnight until
    /// `shutdown` broadcasts `true`, then cancel all pipelines.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("fixture scheduler started");
        let tz = self.ctx.sync.timezone();
        loop {
            let now = Utc::now();
            let next = next_local_midnight(&tz, now);
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(next = %next, "next daily pass");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    match self.daily_pass().await {
                        Ok(armed) => info!(armed, "daily pass complete"),
                        Err(e) => error!("daily pass failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("fixture scheduler shutting down");
                        self.shutdown().await;
                        break;
                    }
                }
            }
        }
    }

    /// Stop the pipeline for `fixture_id`. Returns `false` if none was armed.
    pub fn cancel(&self, fixture_id: u64) -> bool {
        match self.watches.get(&fixture_id) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pipeline and wait for them to stop.
    pub async fn shutdown(&self) {
        self.root.cancel();
        self.wait_idle().await;
        info!("all watch pipelines stopped");
    }

    /// Resolve once every armed pipeline has reached a terminal phase.
    pub async fn wait_idle(&self) {
        let receivers: Vec<_> = self
            .watches
            .iter()
            .map(|h| h.state.subscribe())
            .collect();
        for mut rx in receivers {
            // Err means the state was dropped, which only happens once the task is gone.
            let _ = rx.wait_for(|p| p.is_terminal()).await;
        }
    }

    pub fn phase(&self, fixture_id: u64) -> Option<WatchPhase> {
        self.watches.get(&fixture_id).map(|h| h.state.phase())
    }

    /// Phases `fixture_id` has been through, oldest first. Kept until the
    /// first scheduling pass after the fixture's kickoff day.
    pub fn history(&self, fixture_id: u64) -> Option<Vec<WatchPhase>> {
        self.watches.get(&fixture_id).map(|h| h.state.history())
    }

    /// Pipelines not yet finished or cancelled.
    pub fn active_count(&self) -> usize {
        self.watches
            .iter()
            .filter(|h| !h.state.phase().is_terminal())
            .count()
    }

    /// Every known pipeline, ordered by kickoff. Finished and cancelled ones
    /// are listed until a pass on a later day drops them.
    pub fn snapshot(&self) -> Vec<WatchStatus> {
        let mut out: Vec<WatchStatus> = self
            .watches
            .iter()
            .map(|h| WatchStatus {
                fixture_id: *h.key(),
                kickoff: h.kickoff,
                phase: h.state.phase(),
            })
            .collect();
        out.sort_by_key(|w| (w.kickoff, w.fixture_id));
        out
    }

    // --- private helpers ---------------------------------------------------

    /// Read the fixture list, syncing it on demand, with exponential backoff
    /// while it cannot be populated yet.
    async fn wait_for_fixtures(&self) -> Result<Vec<Fixture>> {
        let attempts = self.config.cache_wait_attempts.max(1);
        for attempt in 0..attempts {
            match self.ctx.sync.fixtures_or_refresh().await {
                Ok(list) => return Ok(list),
                Err(
                    e @ (SyncError::UpstreamUnavailable { .. }
                    | SyncError::Cache(
                        CacheError::Uninitialized { .. } | CacheError::RoundNotConfigured,
                    )),
                ) => {
                    if attempt + 1 == attempts {
                        break;
                    }
                    let delay = backoff_delay(
                        attempt,
                        self.config.cache_wait_base_ms,
                        self.config.cache_wait_max_ms,
                    );
                    debug!(attempt, ?delay, error = %e, "fixture cache not initialized, waiting");
                    tokio::select! {
                        _ = self.root.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(attempts, "fixture cache never initialized");
        Err(SchedulerError::CacheUninitialized { attempts })
    }

    /// Spawn a pipeline for `fixture` unless one already exists for it,
    /// including one that already finished or was cancelled today.
    fn arm(&self, fixture: Fixture, now: DateTime<Utc>) -> bool {
        if self.root.is_cancelled() {
            return false;
        }
        let id = fixture.id;
        let entry = self.watches.entry(id);
        if let Entry::Occupied(ref existing) = entry {
            debug!(fixture_id = id, phase = %existing.get().state.phase(), "pipeline already armed");
            return false;
        }

        let state = Arc::new(WatchState::new());
        let cancel = self.root.child_token();
        entry.insert(WatchHandle {
            kickoff: fixture.kickoff,
            state: Arc::clone(&state),
            cancel: cancel.clone(),
        });

        let until_kickoff = (fixture.kickoff - now).to_std().unwrap_or_default();
        info!(fixture_id = id, kickoff = %fixture.kickoff, in_secs = until_kickoff.as_secs(), "pipeline armed");
        let task = WatchTask::new(fixture, Arc::clone(&self.ctx), state, cancel);
        tokio::spawn(task.run(until_kickoff));
        true
    }
}
