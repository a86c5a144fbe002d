use std::sync::{Arc, Mutex};
use std::time::Duration;

use matchwatch_core::{Fixture, FixtureStatus};
use matchwatch_sync::{FixtureSyncService, SyncError};
use tokio::sync::{watch, Semaphore, SemaphorePermit};
use tokio::time::{interval, sleep_until, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::WatchPhase;

/// Everything a watch task needs besides its own fixture.
pub struct WatchContext {
    pub sync: Arc<FixtureSyncService>,
    /// Bounds provider polls in flight across all fixtures.
    pub slots: Arc<Semaphore>,
    pub watch_interval: Duration,
    pub goal_interval: Duration,
    /// Measured from kickoff.
    pub max_pipeline: Duration,
}

/// Phase of one pipeline, shared between the task and the scheduler.
pub struct WatchState {
    phase: watch::Sender<WatchPhase>,
    history: Mutex<Vec<WatchPhase>>,
}

impl WatchState {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(WatchPhase::Scheduled);
        Self {
            phase,
            history: Mutex::new(vec![WatchPhase::Scheduled]),
        }
    }

    pub fn phase(&self) -> WatchPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WatchPhase> {
        self.phase.subscribe()
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> Vec<WatchPhase> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Move to `next` if that is a forward step. Returns whether it moved.
    pub fn advance(&self, next: WatchPhase) -> bool {
        self.phase.send_if_modified(|phase| {
            if !phase.can_advance_to(next) {
                return false;
            }
            *phase = next;
            // recorded under the channel lock so history order matches phase order
            self.history
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(next);
            true
        })
    }
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Ends the pipeline as cancelled if the task stops without reaching a
/// terminal phase (abort or panic).
struct CancelOnDrop(Arc<WatchState>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.advance(WatchPhase::Cancelled);
    }
}

enum Step {
    Next,
    Stopped,
    Expired,
}

/// The per-fixture pipeline: wait for kickoff, watch status, poll goals.
pub(crate) struct WatchTask {
    fixture: Fixture,
    ctx: Arc<WatchContext>,
    state: Arc<WatchState>,
    cancel: CancellationToken,
}

impl WatchTask {
    pub(crate) fn new(
        fixture: Fixture,
        ctx: Arc<WatchContext>,
        state: Arc<WatchState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fixture,
            ctx,
            state,
            cancel,
        }
    }

    pub(crate) async fn run(self, until_kickoff: Duration) {
        let _guard = CancelOnDrop(Arc::clone(&self.state));
        let id = self.fixture.id;
        let kickoff_at = Instant::now() + until_kickoff;
        let deadline = kickoff_at + self.ctx.max_pipeline;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return self.stop(),
            _ = sleep_until(kickoff_at) => {}
        }
        if !self.state.advance(WatchPhase::Watching) {
            return;
        }
        info!(fixture_id = id, home = %self.fixture.home_team, away = %self.fixture.away_team, "kickoff reached, watching status");

        match self.watch_status(deadline).await {
            Step::Next => {}
            Step::Stopped => return self.stop(),
            Step::Expired => return self.expire(),
        }

        self.state.advance(WatchPhase::Live);
        info!(fixture_id = id, "match live, polling goal scorers");
        if !self.state.advance(WatchPhase::GoalPolling) {
            return;
        }

        match self.poll_goals(deadline).await {
            Step::Next => {
                if self.state.advance(WatchPhase::Finished) {
                    info!(fixture_id = id, "pipeline finished");
                }
            }
            Step::Stopped => self.stop(),
            Step::Expired => self.expire(),
        }
    }

    async fn watch_status(&self, deadline: Instant) -> Step {
        let mut ticker = interval(self.ctx.watch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            if let Some(step) = self.next_tick(&mut ticker, deadline).await {
                return step;
            }
            if self.state.phase() != WatchPhase::Watching {
                return Step::Stopped;
            }
            match self.poll_status().await {
                Some(status) if status.has_started() => return Step::Next,
                Some(status) => debug!(fixture_id = self.fixture.id, %status, "not started"),
                None => {}
            }
        }
    }

    async fn poll_goals(&self, deadline: Instant) -> Step {
        let mut ticker = interval(self.ctx.goal_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            if let Some(step) = self.next_tick(&mut ticker, deadline).await {
                return step;
            }
            if self.state.phase() != WatchPhase::GoalPolling {
                return Step::Stopped;
            }
            let status = self.poll_status().await;
            self.poll_scorers().await;
            if let Some(status) = status.filter(|s| s.is_terminal()) {
                info!(fixture_id = self.fixture.id, %status, "match over");
                return Step::Next;
            }
        }
    }

    /// `None` when the tick fired; otherwise why the loop should end.
    async fn next_tick(&self, ticker: &mut Interval, deadline: Instant) -> Option<Step> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Some(Step::Stopped),
            _ = sleep_until(deadline) => Some(Step::Expired),
            _ = ticker.tick() => None,
        }
    }

    async fn permit(&self) -> Option<SemaphorePermit<'_>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = self.ctx.slots.acquire() => permit.ok(),
        }
    }

    /// One status poll. Failures are logged and retried on the next tick.
    async fn poll_status(&self) -> Option<FixtureStatus> {
        let id = self.fixture.id;
        let _permit = self.permit().await?;
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            r = self.ctx.sync.fetch_status(id) => r,
        };
        match result {
            Ok(status) => Some(status),
            Err(SyncError::UnknownFixtureStatus(raw)) => {
                warn!(fixture_id = id, status = %raw, "unknown fixture status, ignoring");
                None
            }
            Err(e) => {
                warn!(fixture_id = id, error = %e, "status poll failed");
                None
            }
        }
    }

    /// One goal poll: resolve the correlation id if still missing, fetch and
    /// merge scorers.
    async fn poll_scorers(&self) {
        let id = self.fixture.id;
        let Some(_permit) = self.permit().await else {
            return;
        };
        let sync = &self.ctx.sync;
        let work = async {
            let mut fixture = self.current_fixture()?;
            if fixture.secondary_id.is_none() {
                let date = fixture.kickoff_date(&sync.timezone());
                sync.resolve_secondary_id(std::slice::from_ref(&fixture), date)
                    .await?;
                fixture = self.current_fixture()?;
            }
            let scorers = sync.fetch_goal_scorers(&fixture).await?;
            sync.merge_goal_scorers(id, &scorers)?;
            Ok::<_, SyncError>(())
        };
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            r = work => r,
        };
        match result {
            Ok(()) => {}
            Err(e @ SyncError::GoalDataUnavailable { .. }) => {
                debug!(fixture_id = id, error = %e, "no goal data yet");
            }
            Err(e) => warn!(fixture_id = id, error = %e, "goal poll failed"),
        }
    }

    /// Latest cached copy of this fixture, or the one armed with if a list
    /// refresh dropped it.
    fn current_fixture(&self) -> Result<Fixture, SyncError> {
        let cached = self.ctx.sync.cache().list_fixtures()?;
        Ok(cached
            .into_iter()
            .find(|f| f.id == self.fixture.id)
            .unwrap_or_else(|| self.fixture.clone()))
    }

    fn stop(&self) {
        if self.state.advance(WatchPhase::Cancelled) {
            info!(fixture_id = self.fixture.id, "pipeline cancelled");
        }
    }

    fn expire(&self) {
        warn!(
            fixture_id = self.fixture.id,
            phase = %self.state.phase(),
            "pipeline deadline reached before the match ended, stopping"
        );
        self.state.advance(WatchPhase::Finished);
    }
}
