use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a fixture's watch pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchPhase {
    /// Armed; waiting for kickoff.
    Scheduled,
    /// Polling status until the match starts.
    Watching,
    /// Start observed.
    Live,
    /// Polling goal scorers until the match ends.
    GoalPolling,
    Finished,
    Cancelled,
}

impl WatchPhase {
    fn rank(self) -> u8 {
        match self {
            WatchPhase::Scheduled => 0,
            WatchPhase::Watching => 1,
            WatchPhase::Live => 2,
            WatchPhase::GoalPolling => 3,
            WatchPhase::Finished | WatchPhase::Cancelled => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WatchPhase::Finished | WatchPhase::Cancelled)
    }

    /// Whether a pipeline in `self` may move to `next`.
    ///
    /// Forward moves only; `Cancelled` is reachable from every live phase.
    pub fn can_advance_to(self, next: WatchPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == WatchPhase::Cancelled || next.rank() > self.rank()
    }
}

impl std::fmt::Display for WatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WatchPhase::Scheduled => "scheduled",
            WatchPhase::Watching => "watching",
            WatchPhase::Live => "live",
            WatchPhase::GoalPolling => "goal_polling",
            WatchPhase::Finished => "finished",
            WatchPhase::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Operator view of one armed pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchStatus {
    pub fixture_id: u64,
    pub kickoff: DateTime<Utc>,
    pub phase: WatchPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_only_move_forward() {
        assert!(WatchPhase::Scheduled.can_advance_to(WatchPhase::Watching));
        assert!(WatchPhase::Watching.can_advance_to(WatchPhase::Live));
        assert!(WatchPhase::Live.can_advance_to(WatchPhase::GoalPolling));
        assert!(WatchPhase::GoalPolling.can_advance_to(WatchPhase::Finished));
        // deadline may skip straight to Finished
        assert!(WatchPhase::Watching.can_advance_to(WatchPhase::Finished));

        assert!(!WatchPhase::GoalPolling.can_advance_to(WatchPhase::Watching));
        assert!(!WatchPhase::Live.can_advance_to(WatchPhase::Live));
        assert!(!WatchPhase::Finished.can_advance_to(WatchPhase::Cancelled));
        assert!(!WatchPhase::Cancelled.can_advance_to(WatchPhase::Finished));
    }

    #[test]
    fn cancel_reachable_from_live_phases() {
        for phase in [
            WatchPhase::Scheduled,
            WatchPhase::Watching,
            WatchPhase::Live,
            WatchPhase::GoalPolling,
        ] {
            assert!(phase.can_advance_to(WatchPhase::Cancelled), "{phase}");
        }
    }
}
