use matchwatch_cache::CacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The authoritative or secondary provider failed or returned nothing.
    /// Not retried inside the call; the caller decides.
    #[error("Upstream unavailable ({provider}): {reason}")]
    UpstreamUnavailable { provider: String, reason: String },

    /// No goal data yet for a fixture. Retry on the next poll tick.
    #[error("Goal data unavailable for fixture {fixture_id}: {reason}")]
    GoalDataUnavailable { fixture_id: u64, reason: String },

    /// Upstream status string outside the recognised set.
    #[error("Unknown fixture status: {0}")]
    UnknownFixtureStatus(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl SyncError {
    /// Whether the same call may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::UpstreamUnavailable { .. } | SyncError::GoalDataUnavailable { .. } => true,
            SyncError::Cache(CacheError::Uninitialized { .. }) => true,
            SyncError::UnknownFixtureStatus(_) | SyncError::Cache(_) => false,
        }
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
