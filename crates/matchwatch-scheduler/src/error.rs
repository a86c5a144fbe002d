use matchwatch_cache::CacheError;
use matchwatch_sync::SyncError;
use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The fixture list was still never written after the bounded wait.
    #[error("Fixture cache uninitialized after {attempts} attempts")]
    CacheUninitialized { attempts: u32 },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;
