use thiserror::Error;

/// Errors raised by the fixture cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key has never been written by any writer.
    #[error("Cache key not initialized: {key}")]
    Uninitialized { key: String },

    /// The current round was read before anything stored it.
    #[error("Active round is not configured")]
    RoundNotConfigured,

    /// A fixture list must not contain the same id twice.
    #[error("Duplicate fixture id in list: {id}")]
    DuplicateFixture { id: u64 },

    #[error("Corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Cache connection lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, CacheError>;
