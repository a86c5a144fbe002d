use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Full-time or half-time score as reported upstream; `None` until known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

/// One match as seen by the authoritative provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamMatch {
    pub id: u64,
    pub kickoff: DateTime<Utc>,
    /// Raw status string; callers decide how to treat values they don't know.
    pub status: String,
    pub round: Option<u32>,
    pub competition: String,
    pub home_code: String,
    pub away_code: String,
    pub home_name: String,
    pub away_name: String,
    pub full_time: ScorePair,
    pub half_time: ScorePair,
}

/// One match record from the secondary goal-detail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalDetailMatch {
    /// The secondary provider's own match id (the fixture's correlation id).
    pub match_id: String,
    pub home_team_id: u64,
    pub away_team_id: u64,
    pub home_team: String,
    pub away_team: String,
    pub goals: Vec<GoalEvent>,
}

/// A goal event. Exactly one of the scorer fields is normally filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalEvent {
    pub time: String,
    pub home_scorer: String,
    pub away_scorer: String,
}

/// Authoritative source of fixture lists and per-fixture status.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// All matches of the configured competition in `round`.
    async fn fixtures_for_round(&self, round: u32) -> Result<Vec<UpstreamMatch>, ProviderError>;

    /// Current state of a single match.
    async fn fixture(&self, id: u64) -> Result<UpstreamMatch, ProviderError>;

    /// The competition's current round according to the provider.
    async fn current_round(&self) -> Result<u32, ProviderError>;
}

/// Secondary source of goal-scorer detail.
#[async_trait]
pub trait GoalSource: Send + Sync {
    fn name(&self) -> &str;

    /// Every match of the configured league played on `date`.
    async fn matches_on(&self, date: NaiveDate) -> Result<Vec<GoalDetailMatch>, ProviderError>;

    /// Records for one match (by the provider's own id) on `date`.
    async fn match_detail(
        &self,
        match_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<GoalDetailMatch>, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered successfully but with no usable data.
    #[error("Empty response: {0}")]
    Empty(String),
}

impl ProviderError {
    /// Classify a transport error so connection problems read as `Unavailable`.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ProviderError::Unavailable(e.to_string())
        } else {
            ProviderError::Http(e)
        }
    }
}
