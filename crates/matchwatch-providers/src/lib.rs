//! Clients for the two external fixture data providers.
//!
//! [`FixtureSource`] is authoritative for fixture existence, kickoff, status
//! and score. [`GoalSource`] supplies goal-scorer detail keyed by its own
//! match id, which has to be correlated by team pair and date.

pub mod apifootball;
pub mod football_data;
pub mod provider;

pub use apifootball::ApiFootballClient;
pub use football_data::FootballDataClient;
pub use provider::{
    FixtureSource, GoalDetailMatch, GoalEvent, GoalSource, ProviderError, ScorePair,
    UpstreamMatch,
};
