//! `matchwatch-sync`: pulls fixtures and goal detail from the providers and
//! reconciles them into the fixture cache.

pub mod error;
pub mod goals;
pub mod reference;
pub mod service;

pub use error::{Result, SyncError};
pub use goals::{partition_scorers, GoalScorers};
pub use reference::{StaticTeamDirectory, TeamDirectory};
pub use service::FixtureSyncService;
