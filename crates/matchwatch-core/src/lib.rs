//! Shared types and configuration for the matchwatch fixture scheduler.

pub mod config;
pub mod error;
pub mod types;

pub use config::MatchwatchConfig;
pub use error::{MatchwatchError, Result};
pub use types::{Fixture, FixtureStatus, Player, Team};
