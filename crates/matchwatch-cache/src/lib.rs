//! `matchwatch-cache`: fixture, roster and round state shared by the sync
//! service, the scheduler and API readers.
//!
//! # Layout
//!
//! | Key                   | Shape                         | Expiry  |
//! |-----------------------|-------------------------------|---------|
//! | `fixtures`            | ordered list of `Fixture`     | none    |
//! | `team:{id}:players`   | list of `Player`              | 7 days  |
//! | `current_round`       | scalar round number           | none    |
//!
//! Lists live in `cache_lists` (one row per element) with a marker row in
//! `cache_list_meta`, so a list that was written empty is distinguishable
//! from one that was never written.

pub mod db;
pub mod error;
pub mod round;
pub mod store;

pub use error::{CacheError, Result};
pub use round::RoundTracker;
pub use store::{roster_key, FixtureCache, FIXTURES_KEY, ROSTER_TTL_DAYS, ROUND_KEY};
