//! `matchwatch-scheduler`: one watch pipeline per fixture kicking off today.
//!
//! # Overview
//!
//! [`engine::FixtureScheduler`] reads the fixture cache once a day, picks the
//! fixtures whose kickoff falls on the current calendar day in the configured
//! timezone and arms a watch task for each. A watch task sleeps until kickoff,
//! polls the fixture status until the match starts, then polls goal scorers
//! until it finishes.
//!
//! # Watch phases
//!
//! | Phase         | Behaviour                                              |
//! |---------------|--------------------------------------------------------|
//! | `Scheduled`   | Timer armed, waiting for kickoff                       |
//! | `Watching`    | Status poll every `watch_interval_secs` (60 s)         |
//! | `Live`        | Start observed; hand-off to goal polling               |
//! | `GoalPolling` | Status + scorer poll every `goal_interval_secs` (120 s) |
//! | `Finished`    | Match over or pipeline deadline reached                |
//! | `Cancelled`   | Stopped by the operator or by shutdown                 |
//!
//! Phases only move forward; a fixture is never in two phases at once.

pub mod engine;
pub mod error;
pub mod schedule;
pub mod types;
pub mod watch;

pub use engine::FixtureScheduler;
pub use error::{Result, SchedulerError};
pub use types::{WatchPhase, WatchStatus};
