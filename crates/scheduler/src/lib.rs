//! AI Scheduler, Matchmaker, and Reaper (spec §4.3, §4.4).
//!
//! [`AiScheduler`] converts "a machine player owes a move" into an
//! applied move without blocking callers; it implements
//! [`corridors_session::AiNotifier`] so the Session Registry can notify it
//! without depending on this crate. [`Matchmaker`] pairs waiting human
//! players into new sessions. [`spawn_reaper`] periodically cancels
//! sessions idle past a staleness threshold.
mod ai;
mod config;
mod error;
mod matchmaker;
mod reaper;

pub use ai::AiScheduler;
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use matchmaker::MatchOutcome;
pub use matchmaker::Matchmaker;
pub use reaper::spawn as spawn_reaper;
