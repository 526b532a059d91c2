use std::fmt;

use corridors_scheduler::SchedulerError;
use corridors_session::SessionError;

/// Unified error surface of the [`crate::Core`] facade (spec §7), composed
/// from the per-crate error enums the same way the teacher composes
/// `gameroom::ProtocolError` and `hosting`'s `anyhow::Error` behind a
/// single API boundary — except here every source variant is preserved
/// instead of collapsed to a string, since callers (an HTTP/WebSocket
/// layer, out of scope here) need to distinguish `NotFound` from
/// `QueueFull` to pick a status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    Session(SessionError),
    Scheduler(SchedulerError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Session(err) => write!(f, "{}", err),
            CoreError::Scheduler(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<SessionError> for CoreError {
    fn from(err: SessionError) -> Self {
        CoreError::Session(err)
    }
}

impl From<SchedulerError> for CoreError {
    fn from(err: SchedulerError) -> Self {
        CoreError::Scheduler(err)
    }
}
