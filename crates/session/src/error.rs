use std::fmt;

/// The error surface of the Session Registry and Turn Router (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown GameId, or a player not participating in it.
    NotFound,
    /// Operation requires status = in_progress.
    NotInProgress,
    /// A human identity was supplied that does not match the current slot.
    NotYourTurn,
    /// The kernel rejected the action; carries its reason string verbatim.
    IllegalMove(String),
    /// The session's Search Adapter is already released.
    AdapterClosed,
    /// The Search Adapter call exceeded its deadline.
    EngineTimeout,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound => write!(f, "session or player not found"),
            SessionError::NotInProgress => write!(f, "session is not in progress"),
            SessionError::NotYourTurn => write!(f, "it is not that player's turn"),
            SessionError::IllegalMove(reason) => write!(f, "illegal move: {}", reason),
            SessionError::AdapterClosed => write!(f, "session's search adapter is closed"),
            SessionError::EngineTimeout => write!(f, "search engine call timed out"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<corridors_search::SearchError> for SessionError {
    fn from(err: corridors_search::SearchError) -> Self {
        match err {
            corridors_search::SearchError::AdapterClosed => SessionError::AdapterClosed,
            corridors_search::SearchError::InvalidAction(reason) => SessionError::IllegalMove(reason),
            corridors_search::SearchError::EngineTimeout => SessionError::EngineTimeout,
        }
    }
}
