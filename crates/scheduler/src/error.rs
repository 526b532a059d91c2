use std::fmt;

/// Error surface for the AI Scheduler and Matchmaker (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The AI queue stayed full past the producer's enqueue timeout; the
    /// game is marked stuck rather than growing the queue unboundedly
    /// (spec §4.3 Backpressure).
    QueueFull,
    /// A matchmaking ticket already exists for this player identifier.
    AlreadyQueued,
    /// Pairing succeeded at the queue level but session creation itself
    /// failed — always a bug elsewhere (an adapter that died before its
    /// first render), never ordinary backpressure.
    Internal(String),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::QueueFull => write!(f, "ai scheduler queue is full"),
            SchedulerError::AlreadyQueued => write!(f, "matchmaking ticket already exists for this player"),
            SchedulerError::Internal(reason) => write!(f, "internal scheduler error: {}", reason),
        }
    }
}

impl std::error::Error for SchedulerError {}
