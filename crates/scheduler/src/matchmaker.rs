use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;

use corridors_core::GameId;
use corridors_core::PlayerId;
use corridors_session::Configuration;
use corridors_session::MatchmakingTicket;
use corridors_session::PlayerSpec;
use corridors_session::SessionRegistry;
use tokio::sync::Mutex;

use crate::SchedulerError;

/// Outcome of [`Matchmaker::join`]: either this call completed the pair
/// and a session now exists, or the ticket is waiting at `position` in
/// the FIFO queue (spec §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Paired(GameId),
    Waiting { position: usize },
}

/// Single FIFO ticket queue pairing two waiting human players into a new
/// session (spec §4.3, §3 MatchmakingTicket). At most one active ticket
/// per player identifier.
pub struct Matchmaker {
    registry: Arc<SessionRegistry>,
    queue: Mutex<VecDeque<MatchmakingTicket>>,
}

impl Matchmaker {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry, queue: Mutex::new(VecDeque::new()) }
    }

    /// Enqueue a ticket for `player_id`. If another ticket is already
    /// waiting, immediately pairs them, creates a session with both as
    /// human slots, and consumes both tickets (spec §4.3). Fails
    /// `AlreadyQueued` if this player already has a ticket waiting.
    pub async fn join(
        &self,
        player_id: PlayerId,
        display_name: impl Into<String>,
        configuration: Configuration,
    ) -> Result<MatchOutcome, SchedulerError> {
        let display_name = display_name.into();
        let mut queue = self.queue.lock().await;
        if queue.iter().any(|ticket| ticket.player_id == player_id) {
            return Err(SchedulerError::AlreadyQueued);
        }
        if let Some(opponent) = queue.pop_front() {
            drop(queue);
            let player1 = PlayerSpec::human(opponent.player_id, opponent.display_name);
            let player2 = PlayerSpec::human(player_id, display_name);
            let view = self
                .registry
                .create_session(opponent.configuration, player1, player2)
                .await
                .map_err(|err| SchedulerError::Internal(err.to_string()))?;
            log::info!(
                "[matchmaker] paired {} and {} into {}",
                opponent.player_id,
                player_id,
                view.session.game_id
            );
            return Ok(MatchOutcome::Paired(view.session.game_id));
        }
        queue.push_back(MatchmakingTicket {
            player_id,
            display_name,
            configuration,
            enqueue_time: SystemTime::now(),
        });
        Ok(MatchOutcome::Waiting { position: queue.len() })
    }

    /// Remove `player_id`'s ticket. A no-op if none exists (spec §8).
    pub async fn leave(&self, player_id: PlayerId) {
        self.queue.lock().await.retain(|ticket| ticket.player_id != player_id);
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }
}
