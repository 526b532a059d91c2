use async_trait::async_trait;
use corridors_core::GameId;

/// Hook the Turn Router calls whenever the next mover on a game is a
/// machine (spec §4.2 `apply_move` step 7, §4.3). Implemented by the AI
/// Scheduler and handed to the [`crate::SessionRegistry`] at wiring time;
/// kept as a trait object here so `corridors-session` never depends on
/// `corridors-scheduler` (spec §9: "no cycles" — Sessions reference
/// Adapters, never the reverse, and the Scheduler only ever queues
/// GameIds, a fact this seam preserves at the crate level too).
#[async_trait]
pub trait AiNotifier: Send + Sync {
    /// Game `game_id` now has a machine owing a move. Implementations
    /// should enqueue and return quickly; this is called with no lock
    /// held (spec §5: broadcast and AI-enqueue happen after the
    /// per-session guard is released).
    async fn notify(&self, game_id: GameId);
}

/// No-op notifier for tests and for configurations that never seat a
/// machine player.
pub struct NullNotifier;

#[async_trait]
impl AiNotifier for NullNotifier {
    async fn notify(&self, _game_id: GameId) {}
}
