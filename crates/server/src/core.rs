use std::sync::Arc;

use corridors_core::ConnectionId;
use corridors_core::GameId;
use corridors_core::PlayerId;
use corridors_core::Slot;
use corridors_fanout::Envelope;
use corridors_fanout::Registry as FanoutRegistry;
use corridors_fanout::spawn_heartbeat_loop;
use corridors_kernel::Kernel;
use corridors_kernel::KernelConfig;
use corridors_kernel::ReferenceKernel;
use corridors_scheduler::AiScheduler;
use corridors_scheduler::MatchOutcome;
use corridors_scheduler::Matchmaker;
use corridors_scheduler::spawn_reaper;
use corridors_session::AnalysisResult;
use corridors_session::Configuration;
use corridors_session::Hint;
use corridors_session::KernelFactory;
use corridors_session::ListFilter;
use corridors_session::MoveAuthor;
use corridors_session::PlayerSpec;
use corridors_session::PlayerStats;
use corridors_session::SessionRegistry;
use corridors_session::SessionView;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::CoreError;
use crate::ServerConfig;

/// No real kernel binary ships in this workspace (spec.md's kernel is an
/// external collaborator, out of scope); [`ReferenceKernel`] stands in as
/// the process-wide default so [`Core::new`] can mint sessions end to
/// end. A deployment linking an actual MCTS engine swaps this factory for
/// one that shells out to or links that engine instead.
fn default_kernel_factory() -> KernelFactory {
    Arc::new(|config: KernelConfig| Box::new(ReferenceKernel::new(config)) as Box<dyn Kernel>)
}

/// Snapshot returned by [`Core::health`] (spec §6.3 `health`).
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub session_count: usize,
    pub ai_worker_count: usize,
    pub matchmaking_queue_len: usize,
}

/// Wires the Session Registry, AI Scheduler, Matchmaker, Reaper, and
/// fan-out Registry into the process-wide singletons spec §9 describes,
/// and exposes the operation set of spec §6.3 as plain async methods. No
/// HTTP or WebSocket framing lives here — that collaborator is explicitly
/// out of scope; this is the surface such a layer would call into.
pub struct Core {
    pub session: Arc<SessionRegistry>,
    pub fanout: Arc<FanoutRegistry>,
    scheduler: Arc<AiScheduler>,
    matchmaker: Arc<Matchmaker>,
    reaper: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
    default_configuration: Configuration,
}

impl Core {
    /// Construct every singleton and start the Reaper and heartbeat
    /// loops. Returns an `Arc` since every long-running task above
    /// (workers, Reaper, heartbeat) and every future collaborator (an
    /// HTTP layer's handlers) needs to share ownership.
    pub fn new(config: ServerConfig) -> Arc<Core> {
        let fanout = Arc::new(FanoutRegistry::new());
        let session = Arc::new(SessionRegistry::new(fanout.clone(), default_kernel_factory()));
        let scheduler = Arc::new(AiScheduler::spawn(
            session.clone(),
            fanout.clone(),
            config.worker_count,
            config.queue_capacity,
            config.enqueue_timeout,
        ));
        // Two-phase wiring (spec §9): the Scheduler is constructed with a
        // reference to the Registry, then handed back in as a trait
        // object so the Registry can notify it without a crate cycle.
        session.set_ai_notifier(scheduler.clone());
        let matchmaker = Arc::new(Matchmaker::new(session.clone()));
        let reaper = spawn_reaper(session.clone(), config.reaper_interval, config.stale_after);
        let heartbeat = spawn_heartbeat_loop(fanout.clone(), config.heartbeat_period, config.heartbeat_miss_multiplier);
        Arc::new(Core {
            session,
            fanout,
            scheduler,
            matchmaker,
            reaper,
            heartbeat,
            default_configuration: config.default_configuration,
        })
    }

    pub fn default_configuration(&self) -> Configuration {
        self.default_configuration
    }

    pub async fn create_session(
        &self,
        configuration: Configuration,
        player1: PlayerSpec,
        player2: PlayerSpec,
    ) -> Result<SessionView, CoreError> {
        Ok(self.session.create_session(configuration, player1, player2).await?)
    }

    pub async fn get_session(&self, game_id: GameId) -> Result<SessionView, CoreError> {
        Ok(self.session.get_session(game_id).await?)
    }

    pub async fn list_sessions(&self, filter: ListFilter, limit: usize, offset: usize) -> Vec<SessionView> {
        self.session.list_sessions(filter, limit, offset).await
    }

    pub async fn delete_session(&self, game_id: GameId) -> Result<(), CoreError> {
        Ok(self.session.delete_session(game_id).await?)
    }

    pub async fn apply_move(
        &self,
        game_id: GameId,
        author: MoveAuthor,
        action: impl Into<String>,
    ) -> Result<SessionView, CoreError> {
        Ok(self.session.apply_move(game_id, author, action).await?)
    }

    pub async fn legal_moves(&self, game_id: GameId) -> Result<Vec<String>, CoreError> {
        Ok(self.session.legal_moves(game_id).await?)
    }

    pub async fn render(&self, game_id: GameId, perspective: bool) -> Result<String, CoreError> {
        Ok(self.session.render(game_id, perspective).await?)
    }

    pub async fn resign(&self, game_id: GameId, player_id: PlayerId) -> Result<Slot, CoreError> {
        Ok(self.session.resign(game_id, player_id).await?)
    }

    pub async fn analyse(&self, game_id: GameId, target_simulations: usize) -> Result<AnalysisResult, CoreError> {
        Ok(self.session.analyse(game_id, target_simulations).await?)
    }

    pub async fn hint(&self, game_id: GameId, target_simulations: usize) -> Result<Hint, CoreError> {
        Ok(self.session.hint(game_id, target_simulations).await?)
    }

    /// Register `connection_id` for `game_id`'s broadcasts and push it an
    /// immediate `game_state` snapshot over the same channel, so a fresh
    /// subscriber sees the board before the first live `move` arrives
    /// rather than waiting on someone else's turn.
    pub async fn subscribe(
        &self,
        connection_id: ConnectionId,
        sender: UnboundedSender<Envelope>,
        game_id: GameId,
    ) -> Result<(), CoreError> {
        let view = self.session.get_session(game_id).await?;
        self.fanout.subscribe(connection_id, sender.clone(), game_id).await;
        let _ = sender.send(Envelope::game_state(game_id, view.board_display));
        Ok(())
    }

    pub async fn unsubscribe(&self, connection_id: ConnectionId, game_id: GameId) {
        self.fanout.unsubscribe(connection_id, game_id).await;
    }

    pub async fn matchmaking_join(
        &self,
        player_id: PlayerId,
        display_name: impl Into<String>,
        configuration: Configuration,
    ) -> Result<MatchOutcome, CoreError> {
        Ok(self.matchmaker.join(player_id, display_name, configuration).await?)
    }

    pub async fn matchmaking_leave(&self, player_id: PlayerId) {
        self.matchmaker.leave(player_id).await;
    }

    pub async fn player_stats(&self, player: PlayerId) -> PlayerStats {
        self.session.player_stats(player).await
    }

    pub async fn leaderboard(&self, limit: usize) -> Vec<(PlayerId, PlayerStats)> {
        self.session.leaderboard(limit).await
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport {
            session_count: self.session.session_count().await,
            ai_worker_count: self.scheduler.worker_count().await,
            matchmaking_queue_len: self.matchmaker.queue_len().await,
        }
    }

    /// Reverse-order teardown (spec §9): stop the Reaper and heartbeat
    /// loops first so no new work is scheduled, drain the AI workers so
    /// none are left mid-computation, then cancel and close every
    /// remaining session's Search Adapter. Closing live subscriptions is
    /// the transport layer's responsibility (out of scope here); once
    /// every session is gone, `broadcast` on its GameId is a no-op and
    /// any still-open connection simply stops receiving traffic.
    pub async fn shutdown(&self) {
        self.reaper.abort();
        self.heartbeat.abort();
        self.scheduler.shutdown().await;
        for view in self.session.list_sessions(ListFilter::default(), usize::MAX, 0).await {
            let _ = self.session.delete_session(view.session.game_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridors_core::PlayerId;

    fn human(name: &str) -> PlayerSpec {
        PlayerSpec::human(PlayerId::default(), name)
    }

    #[tokio::test]
    async fn health_reports_session_and_worker_counts() {
        let core = Core::new(ServerConfig::test_mode());
        let before = core.health().await;
        assert_eq!(before.session_count, 0);
        assert_eq!(before.ai_worker_count, ServerConfig::test_mode().worker_count);

        core.create_session(core.default_configuration(), human("alice"), human("bob")).await.unwrap();
        let after = core.health().await;
        assert_eq!(after.session_count, 1);
    }

    #[tokio::test]
    async fn matchmaking_pairs_two_waiting_players() {
        let core = Core::new(ServerConfig::test_mode());
        let alice = PlayerId::default();
        let bob = PlayerId::default();
        let first = core.matchmaking_join(alice, "alice", Configuration::default()).await.unwrap();
        assert!(matches!(first, MatchOutcome::Waiting { position: 1 }));
        let second = core.matchmaking_join(bob, "bob", Configuration::default()).await.unwrap();
        assert!(matches!(second, MatchOutcome::Paired(_)));
        assert_eq!(core.health().await.session_count, 1);
    }

    #[tokio::test]
    async fn shutdown_cancels_open_sessions() {
        let core = Core::new(ServerConfig::test_mode());
        let created = core
            .create_session(core.default_configuration(), human("alice"), human("bob"))
            .await
            .unwrap();
        core.shutdown().await;
        let err = core.get_session(created.session.game_id).await.unwrap_err();
        assert_eq!(err, CoreError::Session(corridors_session::SessionError::NotFound));
    }
}
