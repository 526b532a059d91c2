use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;
use std::time::SystemTime;

use corridors_core::GameId;
use corridors_core::PlayerId;
use corridors_core::Slot;
use corridors_core::TerminationReason;
use corridors_fanout::Envelope;
use corridors_fanout::Registry as FanoutRegistry;
use corridors_kernel::Kernel;
use corridors_kernel::KernelConfig;
use corridors_search::SearchAdapter;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::AiNotifier;
use crate::Configuration;
use crate::GameMode;
use crate::Move;
use crate::MoveAuthor;
use crate::PlayerKind;
use crate::PlayerSlot;
use crate::PlayerSpec;
use crate::PlayerStats;
use crate::Session;
use crate::SessionError;
use crate::SessionStatus;

/// Factory handed to the registry at construction time so it never needs
/// to know which concrete [`Kernel`] implementor backs a session — only
/// that one can be minted from a [`KernelConfig`] (spec §6.1: the native
/// kernel is an external collaborator named only at its interface).
pub type KernelFactory = Arc<dyn Fn(KernelConfig) -> Box<dyn Kernel> + Send + Sync>;

fn perspective_of(slot: Slot) -> bool {
    slot == 2
}

/// A generous default deadline for a Search Adapter call targeting
/// `target_simulations` (spec §5: "5x the expected search time"). The
/// reference kernel's rollouts run in well under a millisecond each; this
/// constant is deliberately conservative so a real kernel has headroom.
const EXPECTED_NANOS_PER_SIMULATION: u64 = 200_000;

fn generous_deadline(target_simulations: usize) -> Duration {
    let expected = Duration::from_nanos(target_simulations as u64 * EXPECTED_NANOS_PER_SIMULATION);
    expected * corridors_core::DEFAULT_DEADLINE_MULTIPLIER
}

/// Per-session guard plus its exclusively-owned Search Adapter (spec §3
/// Ownership, §5: "a per-session mutual-exclusion guard serialises
/// apply_move, resign, delete, and Reaper cancellation for that session").
struct SessionHandle {
    adapter: SearchAdapter,
    state: Mutex<Session>,
}

/// An immutable snapshot handed to callers, carrying the two read-only
/// conveniences the original game manager always returned alongside
/// session state (spec §3 Data Model supplement).
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub game_mode: GameMode,
    pub board_display: String,
}

/// Result of `analyse` (spec §4.2): the root's visit-ordered actions plus
/// its evaluation, after ensuring the requested simulation budget.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisResult {
    pub sorted_actions: Vec<(u32, f32, String)>,
    pub evaluation: Option<f32>,
}

/// Result of `hint` (spec §4.2): the kernel's best action and a
/// confidence figure derived from the fraction of visits it received.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Hint {
    pub action: String,
    pub confidence: f32,
}

/// Optional filter for `list_sessions` (spec §4.2).
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<SessionStatus>,
    pub player: Option<PlayerId>,
}

/// Owns every [`Session`] and its Search Adapter, validates and applies
/// moves, and maintains the in-memory win/loss tally (spec §4.2). The
/// process-wide registry lock of spec §5 is `sessions`, held only for map
/// insertions, lookups, and removals — never across a Search Adapter
/// suspension point.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<GameId, Arc<SessionHandle>>>,
    stats: RwLock<HashMap<PlayerId, PlayerStats>>,
    fanout: Arc<FanoutRegistry>,
    kernel_factory: KernelFactory,
    ai_notifier: OnceLock<Arc<dyn AiNotifier>>,
}

impl SessionRegistry {
    pub fn new(fanout: Arc<FanoutRegistry>, kernel_factory: KernelFactory) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            stats: RwLock::new(HashMap::new()),
            fanout,
            kernel_factory,
            ai_notifier: OnceLock::new(),
        }
    }

    /// Wire in the AI Scheduler once it exists. The Scheduler is
    /// constructed with an `Arc<SessionRegistry>` (it calls `apply_move`
    /// back into the registry), so this two-phase wiring is how the two
    /// singletons reference each other without a crate cycle (spec §9).
    /// Calling this more than once is a logic error and panics, matching
    /// the "process-wide singletons created once at core initialisation"
    /// framing of spec §9.
    pub fn set_ai_notifier(&self, notifier: Arc<dyn AiNotifier>) {
        self.ai_notifier
            .set(notifier)
            .unwrap_or_else(|_| panic!("AI notifier already wired"));
    }

    async fn notify_ai(&self, game_id: GameId) {
        if let Some(notifier) = self.ai_notifier.get() {
            notifier.notify(game_id).await;
        }
    }

    async fn handle(&self, game_id: GameId) -> Result<Arc<SessionHandle>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&game_id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    async fn view_of(&self, handle: &SessionHandle, session: Session) -> Result<SessionView, SessionError> {
        let board_display = handle.adapter.render(perspective_of(session.current_turn)).await?;
        Ok(SessionView {
            game_mode: GameMode::of(&session.players),
            board_display,
            session,
        })
    }

    async fn record_result(&self, session: &Session) {
        let Some(winner_slot) = session.winner else { return };
        let winner_id = session.players[(winner_slot - 1) as usize].player_id;
        let loser_slot = session.other_slot(winner_slot);
        let loser_id = session.players[(loser_slot - 1) as usize].player_id;
        let mut stats = self.stats.write().await;
        stats.entry(winner_id).or_default().wins += 1;
        stats.entry(loser_id).or_default().losses += 1;
    }

    /// Allocate a GameId, construct a Search Adapter from `config`, seat
    /// both players, and (if slot 1 is a machine) notify the AI Scheduler
    /// before returning (spec §4.2).
    pub async fn create_session(
        &self,
        config: Configuration,
        player1: PlayerSpec,
        player2: PlayerSpec,
    ) -> Result<SessionView, SessionError> {
        let game_id = GameId::default();
        let kernel = (self.kernel_factory)(config.into());
        let adapter = SearchAdapter::new(kernel);
        let players = [
            PlayerSlot {
                slot: 1,
                kind: player1.kind,
                player_id: player1.player_id,
                display_name: player1.display_name,
            },
            PlayerSlot {
                slot: 2,
                kind: player2.kind,
                player_id: player2.player_id,
                display_name: player2.display_name,
            },
        ];
        let now = SystemTime::now();
        let session = Session {
            game_id,
            players,
            status: SessionStatus::InProgress,
            current_turn: 1,
            move_count: 0,
            moves: Vec::new(),
            winner: None,
            termination_reason: None,
            created_at: now,
            last_activity: now,
            configuration: config,
        };
        let handle = Arc::new(SessionHandle {
            adapter,
            state: Mutex::new(session.clone()),
        });
        self.sessions.write().await.insert(game_id, handle.clone());
        log::info!("[session {}] created, slot 1 = {:?}, slot 2 = {:?}", game_id, session.players[0].kind, session.players[1].kind);
        self.fanout.broadcast(game_id, Envelope::game_created(game_id), None).await;
        if session.players[0].kind == PlayerKind::Machine {
            self.notify_ai(game_id).await;
        }
        self.view_of(&handle, session).await
    }

    pub async fn get_session(&self, game_id: GameId) -> Result<SessionView, SessionError> {
        let handle = self.handle(game_id).await?;
        let snapshot = handle.state.lock().await.clone();
        self.view_of(&handle, snapshot).await
    }

    /// Ordered by creation time descending (spec §4.2).
    pub async fn list_sessions(&self, filter: ListFilter, limit: usize, offset: usize) -> Vec<SessionView> {
        let handles: Vec<Arc<SessionHandle>> = self.sessions.read().await.values().cloned().collect();
        let mut snapshots = Vec::with_capacity(handles.len());
        for handle in &handles {
            let session = handle.state.lock().await.clone();
            if let Some(status) = filter.status {
                if session.status != status {
                    continue;
                }
            }
            if let Some(player) = filter.player {
                if session.slot_of(player).is_none() {
                    continue;
                }
            }
            snapshots.push(session);
        }
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut views = Vec::new();
        for session in snapshots.into_iter().skip(offset).take(limit) {
            let handle = self.handle(session.game_id).await;
            if let Ok(handle) = handle {
                if let Ok(view) = self.view_of(&handle, session).await {
                    views.push(view);
                }
            }
        }
        views
    }

    /// Mark cancelled, close the Search Adapter, broadcast ended, remove
    /// from the registry. Double-delete reports `NotFound` with no other
    /// effect, since removal from the map is the single idempotence point
    /// (spec §4.2, §8).
    pub async fn delete_session(&self, game_id: GameId) -> Result<(), SessionError> {
        self.terminate(game_id, TerminationReason::Cancelled).await
    }

    /// Same teardown as `delete_session`, used by the Reaper for sessions
    /// idle longer than the staleness threshold (spec §4.4).
    pub async fn reap_stale(&self, game_id: GameId) -> Result<(), SessionError> {
        self.terminate(game_id, TerminationReason::Stale).await
    }

    async fn terminate(&self, game_id: GameId, reason: TerminationReason) -> Result<(), SessionError> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&game_id).ok_or(SessionError::NotFound)?
        };
        {
            let mut guard = handle.state.lock().await;
            guard.status = SessionStatus::Cancelled;
            guard.termination_reason = Some(reason);
        }
        handle.adapter.close().await;
        log::info!("[session {}] terminated: {}", game_id, reason);
        self.fanout
            .broadcast(game_id, Envelope::game_ended(game_id, reason, None), None)
            .await;
        Ok(())
    }

    /// The seven-step `apply_move` protocol of spec §4.2: validate under
    /// the per-session guard, commit to the kernel, append history, flip
    /// turn, detect termination, release the guard, then broadcast and
    /// (if the next mover is a machine) notify the AI Scheduler.
    pub async fn apply_move(
        &self,
        game_id: GameId,
        author: MoveAuthor,
        action: impl Into<String>,
    ) -> Result<SessionView, SessionError> {
        let action = action.into();
        let handle = self.handle(game_id).await?;
        let mut guard = handle.state.lock().await;

        if guard.status != SessionStatus::InProgress {
            return Err(SessionError::NotInProgress);
        }
        let current = guard.current_slot().clone();
        if let MoveAuthor::Human(player_id) = author {
            if current.player_id != player_id {
                return Err(SessionError::NotYourTurn);
            }
        }

        let perspective = perspective_of(guard.current_turn);
        // Capture the root's evaluation of the position the move was
        // selected from *before* committing it: `apply_move` resets the
        // kernel's root stats, so asking afterward would always see a
        // fresh, unvisited root and report `None`.
        let evaluation = handle.adapter.evaluation().await.unwrap_or(None);
        handle.adapter.apply_move(action.clone(), perspective).await?;

        let move_number = guard.move_count + 1;
        guard.moves.push(Move {
            player: current.player_id,
            action: action.clone(),
            move_number,
            timestamp: SystemTime::now(),
            evaluation,
        });
        guard.move_count = move_number;
        guard.last_activity = SystemTime::now();
        let mover_slot = guard.current_turn;
        guard.current_turn = guard.other_slot(mover_slot);

        let terminal = handle.adapter.is_terminal().await?;
        if terminal {
            guard.status = SessionStatus::Completed;
            guard.winner = Some(mover_slot);
            guard.termination_reason = Some(TerminationReason::GoalReached);
        }
        let snapshot = guard.clone();
        drop(guard);

        if terminal {
            self.record_result(&snapshot).await;
        }

        self.fanout
            .broadcast(game_id, Envelope::r#move(game_id, mover_slot, action, move_number), None)
            .await;
        if terminal {
            self.fanout
                .broadcast(game_id, Envelope::game_ended(game_id, TerminationReason::GoalReached, Some(mover_slot)), None)
                .await;
        } else if snapshot.current_slot().kind == PlayerKind::Machine {
            self.notify_ai(game_id).await;
        }

        self.view_of(&handle, snapshot).await
    }

    /// If `game_id` is in progress and `player_id` is a participant, end
    /// it with the other slot as winner and reason `resignation` (spec
    /// §4.2).
    pub async fn resign(&self, game_id: GameId, player_id: PlayerId) -> Result<Slot, SessionError> {
        let handle = self.handle(game_id).await?;
        let (winner, snapshot) = {
            let mut guard = handle.state.lock().await;
            if guard.status != SessionStatus::InProgress {
                return Err(SessionError::NotInProgress);
            }
            let resigning_slot = guard.slot_of(player_id).ok_or(SessionError::NotFound)?.slot;
            let winner = guard.other_slot(resigning_slot);
            guard.status = SessionStatus::Completed;
            guard.winner = Some(winner);
            guard.termination_reason = Some(TerminationReason::Resignation);
            guard.last_activity = SystemTime::now();
            (winner, guard.clone())
        };
        self.record_result(&snapshot).await;
        self.fanout
            .broadcast(game_id, Envelope::game_ended(game_id, TerminationReason::Resignation, Some(winner)), None)
            .await;
        Ok(winner)
    }

    pub async fn legal_moves(&self, game_id: GameId) -> Result<Vec<String>, SessionError> {
        let handle = self.handle(game_id).await?;
        let actions = handle.adapter.legal_actions().await?;
        Ok(actions.into_iter().map(|a| a.to_string()).collect())
    }

    /// Ensure `target_simulations` at the root, then return the
    /// visit-ordered actions plus the evaluation (spec §4.2).
    pub async fn analyse(&self, game_id: GameId, target_simulations: usize) -> Result<AnalysisResult, SessionError> {
        let handle = self.handle(game_id).await?;
        let current_turn = handle.state.lock().await.current_turn;
        handle
            .adapter
            .ensure_budget(target_simulations, generous_deadline(target_simulations))
            .await?;
        let sorted_actions = handle
            .adapter
            .sorted_actions(perspective_of(current_turn))
            .await?
            .into_iter()
            .map(|(visits, equity, action)| (visits, equity, action.to_string()))
            .collect();
        let evaluation = handle.adapter.evaluation().await?;
        Ok(AnalysisResult { sorted_actions, evaluation })
    }

    /// Best action plus a confidence figure, the fraction of visits
    /// landing on the top action (spec §4.2).
    pub async fn hint(&self, game_id: GameId, target_simulations: usize) -> Result<Hint, SessionError> {
        let analysis = self.analyse(game_id, target_simulations).await?;
        let total_visits: u32 = analysis.sorted_actions.iter().map(|(visits, _, _)| *visits).sum();
        let (top_visits, _, action) = analysis
            .sorted_actions
            .into_iter()
            .next()
            .ok_or(SessionError::NotInProgress)?;
        let confidence = if total_visits == 0 { 0.0 } else { top_visits as f32 / total_visits as f32 };
        Ok(Hint { action, confidence })
    }

    pub async fn render(&self, game_id: GameId, perspective: bool) -> Result<String, SessionError> {
        let handle = self.handle(game_id).await?;
        Ok(handle.adapter.render(perspective).await?)
    }

    pub async fn player_stats(&self, player: PlayerId) -> PlayerStats {
        self.stats.read().await.get(&player).copied().unwrap_or_default()
    }

    /// Highest win count first (spec §4.2 `leaderboard`).
    pub async fn leaderboard(&self, limit: usize) -> Vec<(PlayerId, PlayerStats)> {
        let mut entries: Vec<(PlayerId, PlayerStats)> =
            self.stats.read().await.iter().map(|(id, stats)| (*id, *stats)).collect();
        entries.sort_by(|a, b| b.1.wins.cmp(&a.1.wins));
        entries.truncate(limit);
        entries
    }

    /// Total number of sessions currently held, regardless of status
    /// (spec §6.3 `health`).
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// GameIds whose session is in progress and has been idle longer
    /// than `older_than`, for the Reaper's sweep (spec §4.4).
    pub async fn stale_sessions(&self, older_than: Duration) -> Vec<GameId> {
        let now = SystemTime::now();
        let handles: Vec<(GameId, Arc<SessionHandle>)> =
            self.sessions.read().await.iter().map(|(id, h)| (*id, h.clone())).collect();
        let mut stale = Vec::new();
        for (game_id, handle) in handles {
            let guard = handle.state.lock().await;
            if guard.status == SessionStatus::InProgress {
                if let Ok(age) = now.duration_since(guard.last_activity) {
                    if age > older_than {
                        stale.push(game_id);
                    }
                }
            }
        }
        stale
    }
}
