use corridors_core::GameId;
use corridors_core::PlayerId;
use corridors_core::Slot;
use corridors_core::TerminationReason;
use corridors_kernel::KernelConfig;
use serde::Serialize;
use std::time::SystemTime;

/// Whether a slot is filled by a human client or a machine player (spec
/// §9: "a tagged variant {human, machine} rather than inheritance").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    Human,
    Machine,
}

/// A request to fill one slot of a new session.
#[derive(Debug, Clone)]
pub struct PlayerSpec {
    pub kind: PlayerKind,
    pub player_id: PlayerId,
    pub display_name: String,
}

impl PlayerSpec {
    pub fn human(player_id: PlayerId, display_name: impl Into<String>) -> Self {
        Self { kind: PlayerKind::Human, player_id, display_name: display_name.into() }
    }
    pub fn machine(player_id: PlayerId, display_name: impl Into<String>) -> Self {
        Self { kind: PlayerKind::Machine, player_id, display_name: display_name.into() }
    }
}

/// One of the two seats at a session (spec §3). Filled at creation,
/// immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSlot {
    pub slot: Slot,
    pub kind: PlayerKind,
    pub player_id: PlayerId,
    pub display_name: String,
}

/// Who is authoring a proposed move. `Machine` is the sentinel that
/// bypasses the current-slot identity check (spec §4.3): the AI Scheduler
/// calls `apply_move` with this rather than a player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAuthor {
    Human(PlayerId),
    Machine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// One applied move (spec §3). Move numbers are dense and strictly
/// increasing per session, starting at 1.
#[derive(Debug, Clone, Serialize)]
pub struct Move {
    pub player: PlayerId,
    pub action: String,
    pub move_number: u32,
    pub timestamp: SystemTime,
    pub evaluation: Option<f32>,
}

/// Search-variant configuration snapshotted at session creation and
/// passed to the Search Adapter's kernel constructor (spec §3). Immutable
/// for the life of the session.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Configuration {
    pub exploration: f32,
    pub seed: u64,
    pub min_simulations: usize,
    pub max_simulations: usize,
    pub use_rollout: bool,
    pub decide_using_visits: bool,
    /// Whether the kernel should evaluate and factor in children nodes
    /// rather than the root alone when forming its best-action decision.
    /// Folded in from the original's `MCTSSettings` (§3 supplement);
    /// passed verbatim to the kernel constructor, never interpreted here.
    pub eval_children: bool,
    /// Whether the kernel's decision/selection policy uses PUCT rather
    /// than plain UCB1. Passed verbatim to the kernel constructor.
    pub use_puct: bool,
    /// Whether the kernel weighs candidate actions by a learned prior
    /// policy distribution rather than uniformly. Passed verbatim to the
    /// kernel constructor.
    pub use_probs: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            exploration: (0.025f32).sqrt(),
            seed: 42,
            min_simulations: 200,
            max_simulations: 10_000,
            use_rollout: true,
            decide_using_visits: true,
            eval_children: false,
            use_puct: false,
            use_probs: false,
        }
    }
}

impl From<Configuration> for KernelConfig {
    fn from(config: Configuration) -> Self {
        KernelConfig {
            exploration: config.exploration,
            seed: config.seed,
            use_rollout: config.use_rollout,
            decide_using_visits: config.decide_using_visits,
            eval_children: config.eval_children,
            use_puct: config.use_puct,
            use_probs: config.use_probs,
        }
    }
}

/// An immutable snapshot of a session's state, safe to hand to other
/// components without further synchronization (spec §9 "Snapshot").
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub game_id: GameId,
    pub players: [PlayerSlot; 2],
    pub status: SessionStatus,
    pub current_turn: Slot,
    pub move_count: u32,
    pub moves: Vec<Move>,
    pub winner: Option<Slot>,
    pub termination_reason: Option<TerminationReason>,
    pub created_at: SystemTime,
    pub last_activity: SystemTime,
    pub configuration: Configuration,
}

impl Session {
    pub fn slot_of(&self, player_id: PlayerId) -> Option<&PlayerSlot> {
        self.players.iter().find(|slot| slot.player_id == player_id)
    }

    pub fn current_slot(&self) -> &PlayerSlot {
        &self.players[(self.current_turn - 1) as usize]
    }

    pub fn other_slot(&self, slot: Slot) -> Slot {
        if slot == 1 { 2 } else { 1 }
    }
}

/// Derived from the two slots' kinds, not stored redundantly (spec §3
/// Data Model supplement, from `original_source/backend/utils/types.py`).
/// Informational only: it drives no invariant, just snapshot fields and
/// AI-enqueue decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Pvp,
    Pvm,
    Mvm,
}

impl GameMode {
    pub fn of(players: &[PlayerSlot; 2]) -> Self {
        match (players[0].kind, players[1].kind) {
            (PlayerKind::Human, PlayerKind::Human) => GameMode::Pvp,
            (PlayerKind::Machine, PlayerKind::Machine) => GameMode::Mvm,
            _ => GameMode::Pvm,
        }
    }
}

/// Aggregated win/loss tally for a player (spec §4.2 player_stats).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PlayerStats {
    pub wins: u32,
    pub losses: u32,
}

/// A pending matchmaking entry (spec §3).
#[derive(Debug, Clone)]
pub struct MatchmakingTicket {
    pub player_id: PlayerId,
    pub display_name: String,
    pub configuration: Configuration,
    pub enqueue_time: SystemTime,
}
