use corridors_core::ConnectionId;
use corridors_core::GameId;
use corridors_core::Slot;
use corridors_core::TerminationReason;
use serde::Serialize;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time moves forward")
        .as_millis() as u64
}

/// The outbound message envelope (spec §6.4, §3 "Subscription"/"Message
/// envelope"). The fan-out layer forwards these as opaque values — it
/// never inspects a variant to decide how to route it, only `GameId` and
/// an optional exclusion list drive delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    GameCreated {
        game_id: GameId,
        timestamp: u64,
    },
    GameState {
        game_id: GameId,
        render: String,
        timestamp: u64,
    },
    Move {
        game_id: GameId,
        player: Slot,
        action: String,
        move_number: u32,
        timestamp: u64,
    },
    GameEnded {
        game_id: GameId,
        reason: TerminationReason,
        winner: Option<Slot>,
        timestamp: u64,
    },
    PlayerConnected {
        game_id: GameId,
        connection_id: ConnectionId,
        population: usize,
        timestamp: u64,
    },
    PlayerDisconnected {
        game_id: GameId,
        connection_id: ConnectionId,
        timestamp: u64,
    },
    Ping {
        timestamp: u64,
    },
    Pong {
        timestamp: u64,
    },
    Error {
        game_id: Option<GameId>,
        correlation_id: Option<String>,
        reason: String,
        timestamp: u64,
    },
}

impl Envelope {
    pub fn game_created(game_id: GameId) -> Self {
        Envelope::GameCreated { game_id, timestamp: now_millis() }
    }

    pub fn game_state(game_id: GameId, render: String) -> Self {
        Envelope::GameState { game_id, render, timestamp: now_millis() }
    }

    pub fn r#move(game_id: GameId, player: Slot, action: String, move_number: u32) -> Self {
        Envelope::Move { game_id, player, action, move_number, timestamp: now_millis() }
    }

    pub fn game_ended(game_id: GameId, reason: TerminationReason, winner: Option<Slot>) -> Self {
        Envelope::GameEnded { game_id, reason, winner, timestamp: now_millis() }
    }

    pub fn player_connected(game_id: GameId, connection_id: ConnectionId, population: usize) -> Self {
        Envelope::PlayerConnected { game_id, connection_id, population, timestamp: now_millis() }
    }

    pub fn player_disconnected(game_id: GameId, connection_id: ConnectionId) -> Self {
        Envelope::PlayerDisconnected { game_id, connection_id, timestamp: now_millis() }
    }

    pub fn ping() -> Self {
        Envelope::Ping { timestamp: now_millis() }
    }

    pub fn pong() -> Self {
        Envelope::Pong { timestamp: now_millis() }
    }

    pub fn error(game_id: Option<GameId>, correlation_id: Option<String>, reason: String) -> Self {
        Envelope::Error { game_id, correlation_id, reason, timestamp: now_millis() }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("envelope always serializes")
    }
}
