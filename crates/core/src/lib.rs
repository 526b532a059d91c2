//! Core type aliases, identifiers, and constants for the corridors workspace.
//!
//! This crate provides the foundational types shared by every other crate
//! in the service: the type-safe [`ID`] wrapper used for GameIds, player
//! identifiers, and connection identifiers, and the process-wide defaults
//! for timing and concurrency (Reaper interval, heartbeat period, search
//! deadlines) named in the system design.
#![allow(dead_code)]

use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;
use std::time::Duration;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Unique identifier trait for domain entities that mint their own [`ID`].
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

/// Generic ID wrapper providing compile-time type safety over `uuid::Uuid`.
///
/// `ID<Session>` and `ID<PlayerMarker>` are distinct types even though both
/// wrap a `Uuid`, so a GameId can never be passed where a player identifier
/// is expected. Minted with UUIDv7 so ordering by ID approximates creation
/// order, which `list_sessions` relies on for its default ordering.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast `ID<T>` to `ID<U>` while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::from(uuid::Uuid::deserialize(deserializer)?))
    }
}

// ============================================================================
// DOMAIN MARKERS
// ============================================================================

/// Marker type for session identity. `ID<Session>` is the GameId of spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Session;

/// Marker type for player identity, stable across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerMarker;

/// Marker type for fan-out transport/connection identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection;

/// GameId: opaque identifier, unique within the process for the life of a Session.
pub type GameId = ID<Session>;
/// Stable player identifier, independent of any particular session.
pub type PlayerId = ID<PlayerMarker>;
/// Fan-out connection identifier, one per subscribed transport.
pub type ConnectionId = ID<Connection>;

/// Seat index around the table; slot 1 moves first (spec §3).
pub type Slot = u8;

// ============================================================================
// TIMING DEFAULTS
// ============================================================================

/// Default Reaper sweep interval in production (spec §4.4).
pub const REAPER_INTERVAL_PROD: Duration = Duration::from_secs(60);
/// Default staleness threshold in production (spec §4.4).
pub const REAPER_STALE_AFTER_PROD: Duration = Duration::from_secs(3600);
/// Reaper sweep interval under test-mode configuration.
pub const REAPER_INTERVAL_TEST: Duration = Duration::from_secs(10);
/// Staleness threshold under test-mode configuration.
pub const REAPER_STALE_AFTER_TEST: Duration = Duration::from_secs(60);

/// Default heartbeat period H (spec §4.5).
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(15);
/// Heartbeat miss multiplier K; a subscriber silent for K*H is disconnected.
pub const HEARTBEAT_MISS_MULTIPLIER: u32 = 3;

/// Simulation batch size for cooperative cancellation (spec §4.1).
pub const SIMULATION_BATCH_SIZE: usize = 100;
/// Grace period the Search Adapter waits for a cancelled batch to return.
pub const CANCELLATION_GRACE_PERIOD: Duration = Duration::from_secs(1);
/// Multiplier applied to the expected search time to derive a generous
/// default per-call deadline for Search Adapter operations (spec §5).
pub const DEFAULT_DEADLINE_MULTIPLIER: u32 = 5;

/// Default bound on the AI Scheduler's work queue (spec §4.3).
pub const DEFAULT_AI_QUEUE_CAPACITY: usize = 256;
/// Default number of AI worker tasks.
pub const DEFAULT_AI_WORKER_COUNT: usize = 4;
/// Timeout a producer waits on a full AI queue before marking a game stuck.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(2);

/// Two slots per session, always (spec §3).
pub const SLOTS_PER_SESSION: usize = 2;

// ============================================================================
// SHARED DOMAIN ENUMS
// ============================================================================

/// Why a session stopped accepting moves (spec §3, §6.4). Shared between
/// the session layer, which assigns it, and the fan-out layer, which
/// carries it on the `game_ended` envelope without interpreting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    GoalReached,
    Resignation,
    Cancelled,
    Stale,
}

impl Display for TerminationReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::GoalReached => "goal_reached",
            TerminationReason::Resignation => "resignation",
            TerminationReason::Cancelled => "cancelled",
            TerminationReason::Stale => "stale",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================

/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates a `logs/` directory and writes DEBUG level to file, INFO to
/// terminal, matching the structured logging conventions used throughout
/// this workspace (`log::debug!`/`log::info!`/`log::warn!` call sites).
#[cfg(feature = "server")]
pub fn init_logging() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register a Ctrl+C handler that flips the shutdown flag so the core's
/// teardown sequence (Reaper stop, drain AI workers, close Adapters, close
/// subscriptions) runs instead of a hard process exit.
#[cfg(feature = "server")]
pub fn install_shutdown_signal(flag: std::sync::Arc<std::sync::atomic::AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("shutdown signal received");
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });
}
