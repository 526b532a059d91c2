//! Session Registry and Turn Router (spec §4.2).
//!
//! Owns every [`Session`], exposes create/get/list/delete, validates and
//! applies moves under a per-session guard, and maintains the in-memory
//! win/loss tally. The registry never reaches into the AI Scheduler
//! directly — it calls an [`AiNotifier`] trait object wired in after
//! construction, keeping the dependency graph acyclic (spec §9).
mod error;
mod notifier;
mod registry;
mod types;

pub use error::SessionError;
pub use notifier::AiNotifier;
pub use notifier::NullNotifier;
pub use registry::AnalysisResult;
pub use registry::Hint;
pub use registry::KernelFactory;
pub use registry::ListFilter;
pub use registry::SessionRegistry;
pub use registry::SessionView;
pub use types::Configuration;
pub use types::GameMode;
pub use types::MatchmakingTicket;
pub use types::Move;
pub use types::MoveAuthor;
pub use types::PlayerKind;
pub use types::PlayerSlot;
pub use types::PlayerSpec;
pub use types::PlayerStats;
pub use types::Session;
pub use types::SessionStatus;
