//! Core facade for the Corridors game service (spec §6, §9).
//!
//! Wires the Session Registry, AI Scheduler, Matchmaker, Reaper, and
//! fan-out Registry into the process-wide singletons the design calls
//! for, and exposes every inbound operation of spec §6.3 as a plain
//! async method on [`Core`]. An HTTP/WebSocket transport layer is
//! explicitly out of scope; this crate is the surface such a layer would
//! sit on top of.
mod config;
mod core;
mod error;

pub use config::ServerConfig;
pub use core::Core;
pub use core::HealthReport;
pub use error::CoreError;

pub use corridors_core::init_logging;
pub use corridors_core::install_shutdown_signal;
