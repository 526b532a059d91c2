//! Real-time fan-out layer (spec §4.5): a per-room subscription registry
//! with dead-connection reaping, guaranteed per-destination delivery
//! ordering, and heartbeat-driven liveness. Messages are opaque
//! [`Envelope`] values; this crate never inspects payload content to
//! decide how to route it.
mod envelope;
mod heartbeat;
mod registry;

pub use envelope::Envelope;
pub use heartbeat::spawn_heartbeat_loop;
pub use registry::Registry;
