use std::time::Duration;

use corridors_session::Configuration;

/// Every tunable the core needs at process start (spec §6.5): AI
/// worker-pool size and queue capacity, Reaper interval S and staleness
/// threshold T, heartbeat period H and miss multiplier K, and the
/// default search [`Configuration`] handed to sessions that don't
/// override it. Bundled into one struct with a `Default` impl, matching
/// `SchedulerConfig`'s (and the teacher's `TimerConfig`'s) convention of
/// grouping related settings instead of scattering loose constants.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
    pub reaper_interval: Duration,
    pub stale_after: Duration,
    pub heartbeat_period: Duration,
    pub heartbeat_miss_multiplier: u32,
    pub default_configuration: Configuration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            worker_count: corridors_core::DEFAULT_AI_WORKER_COUNT,
            queue_capacity: corridors_core::DEFAULT_AI_QUEUE_CAPACITY,
            enqueue_timeout: corridors_core::DEFAULT_ENQUEUE_TIMEOUT,
            reaper_interval: corridors_core::REAPER_INTERVAL_PROD,
            stale_after: corridors_core::REAPER_STALE_AFTER_PROD,
            heartbeat_period: corridors_core::HEARTBEAT_PERIOD,
            heartbeat_miss_multiplier: corridors_core::HEARTBEAT_MISS_MULTIPLIER,
            default_configuration: Configuration::default(),
        }
    }
}

impl ServerConfig {
    /// Tightened Reaper timing for integration tests (spec §6.5, §4.4);
    /// everything else keeps its production default.
    pub fn test_mode() -> Self {
        Self {
            reaper_interval: corridors_core::REAPER_INTERVAL_TEST,
            stale_after: corridors_core::REAPER_STALE_AFTER_TEST,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tightens_reaper_timing_only() {
        let default = ServerConfig::default();
        let test = ServerConfig::test_mode();
        assert_eq!(test.worker_count, default.worker_count);
        assert!(test.reaper_interval < default.reaper_interval);
        assert!(test.stale_after < default.stale_after);
    }
}
