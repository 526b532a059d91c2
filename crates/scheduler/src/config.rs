use std::time::Duration;

/// Bundled scheduler-facing configuration (spec §6.5), matching the
/// teacher's `TimerConfig` convention of grouping related durations into
/// one struct with a `Default` impl rather than scattering loose
/// constants through call sites.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub enqueue_timeout: Duration,
    pub reaper_interval: Duration,
    pub stale_after: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: corridors_core::DEFAULT_AI_WORKER_COUNT,
            queue_capacity: corridors_core::DEFAULT_AI_QUEUE_CAPACITY,
            enqueue_timeout: corridors_core::DEFAULT_ENQUEUE_TIMEOUT,
            reaper_interval: corridors_core::REAPER_INTERVAL_PROD,
            stale_after: corridors_core::REAPER_STALE_AFTER_PROD,
        }
    }
}

impl SchedulerConfig {
    /// Tightened Reaper interval/threshold so integration tests can
    /// exercise the stale-reaping path without waiting an hour (spec
    /// §4.4, §6.5).
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
        let default = SchedulerConfig::default();
        let test = SchedulerConfig::test_mode();
        assert_eq!(test.worker_count, default.worker_count);
        assert_eq!(test.queue_capacity, default.queue_capacity);
        assert!(test.reaper_interval < default.reaper_interval);
        assert!(test.stale_after < default.stale_after);
    }
}
