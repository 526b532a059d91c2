use crate::Registry;
use std::sync::Arc;
use std::time::Duration;

/// Drive `registry`'s heartbeat: every `period`, ping every subscriber and
/// disconnect anyone silent for `miss_multiplier * period` (spec §4.5).
/// Runs until the returned handle is aborted, which the core's shutdown
/// sequence does before draining AI workers.
pub fn spawn_heartbeat_loop(
    registry: Arc<Registry>,
    period: Duration,
    miss_multiplier: u32,
) -> tokio::task::JoinHandle<()> {
    let miss_after = period * miss_multiplier;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            registry.sweep_heartbeat(miss_after).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn heartbeat_loop_ticks_without_panicking() {
        let registry = Arc::new(Registry::new());
        let handle = spawn_heartbeat_loop(registry, Duration::from_millis(10), 3);
        tokio::time::advance(Duration::from_millis(35)).await;
        handle.abort();
    }
}
