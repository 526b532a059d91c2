use std::sync::Arc;
use std::time::Duration;

use corridors_session::SessionRegistry;
use tokio::task::JoinHandle;

/// Periodically (every `interval`, spec's S) scan the Session Registry
/// and cancel any in-progress session idle longer than `stale_after`
/// (spec's T), closing its Search Adapter and broadcasting `game_ended`
/// with reason `stale` (spec §4.4). Runs until the returned handle is
/// aborted, which the core's shutdown sequence does before draining AI
/// workers.
pub fn spawn(registry: Arc<SessionRegistry>, interval: Duration, stale_after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let stale = registry.stale_sessions(stale_after).await;
            if stale.is_empty() {
                continue;
            }
            log::info!("[reaper] sweeping {} stale session(s)", stale.len());
            for game_id in stale {
                match registry.reap_stale(game_id).await {
                    Ok(()) => log::info!("[reaper] cancelled stale session {}", game_id),
                    Err(err) => log::debug!("[reaper] {} already gone: {}", game_id, err),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridors_core::PlayerId;
    use corridors_fanout::Registry as FanoutRegistry;
    use corridors_kernel::KernelConfig;
    use corridors_kernel::ReferenceKernel;
    use corridors_session::Configuration;
    use corridors_session::KernelFactory;
    use corridors_session::PlayerSpec;

    #[tokio::test(start_paused = true)]
    async fn sweep_cancels_sessions_idle_past_threshold() {
        let fanout = Arc::new(FanoutRegistry::new());
        let factory: KernelFactory = Arc::new(|config: KernelConfig| Box::new(ReferenceKernel::new(config)));
        let registry = Arc::new(SessionRegistry::new(fanout, factory));
        let created = registry
            .create_session(
                Configuration::default(),
                PlayerSpec::human(PlayerId::default(), "alice"),
                PlayerSpec::human(PlayerId::default(), "bob"),
            )
            .await
            .unwrap();
        let game_id = created.session.game_id;

        let handle = spawn(registry.clone(), Duration::from_secs(1), Duration::from_secs(2));
        tokio::time::advance(Duration::from_secs(4)).await;
        // give the reaper's spawned task a chance to run after the clock jump
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.abort();

        let err = registry.get_session(game_id).await.unwrap_err();
        assert_eq!(err, corridors_session::SessionError::NotFound);
    }
}
