use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corridors_core::GameId;
use corridors_fanout::Envelope;
use corridors_fanout::Registry as FanoutRegistry;
use corridors_session::AiNotifier;
use corridors_session::MoveAuthor;
use corridors_session::PlayerKind;
use corridors_session::SessionError;
use corridors_session::SessionRegistry;
use corridors_session::SessionStatus;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::SchedulerError;

struct Shared {
    registry: Arc<SessionRegistry>,
    fanout: Arc<FanoutRegistry>,
    pending: Mutex<HashSet<GameId>>,
}

/// Converts "a machine player owes a move on game G" into an applied move
/// without blocking callers (spec §4.3): a bounded queue of GameIds fed
/// by a fixed pool of worker tasks, each pulling one id, ensuring the
/// session's minimum simulation budget, and feeding the chosen action
/// back through the Turn Router.
pub struct AiScheduler {
    shared: Arc<Shared>,
    sender: Mutex<Option<mpsc::Sender<GameId>>>,
    enqueue_timeout: Duration,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl AiScheduler {
    pub fn spawn(
        registry: Arc<SessionRegistry>,
        fanout: Arc<FanoutRegistry>,
        worker_count: usize,
        queue_capacity: usize,
        enqueue_timeout: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let shared = Arc::new(Shared {
            registry,
            fanout,
            pending: Mutex::new(HashSet::new()),
        });
        let workers = (0..worker_count.max(1))
            .map(|index| {
                let shared = shared.clone();
                let receiver = receiver.clone();
                tokio::spawn(async move { worker_loop(index, shared, receiver).await })
            })
            .collect();
        Self {
            shared,
            sender: Mutex::new(Some(sender)),
            enqueue_timeout,
            workers: Mutex::new(workers),
        }
    }

    /// Enqueue `game_id`, coalescing with any identical id already
    /// pending (spec §4.3: "a given GameId may appear at most once in the
    /// queue at any time"). Blocks the caller up to `enqueue_timeout` if
    /// the queue is full; past that the game is marked stuck and
    /// broadcast as such rather than growing the queue without bound.
    pub async fn enqueue(&self, game_id: GameId) -> Result<(), SchedulerError> {
        {
            let mut pending = self.shared.pending.lock().await;
            if !pending.insert(game_id) {
                log::debug!("[scheduler] {} already queued, coalescing", game_id);
                return Ok(());
            }
        }
        let Some(sender) = self.sender.lock().await.clone() else {
            self.shared.pending.lock().await.remove(&game_id);
            return Err(SchedulerError::QueueFull);
        };
        match tokio::time::timeout(self.enqueue_timeout, sender.send(game_id)).await {
            Ok(Ok(())) => Ok(()),
            _ => {
                self.shared.pending.lock().await.remove(&game_id);
                log::warn!("[scheduler] queue full past {:?}, marking {} stuck", self.enqueue_timeout, game_id);
                self.shared
                    .fanout
                    .broadcast(
                        game_id,
                        Envelope::error(Some(game_id), None, "ai scheduler queue full; game stuck".to_string()),
                        None,
                    )
                    .await;
                Err(SchedulerError::QueueFull)
            }
        }
    }

    pub async fn worker_count(&self) -> usize {
        self.workers.lock().await.len()
    }

    /// Stop accepting new work and wait for in-flight workers to drain,
    /// part of the core's reverse-order shutdown sequence (spec §9).
    /// Takes `&self` rather than `self` because the core facade holds
    /// this scheduler behind the same `Arc` it hands to the Session
    /// Registry as an [`AiNotifier`] trait object, so no caller can ever
    /// hold sole ownership to consume by value; dropping the one
    /// `Sender` clone this struct owns closes the channel, which is what
    /// actually tells every worker to stop.
    pub async fn shutdown(&self) {
        self.sender.lock().await.take();
        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            let _ = worker.await;
        }
    }
}

#[async_trait]
impl AiNotifier for AiScheduler {
    async fn notify(&self, game_id: GameId) {
        let _ = self.enqueue(game_id).await;
    }
}

async fn worker_loop(index: usize, shared: Arc<Shared>, receiver: Arc<Mutex<mpsc::Receiver<GameId>>>) {
    loop {
        let game_id = {
            let mut receiver = receiver.lock().await;
            match receiver.recv().await {
                Some(game_id) => game_id,
                None => break,
            }
        };
        shared.pending.lock().await.remove(&game_id);
        if let Err(err) = process_one(&shared.registry, game_id).await {
            match err {
                SessionError::AdapterClosed | SessionError::NotFound | SessionError::NotInProgress => {
                    log::warn!("[ai worker {}] {} gone mid-computation, dropping work", index, game_id);
                }
                other => {
                    log::error!("[ai worker {}] {} failed: {}", index, game_id, other);
                    let _ = shared.registry.delete_session(game_id).await;
                }
            }
        }
    }
}

/// Dequeue → snapshot → (if still in progress and it's a machine's turn)
/// ensure budget, obtain the chosen action, re-enter the Turn Router
/// (spec §4.3).
async fn process_one(registry: &Arc<SessionRegistry>, game_id: GameId) -> Result<(), SessionError> {
    let view = registry.get_session(game_id).await?;
    if view.session.status != SessionStatus::InProgress {
        return Ok(());
    }
    if view.session.current_slot().kind != PlayerKind::Machine {
        return Ok(());
    }
    let target = view.session.configuration.min_simulations;
    let hint = registry.hint(game_id, target).await?;
    registry.apply_move(game_id, MoveAuthor::Machine, hint.action).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridors_kernel::KernelConfig;
    use corridors_kernel::ReferenceKernel;
    use corridors_session::Configuration;
    use corridors_session::KernelFactory;
    use corridors_session::PlayerSpec;
    use std::time::Duration;

    fn factory() -> KernelFactory {
        Arc::new(|config: KernelConfig| Box::new(ReferenceKernel::new(config)))
    }

    fn env() -> (Arc<SessionRegistry>, Arc<FanoutRegistry>) {
        let fanout = Arc::new(FanoutRegistry::new());
        let registry = Arc::new(SessionRegistry::new(fanout.clone(), factory()));
        (registry, fanout)
    }

    #[tokio::test]
    async fn machine_first_move_applies_exactly_one_move() {
        let (registry, fanout) = env();
        let scheduler = Arc::new(AiScheduler::spawn(registry.clone(), fanout, 2, 16, Duration::from_secs(1)));
        registry.set_ai_notifier(scheduler.clone());

        let machine = PlayerSpec::machine(corridors_core::PlayerId::default(), "bot");
        let human = PlayerSpec::human(corridors_core::PlayerId::default(), "alice");
        let created = registry
            .create_session(Configuration { min_simulations: 20, ..Configuration::default() }, machine, human)
            .await
            .unwrap();
        let game_id = created.session.game_id;

        for _ in 0..200 {
            let view = registry.get_session(game_id).await.unwrap();
            if view.session.move_count >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let view = registry.get_session(game_id).await.unwrap();
        assert_eq!(view.session.move_count, 1);
        assert_eq!(view.session.current_turn, 2);
    }

    #[tokio::test]
    async fn duplicate_enqueue_yields_exactly_one_applied_move() {
        let (registry, fanout) = env();
        let scheduler = Arc::new(AiScheduler::spawn(registry.clone(), fanout, 1, 16, Duration::from_secs(1)));
        registry.set_ai_notifier(scheduler.clone());

        let machine = PlayerSpec::machine(corridors_core::PlayerId::default(), "bot");
        let human = PlayerSpec::human(corridors_core::PlayerId::default(), "alice");
        let created = registry
            .create_session(Configuration { min_simulations: 20, ..Configuration::default() }, machine, human)
            .await
            .unwrap();
        let game_id = created.session.game_id;

        // `create_session` already queued this game once; fire two more
        // concurrent enqueue requests for the same id while the worker
        // may still be busy with the first (spec §8 scenario 3).
        let (a, b) = tokio::join!(scheduler.enqueue(game_id), scheduler.enqueue(game_id));
        assert!(a.is_ok());
        assert!(b.is_ok());

        for _ in 0..200 {
            let view = registry.get_session(game_id).await.unwrap();
            if view.session.move_count >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let view = registry.get_session(game_id).await.unwrap();
        assert_eq!(view.session.move_count, 1);
    }

    #[tokio::test]
    async fn shutdown_drains_workers_and_closes_the_queue() {
        let (registry, fanout) = env();
        let scheduler = AiScheduler::spawn(registry, fanout, 2, 16, Duration::from_secs(1));
        assert_eq!(scheduler.worker_count().await, 2);
        scheduler.shutdown().await;
        let err = scheduler.enqueue(corridors_core::GameId::default()).await.unwrap_err();
        assert_eq!(err, SchedulerError::QueueFull);
    }
}
