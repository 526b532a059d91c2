//! End-to-end coverage of the six concrete scenarios (spec §8) through
//! the [`Core`] facade, exercising the Session Registry, AI Scheduler,
//! and fan-out Registry together rather than in isolation. Scenario 3
//! (duplicate AI enqueue coalescing) is exercised at the unit level in
//! `corridors-scheduler`'s own test suite, which has direct access to the
//! scheduler's internal queue; nothing here repeats it.
use std::sync::Arc;
use std::time::Duration;

use corridors_core::ConnectionId;
use corridors_core::PlayerId;
use corridors_core::TerminationReason;
use corridors_fanout::Envelope;
use corridors_kernel::Action;
use corridors_kernel::Kernel;
use corridors_kernel::KernelConfig;
use corridors_kernel::KernelError;
use corridors_kernel::ReferenceKernel;
use corridors_server::Core;
use corridors_server::ServerConfig;
use corridors_session::Configuration;
use corridors_session::MoveAuthor;
use corridors_session::PlayerSpec;
use corridors_session::SessionStatus;
use tokio::sync::mpsc::unbounded_channel;

fn human(name: &str) -> PlayerSpec {
    PlayerSpec::human(PlayerId::default(), name)
}

fn machine(name: &str) -> PlayerSpec {
    PlayerSpec::machine(PlayerId::default(), name)
}

/// Scenario 1: human-vs-human, resignation.
#[tokio::test]
async fn human_vs_human_resignation() {
    let core = Core::new(ServerConfig::test_mode());
    let alice = human("alice");
    let alice_id = alice.player_id;
    let bob = human("bob");
    let created = core.create_session(Configuration::default(), alice, bob).await.unwrap();
    let game_id = created.session.game_id;

    let legal = core.legal_moves(game_id).await.unwrap();
    core.apply_move(game_id, MoveAuthor::Human(alice_id), legal[0].clone()).await.unwrap();

    let bob_id = created.session.players[1].player_id;
    let legal = core.legal_moves(game_id).await.unwrap();
    core.apply_move(game_id, MoveAuthor::Human(bob_id), legal[0].clone()).await.unwrap();

    let resigned = core.resign(game_id, alice_id).await.unwrap();
    assert_eq!(resigned, 2);

    let view = core.get_session(game_id).await.unwrap();
    assert_eq!(view.session.status, SessionStatus::Completed);
    assert_eq!(view.session.winner, Some(2));
    assert_eq!(view.session.termination_reason, Some(TerminationReason::Resignation));
    assert_eq!(view.session.move_count, 2);

    let stats = core.player_stats(bob_id).await;
    assert_eq!(stats.wins, 1);
}

/// Scenario 2: human-vs-machine, machine owns the first move.
#[tokio::test]
async fn human_vs_machine_first_move_is_the_machine() {
    let core = Core::new(ServerConfig::test_mode());
    let created = core
        .create_session(
            Configuration { min_simulations: 20, ..Configuration::default() },
            machine("bot"),
            human("alice"),
        )
        .await
        .unwrap();
    let game_id = created.session.game_id;

    let mut moved = false;
    for _ in 0..200 {
        let view = core.get_session(game_id).await.unwrap();
        if view.session.move_count >= 1 {
            moved = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(moved, "expected the machine to play within the polling window");

    let view = core.get_session(game_id).await.unwrap();
    assert_eq!(view.session.current_turn, 2);
    assert_eq!(view.session.moves[0].player, created.session.players[0].player_id);
}

/// Scenario 4: fan-out dead subscriber.
#[tokio::test]
async fn dead_subscriber_is_dropped_survivor_still_hears_the_move() {
    let core = Core::new(ServerConfig::test_mode());
    let alice = human("alice");
    let alice_id = alice.player_id;
    let created = core.create_session(Configuration::default(), alice, human("bob")).await.unwrap();
    let game_id = created.session.game_id;

    let (tx_live, mut rx_live) = unbounded_channel();
    let (tx_dead, rx_dead) = unbounded_channel();
    core.subscribe(ConnectionId::default(), tx_live, game_id).await.unwrap();
    core.subscribe(ConnectionId::default(), tx_dead, game_id).await.unwrap();
    drop(rx_dead);
    // drain hello/game_state/player_connected noise from subscribing
    while rx_live.try_recv().is_ok() {}

    let legal = core.legal_moves(game_id).await.unwrap();
    core.apply_move(game_id, MoveAuthor::Human(alice_id), legal[0].clone()).await.unwrap();

    let mut saw_move = false;
    while let Ok(envelope) = rx_live.try_recv() {
        if matches!(envelope, Envelope::Move { .. }) {
            saw_move = true;
        }
    }
    assert!(saw_move, "surviving subscriber should receive the move broadcast");
    assert_eq!(core.fanout.room_population(game_id).await, 1);
}

/// Scenario 5: engine timeout. A kernel whose `run_simulations` blocks
/// far longer than the Search Adapter's per-call deadline must surface
/// `EngineTimeout` through `analyse`, leaving session state untouched and
/// producing no broadcast.
struct SlowKernel(ReferenceKernel);

impl Kernel for SlowKernel {
    fn run_simulations(&mut self, n: usize) -> usize {
        std::thread::sleep(Duration::from_millis(50));
        self.0.run_simulations(n)
    }
    fn apply_move(&mut self, action: Action, perspective: bool) -> Result<(), KernelError> {
        self.0.apply_move(action, perspective)
    }
    fn best_action(&self, epsilon: f32) -> Action {
        self.0.best_action(epsilon)
    }
    fn sorted_actions(&self, perspective: bool) -> Vec<(u32, f32, Action)> {
        self.0.sorted_actions(perspective)
    }
    fn evaluation(&self) -> Option<f32> {
        self.0.evaluation()
    }
    fn visit_count(&self) -> usize {
        self.0.visit_count()
    }
    fn render(&self, perspective: bool) -> String {
        self.0.render(perspective)
    }
    fn reset(&mut self) {
        self.0.reset()
    }
    fn is_terminal(&self) -> bool {
        self.0.is_terminal()
    }
    fn legal_actions(&self) -> Vec<Action> {
        self.0.legal_actions()
    }
}

// Real (unpaused) clock: `SlowKernel` blocks a real OS thread for 50ms,
// comfortably inside the adapter's 1s cancellation grace period, so the
// kernel is always recovered and the session stays usable afterward.
#[tokio::test]
async fn engine_timeout_leaves_session_untouched() {
    let fanout = Arc::new(corridors_fanout::Registry::new());
    let factory: corridors_session::KernelFactory =
        Arc::new(|config: KernelConfig| Box::new(SlowKernel(ReferenceKernel::new(config))));
    let registry = Arc::new(corridors_session::SessionRegistry::new(fanout, factory));
    let created = registry
        .create_session(Configuration::default(), human("alice"), human("bob"))
        .await
        .unwrap();
    let game_id = created.session.game_id;

    let err = registry.analyse(game_id, 1).await.unwrap_err();
    assert_eq!(err, corridors_session::SessionError::EngineTimeout);

    let view = registry.get_session(game_id).await.unwrap();
    assert_eq!(view.session.move_count, 0);
    assert_eq!(view.session.status, SessionStatus::InProgress);
}

/// Scenario 6: stale reaping under test mode, using the exact S = 1s,
/// T = 2s the scenario names (tighter than [`ServerConfig::test_mode`]'s
/// own defaults, which favor slower integration-test suites over this
/// specific timing).
#[tokio::test(start_paused = true)]
async fn stale_session_is_reaped_under_test_mode() {
    let core = Core::new(ServerConfig {
        reaper_interval: Duration::from_secs(1),
        stale_after: Duration::from_secs(2),
        ..ServerConfig::test_mode()
    });
    let created = core
        .create_session(Configuration::default(), human("alice"), human("bob"))
        .await
        .unwrap();
    let game_id = created.session.game_id;

    tokio::time::advance(Duration::from_secs(4)).await;
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    let err = core.get_session(game_id).await.unwrap_err();
    assert_eq!(err, corridors_server::CoreError::Session(corridors_session::SessionError::NotFound));

    core.shutdown().await;
}
