use crate::AdapterState;
use crate::SearchError;
use corridors_kernel::Action;
use corridors_kernel::Kernel;
use std::sync::Arc;
use std::sync::Mutex as SyncMutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// An async, cancellable, thread-safe shell around a synchronous
/// [`Kernel`] (spec §5). The kernel never runs on the async executor's own
/// thread: every touch goes through `spawn_blocking`, so one slow search
/// call cannot stall the runtime's other tasks. `run_simulations` and
/// `ensure_budget` are the only operations that iterate in batches and
/// honor cooperative cancellation; every other call is a single
/// `spawn_blocking` round trip.
pub struct SearchAdapter {
    kernel: Arc<AsyncMutex<Option<Box<dyn Kernel>>>>,
    cancel: Arc<AtomicBool>,
    state: Arc<SyncMutex<AdapterState>>,
    closed: Arc<AtomicBool>,
}

impl SearchAdapter {
    pub fn new(kernel: Box<dyn Kernel>) -> Self {
        Self {
            kernel: Arc::new(AsyncMutex::new(Some(kernel))),
            cancel: Arc::new(AtomicBool::new(false)),
            state: Arc::new(SyncMutex::new(AdapterState::Fresh)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> AdapterState {
        *self.state.lock().expect("state mutex poisoned")
    }

    fn set_state(&self, next: AdapterState) {
        *self.state.lock().expect("state mutex poisoned") = next;
    }

    fn ensure_open(&self) -> Result<(), SearchError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(SearchError::AdapterClosed)
        } else {
            Ok(())
        }
    }

    /// Request cancellation of any batch currently in flight. Idempotent;
    /// safe to call whether or not a call is outstanding.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Close the adapter, dropping the owned kernel. Idempotent: a second
    /// call is a no-op rather than an error, matching the reference
    /// cleanup's idempotent-close contract.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.store(true, Ordering::SeqCst);
        let mut guard = self.kernel.lock().await;
        guard.take();
        self.set_state(AdapterState::Closed);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn with_kernel_blocking<F, R>(&self, f: F) -> Result<R, SearchError>
    where
        F: FnOnce(&mut dyn Kernel) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.ensure_open()?;
        let mut guard = self.kernel.lock().await;
        let mut kernel = guard.take().ok_or(SearchError::AdapterClosed)?;
        let handle = tokio::task::spawn_blocking(move || {
            let result = f(kernel.as_mut());
            (kernel, result)
        });
        let (kernel, result) = handle.await.expect("kernel worker task panicked");
        *guard = Some(kernel);
        Ok(result)
    }

    /// Run one batch of up to `batch` simulations, honoring `per_call_deadline`
    /// and the shared cancel flag. On timeout, signals cancellation and gives
    /// the in-flight batch [`corridors_core::CANCELLATION_GRACE_PERIOD`] to
    /// notice and return before giving up on recovering the kernel.
    async fn execute_batch(&self, batch: usize, per_call_deadline: Duration) -> Result<usize, SearchError> {
        let mut guard = self.kernel.lock().await;
        let mut kernel = guard.take().ok_or(SearchError::AdapterClosed)?;
        let cancel = self.cancel.clone();
        let mut handle = tokio::task::spawn_blocking(move || {
            let done = if cancel.load(Ordering::SeqCst) {
                0
            } else {
                kernel.run_simulations(batch)
            };
            (kernel, done)
        });

        tokio::select! {
            joined = &mut handle => {
                let (kernel, done) = joined.expect("kernel worker task panicked");
                *guard = Some(kernel);
                Ok(done)
            }
            _ = tokio::time::sleep(per_call_deadline) => {
                self.cancel.store(true, Ordering::SeqCst);
                tokio::select! {
                    joined = &mut handle => {
                        let (kernel, _done) = joined.expect("kernel worker task panicked");
                        *guard = Some(kernel);
                        Err(SearchError::EngineTimeout)
                    }
                    _ = tokio::time::sleep(corridors_core::CANCELLATION_GRACE_PERIOD) => {
                        log::error!("kernel batch ignored cancellation past its grace period; adapter kernel lost");
                        Err(SearchError::EngineTimeout)
                    }
                }
            }
        }
    }

    /// Run up to `n` additional simulations, stopping early if `deadline`
    /// elapses or the kernel reports it can't make further progress
    /// (`run_simulations` on a batch returning 0). Returns the number of
    /// simulations actually completed even when it returns `Err` for a
    /// timeout, so callers can still read a partial result via
    /// `visit_count`.
    pub async fn run_simulations(&self, n: usize, deadline: Duration) -> Result<usize, SearchError> {
        self.ensure_open()?;
        self.set_state(AdapterState::Running);
        self.cancel.store(false, Ordering::SeqCst);
        let deadline_at = Instant::now() + deadline;
        let mut completed = 0usize;
        while completed < n {
            let remaining = deadline_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.set_state(AdapterState::Idle);
                return Err(SearchError::EngineTimeout);
            }
            let batch = (n - completed).min(corridors_core::SIMULATION_BATCH_SIZE);
            match self.execute_batch(batch, remaining).await {
                Ok(done) => {
                    completed += done;
                    if done == 0 {
                        break;
                    }
                }
                Err(err) => {
                    self.set_state(AdapterState::Idle);
                    return Err(err);
                }
            }
        }
        self.set_state(AdapterState::Idle);
        Ok(completed)
    }

    /// Top up the root to at least `target` total simulations, running
    /// only the shortfall. Mirrors the reference implementation's
    /// ensure-budget helper used by the Turn Router before it asks for a
    /// best action.
    pub async fn ensure_budget(&self, target: usize, deadline: Duration) -> Result<usize, SearchError> {
        let current = self.visit_count().await?;
        if current >= target {
            return Ok(current);
        }
        self.run_simulations(target - current, deadline).await
    }

    /// Commit a move given as a raw action string (spec §6.2 grammar). The
    /// string is parsed here, inside the kernel's boundary, not by any
    /// caller upstream of the Adapter — callers forward action text
    /// verbatim without ever inspecting its grammar.
    pub async fn apply_move(&self, action: impl Into<String>, perspective: bool) -> Result<(), SearchError> {
        let action = action.into();
        let outcome = self
            .with_kernel_blocking(move |kernel| match action.parse::<Action>() {
                Ok(action) => kernel.apply_move(action, perspective),
                Err(err) => Err(corridors_kernel::KernelError::InvalidAction(err.to_string())),
            })
            .await?;
        outcome.map_err(SearchError::from)
    }

    pub async fn best_action(&self, epsilon: f32) -> Result<Action, SearchError> {
        self.with_kernel_blocking(move |kernel| kernel.best_action(epsilon)).await
    }

    pub async fn sorted_actions(&self, perspective: bool) -> Result<Vec<(u32, f32, Action)>, SearchError> {
        self.with_kernel_blocking(move |kernel| kernel.sorted_actions(perspective)).await
    }

    pub async fn evaluation(&self) -> Result<Option<f32>, SearchError> {
        self.with_kernel_blocking(|kernel| kernel.evaluation()).await
    }

    pub async fn visit_count(&self) -> Result<usize, SearchError> {
        self.with_kernel_blocking(|kernel| kernel.visit_count()).await
    }

    pub async fn render(&self, perspective: bool) -> Result<String, SearchError> {
        self.with_kernel_blocking(move |kernel| kernel.render(perspective)).await
    }

    pub async fn reset(&self) -> Result<(), SearchError> {
        self.with_kernel_blocking(|kernel| kernel.reset()).await
    }

    pub async fn is_terminal(&self) -> Result<bool, SearchError> {
        self.with_kernel_blocking(|kernel| kernel.is_terminal()).await
    }

    pub async fn legal_actions(&self) -> Result<Vec<Action>, SearchError> {
        self.with_kernel_blocking(|kernel| kernel.legal_actions()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridors_kernel::KernelConfig;
    use corridors_kernel::ReferenceKernel;

    fn adapter() -> SearchAdapter {
        SearchAdapter::new(Box::new(ReferenceKernel::new(KernelConfig::default())))
    }

    #[tokio::test]
    async fn starts_fresh_and_reports_legal_actions() {
        let adapter = adapter();
        assert_eq!(adapter.state(), AdapterState::Fresh);
        let actions = adapter.legal_actions().await.unwrap();
        assert!(!actions.is_empty());
    }

    #[tokio::test]
    async fn run_simulations_completes_within_a_generous_deadline() {
        let adapter = adapter();
        let completed = adapter
            .run_simulations(50, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(completed, 50);
        assert_eq!(adapter.state(), AdapterState::Idle);
        assert_eq!(adapter.visit_count().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn apply_move_rejects_illegal_actions() {
        let adapter = adapter();
        let err = adapter.apply_move("*(255,255)", false).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn apply_move_rejects_malformed_action_strings() {
        let adapter = adapter();
        let err = adapter.apply_move("not an action", false).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn apply_move_commits_a_legal_action() {
        let adapter = adapter();
        let legal = adapter.legal_actions().await.unwrap();
        adapter.apply_move(legal[0].to_string(), false).await.unwrap();
        // A fresh root after a move has no accumulated visits yet.
        assert_eq!(adapter.visit_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_further_calls() {
        let adapter = adapter();
        adapter.close().await;
        adapter.close().await;
        assert!(adapter.is_closed());
        let err = adapter.legal_actions().await.unwrap_err();
        assert_eq!(err, SearchError::AdapterClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn run_simulations_times_out_on_an_exhausted_deadline() {
        let adapter = adapter();
        let result = adapter.run_simulations(10_000_000, Duration::from_millis(1)).await;
        assert_eq!(result, Err(SearchError::EngineTimeout));
    }

    #[tokio::test]
    async fn ensure_budget_only_runs_the_shortfall() {
        let adapter = adapter();
        adapter.run_simulations(30, Duration::from_secs(5)).await.unwrap();
        let total = adapter.ensure_budget(50, Duration::from_secs(5)).await.unwrap();
        assert_eq!(total, 50);
        assert_eq!(adapter.visit_count().await.unwrap(), 50);
    }
}
