/// Lifecycle of a [`crate::SearchAdapter`] (spec §5).
///
/// `Fresh` before any call has touched the kernel, `Running` while a
/// `run_simulations`/`ensure_budget` batch loop is in flight, `Idle`
/// between calls, `Closed` once `close()` has run. Closing is terminal;
/// every other transition is reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Fresh,
    Running,
    Idle,
    Closed,
}
