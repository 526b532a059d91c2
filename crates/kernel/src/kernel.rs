use crate::Action;
use crate::KernelError;

/// The native search kernel's contract (spec §6.1): a black-box, single-
/// threaded-per-instance board position plus Monte Carlo search state.
///
/// Every method here is synchronous and potentially slow (`run_simulations`
/// is the CPU-bound one); [`corridors_search::SearchAdapter`] is the async,
/// cancellable, thread-safe shell around an implementor of this trait. The
/// kernel itself reports legal actions and accepts or rejects proposed
/// ones — game-rule validity is entirely the kernel's concern, never the
/// Turn Router's (spec §1).
pub trait Kernel: Send {
    /// Perform up to `n` additional playouts from the current root.
    /// Returns the number actually completed — for the reference kernel
    /// this is always `n`; real kernels may stop early on internal limits.
    fn run_simulations(&mut self, n: usize) -> usize;

    /// Commit a move to kernel state. `perspective` flips point of view
    /// per spec's Perspective flag glossary entry; its meaning is defined
    /// by the kernel and preserved verbatim by callers.
    fn apply_move(&mut self, action: Action, perspective: bool) -> Result<(), KernelError>;

    /// The kernel's chosen action, with optional epsilon-greedy noise.
    fn best_action(&self, epsilon: f32) -> Action;

    /// Root actions ordered by visit count, highest first, each paired
    /// with an equity value and the action string.
    fn sorted_actions(&self, perspective: bool) -> Vec<(u32, f32, Action)>;

    /// Root-evaluation scalar in `[-1, 1]`, or `None` if not yet available.
    fn evaluation(&self) -> Option<f32>;

    /// Total simulations accumulated at the root since the last move.
    fn visit_count(&self) -> usize;

    /// Human-readable board rendering.
    fn render(&self, perspective: bool) -> String;

    /// Reset to the initial position, discarding all search state.
    fn reset(&mut self);

    /// True iff the current position is terminal (a player has reached
    /// their goal row).
    fn is_terminal(&self) -> bool;

    /// Actions legal in the current position. Used by the Turn Router's
    /// `legal_moves` operation and to validate a proposed human move
    /// before forwarding it (the kernel still re-validates in `apply_move`).
    fn legal_actions(&self) -> Vec<Action>;
}
