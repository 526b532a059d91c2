use std::fmt;

/// Errors the kernel itself can raise. Distinct from adapter-level errors
/// (`corridors-search::SearchError`), which wrap these plus concurrency
/// and lifecycle failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// The kernel rejected an action as illegal in the current position.
    /// Carries the kernel's own reason string, forwarded verbatim to the
    /// caller per spec §7 (`IllegalMove` carries the kernel reason).
    InvalidAction(String),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidAction(reason) => write!(f, "invalid action: {}", reason),
        }
    }
}

impl std::error::Error for KernelError {}
