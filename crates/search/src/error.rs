use std::fmt;

/// Errors the Search Adapter can raise around a [`corridors_kernel::Kernel`].
/// Wraps kernel-level errors plus the concurrency/lifecycle failures the
/// kernel itself knows nothing about (spec §5, §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// `close()` was already called; the adapter no longer owns a kernel.
    AdapterClosed,
    /// The kernel rejected the action. Carries its reason string verbatim.
    InvalidAction(String),
    /// The call did not complete within its deadline; the underlying batch
    /// was still given its grace period before this is raised.
    EngineTimeout,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::AdapterClosed => write!(f, "search adapter is closed"),
            SearchError::InvalidAction(reason) => write!(f, "invalid action: {}", reason),
            SearchError::EngineTimeout => write!(f, "search engine call exceeded its deadline"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<corridors_kernel::KernelError> for SearchError {
    fn from(err: corridors_kernel::KernelError) -> Self {
        match err {
            corridors_kernel::KernelError::InvalidAction(reason) => {
                SearchError::InvalidAction(reason)
            }
        }
    }
}
