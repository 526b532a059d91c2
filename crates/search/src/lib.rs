//! Async, cancellable adapter around a synchronous [`corridors_kernel::Kernel`]
//! (spec §5). Nothing upstream of this crate ever blocks the async runtime
//! on a kernel call or needs to know the kernel isn't `Send`-across-await by
//! itself; every touch here is shipped to `spawn_blocking`.
mod adapter;
mod error;
mod state;

pub use adapter::SearchAdapter;
pub use error::SearchError;
pub use state::AdapterState;
