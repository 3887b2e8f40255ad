//! Offline synchronization for Tusk

mod engine;
mod queue;

pub use engine::{PullReport, QueueStatus, SyncEngine};
pub use queue::{RetryAction, RetryEntry, RetryQueue};
