//! Object stores for monitors and workloads
//!
//! The operator only talks to stores through [`MonitorStore`] and
//! [`WorkloadStore`]; every call it makes is bounded by [`bounded`].

mod memory;
mod traits;

pub use memory::{InMemoryStore, WriteStats};
pub use traits::{MonitorStore, StoreError, StoreResult, WatchEvent, WorkloadStore};

use std::future::Future;
use std::time::Duration;

/// Run a store call, failing with [`StoreError::Timeout`] past the deadline
pub async fn bounded<T, F>(operation: &'static str, timeout: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { operation, timeout }),
    }
}
