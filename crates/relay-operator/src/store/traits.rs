//! Store trait definitions

use async_trait::async_trait;
use relay_types::{LacpMonitor, ManagedWorkload, ObjectKey, OwnerReference};
use std::time::Duration;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object with the same key already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Write based on a stale resource version
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connection or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Call did not complete within its deadline
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

/// Change notification emitted by a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A monitor was created, updated or deleted
    Monitor(ObjectKey),

    /// A workload was created, updated or deleted
    Workload {
        key: ObjectKey,
        owner: Option<OwnerReference>,
    },
}

/// Storage for monitors
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Get a monitor by key
    async fn get_monitor(&self, key: &ObjectKey) -> StoreResult<Option<LacpMonitor>>;

    /// List monitors in a namespace, or in every namespace for `None`
    async fn list_monitors(&self, namespace: Option<&str>) -> StoreResult<Vec<LacpMonitor>>;

    /// Persist a new monitor
    async fn create_monitor(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor>;

    /// Replace spec and labels; status is left untouched
    async fn update_monitor(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor>;

    /// Replace status; spec is left untouched
    async fn update_monitor_status(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor>;

    /// Delete a monitor and every workload it owns
    async fn delete_monitor(&self, key: &ObjectKey) -> StoreResult<bool>;
}

/// Storage for managed workloads
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Get a workload by key
    async fn get_workload(&self, key: &ObjectKey) -> StoreResult<Option<ManagedWorkload>>;

    /// List workloads in a namespace, or in every namespace for `None`
    async fn list_workloads(&self, namespace: Option<&str>) -> StoreResult<Vec<ManagedWorkload>>;

    /// Persist a new workload
    async fn create_workload(&self, workload: ManagedWorkload) -> StoreResult<ManagedWorkload>;

    /// Replace spec, labels and owner references
    async fn update_workload(&self, workload: ManagedWorkload) -> StoreResult<ManagedWorkload>;

    /// Delete a workload by key
    async fn delete_workload(&self, key: &ObjectKey) -> StoreResult<bool>;
}
