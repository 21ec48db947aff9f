//! In-memory store implementation

use super::traits::*;
use async_trait::async_trait;
use relay_types::{LacpMonitor, ManagedWorkload, MonitorStatus, ObjectKey, ObjectMeta};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Channel capacity for watch notifications
const WATCH_CHANNEL_CAPACITY: usize = 1024;

/// In-memory store for development and testing
///
/// Behaves like an API server for the two resource kinds: optimistic
/// concurrency on resource versions, owner-reference garbage collection on
/// monitor deletion and a watch stream of every write.
#[derive(Debug)]
pub struct InMemoryStore {
    monitors: Arc<RwLock<BTreeMap<ObjectKey, LacpMonitor>>>,
    workloads: Arc<RwLock<BTreeMap<ObjectKey, ManagedWorkload>>>,
    resource_version: AtomicU64,
    watch_tx: broadcast::Sender<WatchEvent>,
    counters: WriteCounters,
}

#[derive(Debug, Default)]
struct WriteCounters {
    monitor_creates: AtomicU64,
    monitor_updates: AtomicU64,
    status_updates: AtomicU64,
    monitor_deletes: AtomicU64,
    workload_creates: AtomicU64,
    workload_updates: AtomicU64,
    workload_deletes: AtomicU64,
}

/// Snapshot of the writes a store has accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub monitor_creates: u64,
    pub monitor_updates: u64,
    pub status_updates: u64,
    pub monitor_deletes: u64,
    pub workload_creates: u64,
    pub workload_updates: u64,
    pub workload_deletes: u64,
}

impl WriteStats {
    /// Total writes against workloads
    pub fn workload_writes(&self) -> u64 {
        self.workload_creates + self.workload_updates + self.workload_deletes
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        let (watch_tx, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            monitors: Arc::new(RwLock::new(BTreeMap::new())),
            workloads: Arc::new(RwLock::new(BTreeMap::new())),
            resource_version: AtomicU64::new(0),
            watch_tx,
            counters: WriteCounters::default(),
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.watch_tx.subscribe()
    }

    /// Writes accepted so far
    pub fn stats(&self) -> WriteStats {
        let c = &self.counters;
        WriteStats {
            monitor_creates: c.monitor_creates.load(Ordering::Relaxed),
            monitor_updates: c.monitor_updates.load(Ordering::Relaxed),
            status_updates: c.status_updates.load(Ordering::Relaxed),
            monitor_deletes: c.monitor_deletes.load(Ordering::Relaxed),
            workload_creates: c.workload_creates.load(Ordering::Relaxed),
            workload_updates: c.workload_updates.load(Ordering::Relaxed),
            workload_deletes: c.workload_deletes.load(Ordering::Relaxed),
        }
    }

    fn next_version(&self) -> u64 {
        self.resource_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn stamp_new(&self, meta: &mut ObjectMeta) {
        meta.uid.get_or_insert_with(Uuid::new_v4);
        meta.resource_version = self.next_version();
        meta.creation_timestamp = Some(chrono::Utc::now());
    }

    fn notify(&self, event: WatchEvent) {
        // No subscribers is fine
        let _ = self.watch_tx.send(event);
    }

    fn notify_workload(&self, workload: &ManagedWorkload) {
        self.notify(WatchEvent::Workload {
            key: workload.key(),
            owner: workload.metadata.controller_owner().cloned(),
        });
    }
}

fn check_version(stored: &ObjectMeta, incoming: &ObjectMeta) -> StoreResult<()> {
    if stored.resource_version != incoming.resource_version {
        return Err(StoreError::Conflict(format!(
            "{} has been modified: resource version {} is stale (current {})",
            stored.key(),
            incoming.resource_version,
            stored.resource_version
        )));
    }
    Ok(())
}

#[async_trait]
impl MonitorStore for InMemoryStore {
    async fn get_monitor(&self, key: &ObjectKey) -> StoreResult<Option<LacpMonitor>> {
        let monitors = self.monitors.read().await;
        Ok(monitors.get(key).cloned())
    }

    async fn list_monitors(&self, namespace: Option<&str>) -> StoreResult<Vec<LacpMonitor>> {
        let monitors = self.monitors.read().await;
        Ok(monitors
            .values()
            .filter(|m| namespace.map_or(true, |ns| m.namespace() == ns))
            .cloned()
            .collect())
    }

    async fn create_monitor(&self, mut monitor: LacpMonitor) -> StoreResult<LacpMonitor> {
        let key = monitor.key();
        {
            let mut monitors = self.monitors.write().await;
            if monitors.contains_key(&key) {
                return Err(StoreError::AlreadyExists(key.to_string()));
            }
            self.stamp_new(&mut monitor.metadata);
            // Status is only written through the status subresource
            monitor.status = MonitorStatus::default();
            monitors.insert(key.clone(), monitor.clone());
        }

        self.counters.monitor_creates.fetch_add(1, Ordering::Relaxed);
        self.notify(WatchEvent::Monitor(key));
        Ok(monitor)
    }

    async fn update_monitor(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor> {
        let key = monitor.key();
        let updated = {
            let mut monitors = self.monitors.write().await;
            let stored = monitors
                .get_mut(&key)
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            check_version(&stored.metadata, &monitor.metadata)?;

            stored.spec = monitor.spec;
            stored.metadata.labels = monitor.metadata.labels;
            stored.metadata.resource_version = self.next_version();
            stored.clone()
        };

        self.counters.monitor_updates.fetch_add(1, Ordering::Relaxed);
        self.notify(WatchEvent::Monitor(key));
        Ok(updated)
    }

    async fn update_monitor_status(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor> {
        let key = monitor.key();
        let updated = {
            let mut monitors = self.monitors.write().await;
            let stored = monitors
                .get_mut(&key)
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            check_version(&stored.metadata, &monitor.metadata)?;

            stored.status = monitor.status;
            stored.metadata.resource_version = self.next_version();
            stored.clone()
        };

        self.counters.status_updates.fetch_add(1, Ordering::Relaxed);
        self.notify(WatchEvent::Monitor(key));
        Ok(updated)
    }

    async fn delete_monitor(&self, key: &ObjectKey) -> StoreResult<bool> {
        let removed = {
            let mut monitors = self.monitors.write().await;
            monitors.remove(key)
        };
        let Some(monitor) = removed else {
            return Ok(false);
        };

        self.counters.monitor_deletes.fetch_add(1, Ordering::Relaxed);
        self.notify(WatchEvent::Monitor(key.clone()));

        // Garbage-collect dependents
        if let Some(uid) = monitor.metadata.uid {
            let collected: Vec<ManagedWorkload> = {
                let mut workloads = self.workloads.write().await;
                let owned: Vec<ObjectKey> = workloads
                    .values()
                    .filter(|w| w.metadata.is_owned_by(&uid))
                    .map(ManagedWorkload::key)
                    .collect();
                owned
                    .iter()
                    .filter_map(|k| workloads.remove(k))
                    .collect()
            };

            for workload in &collected {
                tracing::debug!(workload = %workload.key(), owner = %key, "Garbage-collected workload");
                self.counters.workload_deletes.fetch_add(1, Ordering::Relaxed);
                self.notify_workload(workload);
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl WorkloadStore for InMemoryStore {
    async fn get_workload(&self, key: &ObjectKey) -> StoreResult<Option<ManagedWorkload>> {
        let workloads = self.workloads.read().await;
        Ok(workloads.get(key).cloned())
    }

    async fn list_workloads(&self, namespace: Option<&str>) -> StoreResult<Vec<ManagedWorkload>> {
        let workloads = self.workloads.read().await;
        Ok(workloads
            .values()
            .filter(|w| namespace.map_or(true, |ns| w.metadata.namespace == ns))
            .cloned()
            .collect())
    }

    async fn create_workload(&self, mut workload: ManagedWorkload) -> StoreResult<ManagedWorkload> {
        let key = workload.key();
        {
            let mut workloads = self.workloads.write().await;
            if workloads.contains_key(&key) {
                return Err(StoreError::AlreadyExists(key.to_string()));
            }
            self.stamp_new(&mut workload.metadata);
            workloads.insert(key, workload.clone());
        }

        self.counters.workload_creates.fetch_add(1, Ordering::Relaxed);
        self.notify_workload(&workload);
        Ok(workload)
    }

    async fn update_workload(&self, workload: ManagedWorkload) -> StoreResult<ManagedWorkload> {
        let key = workload.key();
        let updated = {
            let mut workloads = self.workloads.write().await;
            let stored = workloads
                .get_mut(&key)
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
            check_version(&stored.metadata, &workload.metadata)?;

            stored.spec = workload.spec;
            stored.metadata.labels = workload.metadata.labels;
            stored.metadata.owner_references = workload.metadata.owner_references;
            stored.metadata.resource_version = self.next_version();
            stored.clone()
        };

        self.counters.workload_updates.fetch_add(1, Ordering::Relaxed);
        self.notify_workload(&updated);
        Ok(updated)
    }

    async fn delete_workload(&self, key: &ObjectKey) -> StoreResult<bool> {
        let removed = {
            let mut workloads = self.workloads.write().await;
            workloads.remove(key)
        };
        let Some(workload) = removed else {
            return Ok(false);
        };

        self.counters.workload_deletes.fetch_add(1, Ordering::Relaxed);
        self.notify_workload(&workload);
        Ok(true)
    }
}
