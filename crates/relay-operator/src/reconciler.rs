//! Level-triggered reconciliation of a single monitor
//!
//! Each pass re-reads the monitor and a namespace snapshot, decides between
//! degraded and healthy from scratch and converges status and workload onto
//! that decision. Any store failure ends the pass; the caller retries it.

use crate::desired::workload_key;
use crate::error::{OperatorError, Result};
use crate::store::{bounded, MonitorStore};
use crate::sync::{SyncOutcome, WorkloadSynchronizer};
use relay_types::{LacpMonitor, MonitorEvent, MonitorEventEnvelope, MonitorStatus, ObjectKey};
use relay_validation::find_conflict;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Monitor no longer exists; nothing to do
    NotFound,

    /// Monitor conflicts and was already degraded; only a leftover workload
    /// is removed
    AlreadyDegraded { workload_deleted: bool },

    /// Monitor was marked degraded in this pass
    Degraded { workload_deleted: bool },

    /// Monitor is healthy and its workload converged
    Healthy { sync: SyncOutcome, recovered: bool },
}

/// Reconciles monitors one key at a time
#[derive(Clone)]
pub struct Reconciler {
    monitors: Arc<dyn MonitorStore>,
    synchronizer: WorkloadSynchronizer,
    events: broadcast::Sender<MonitorEventEnvelope>,
    store_timeout: Duration,
}

impl Reconciler {
    pub fn new(
        monitors: Arc<dyn MonitorStore>,
        synchronizer: WorkloadSynchronizer,
        events: broadcast::Sender<MonitorEventEnvelope>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            monitors,
            synchronizer,
            events,
            store_timeout,
        }
    }

    /// Subscribe to monitor events
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEventEnvelope> {
        self.events.subscribe()
    }

    /// Run one pass for the monitor at `key`
    #[instrument(skip(self, key), fields(monitor = %key))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<ReconcileOutcome> {
        let monitor = bounded(
            "get monitor",
            self.store_timeout,
            self.monitors.get_monitor(key),
        )
        .await?;
        let Some(monitor) = monitor else {
            debug!("Monitor not found, nothing to reconcile");
            return Ok(ReconcileOutcome::NotFound);
        };

        let snapshot = bounded(
            "list monitors",
            self.store_timeout,
            self.monitors.list_monitors(Some(monitor.namespace())),
        )
        .await?;

        match find_conflict(&monitor, &snapshot) {
            Err(conflict) => self.degrade(monitor, conflict.to_string()).await,
            Ok(()) => self.converge(monitor).await,
        }
    }

    async fn degrade(&self, monitor: LacpMonitor, reason: String) -> Result<ReconcileOutcome> {
        if monitor.is_degraded() {
            debug!(reason = %reason, "Monitor already degraded");
            let workload_deleted = self.remove_workload(&monitor).await?;
            return Ok(ReconcileOutcome::AlreadyDegraded { workload_deleted });
        }

        warn!(reason = %reason, "Monitor conflicts, marking degraded");
        let monitor = self
            .write_status(monitor, MonitorStatus::degraded(reason.clone()))
            .await?;
        self.emit(&monitor.key(), MonitorEvent::Degraded { reason });

        let workload_deleted = self.remove_workload(&monitor).await?;
        Ok(ReconcileOutcome::Degraded { workload_deleted })
    }

    /// Delete the workload of a degraded monitor if one is left
    async fn remove_workload(&self, monitor: &LacpMonitor) -> Result<bool> {
        let deleted = self.synchronizer.delete(monitor).await?;
        if deleted {
            self.emit(
                &monitor.key(),
                MonitorEvent::WorkloadDeleted {
                    workload: workload_key(monitor),
                },
            );
        }
        Ok(deleted)
    }

    async fn converge(&self, monitor: LacpMonitor) -> Result<ReconcileOutcome> {
        let key = monitor.key();

        // A missing image blocks only the workload; recovery is still recorded
        let sync = match self.synchronizer.sync(&monitor).await {
            Err(err) if !matches!(err, OperatorError::Configuration(_)) => return Err(err),
            result => result,
        };

        if let Ok(outcome) = &sync {
            match outcome {
                SyncOutcome::Created(workload) => self.emit(
                    &key,
                    MonitorEvent::WorkloadCreated {
                        workload: workload.clone(),
                    },
                ),
                SyncOutcome::Updated(workload) => self.emit(
                    &key,
                    MonitorEvent::WorkloadUpdated {
                        workload: workload.clone(),
                    },
                ),
                SyncOutcome::Unchanged(_) => {}
            }
        }

        let recovered = monitor.is_degraded();
        if recovered {
            self.write_status(monitor, MonitorStatus::healthy()).await?;
            info!("Monitor recovered");
            self.emit(&key, MonitorEvent::Recovered);
        }

        let sync = sync?;
        Ok(ReconcileOutcome::Healthy { sync, recovered })
    }

    async fn write_status(&self, mut monitor: LacpMonitor, status: MonitorStatus) -> Result<LacpMonitor> {
        monitor.status = status;
        let updated = bounded(
            "update monitor status",
            self.store_timeout,
            self.monitors.update_monitor_status(monitor),
        )
        .await?;
        Ok(updated)
    }

    pub(crate) fn emit(&self, monitor: &ObjectKey, event: MonitorEvent) {
        let _ = self
            .events
            .send(MonitorEventEnvelope::new(monitor.clone(), event));
    }
}
