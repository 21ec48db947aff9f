//! Controller runtime
//!
//! Turns store watch events into monitor keys on a [`WorkQueue`], runs a pool
//! of workers over it and requeues failed passes with per-key backoff. A
//! periodic resync enqueues every monitor so a missed notification is never
//! fatal.

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::queue::{RequeueBackoff, WorkQueue};
use crate::reconciler::Reconciler;
use crate::store::{bounded, MonitorStore, WatchEvent};
use futures::future::join_all;
use relay_types::{MonitorEvent, ObjectKey, OwnerReference, MONITOR_KIND};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Notify;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Shortest accepted resync period
const MIN_RESYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Monitor that owns a workload, if the workload is controlled by one
pub fn owning_monitor(workload: &ObjectKey, owner: Option<&OwnerReference>) -> Option<ObjectKey> {
    owner
        .filter(|owner| owner.controller && owner.kind == MONITOR_KIND)
        .map(|owner| ObjectKey::new(&workload.namespace, &owner.name))
}

/// Watch-driven controller for monitors and the workloads they own
pub struct Controller {
    reconciler: Reconciler,
    monitors: Arc<dyn MonitorStore>,
    queue: Arc<WorkQueue>,
    backoff: RequeueBackoff,
    config: ControllerConfig,
    running: AtomicBool,
    shutdown: Notify,
}

impl Controller {
    pub fn new(
        reconciler: Reconciler,
        monitors: Arc<dyn MonitorStore>,
        config: ControllerConfig,
    ) -> Self {
        let backoff = RequeueBackoff::new(config.requeue_base_delay(), config.requeue_max_delay());
        Self {
            reconciler,
            monitors,
            queue: Arc::new(WorkQueue::new()),
            backoff,
            config,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pending keys not yet picked up by a worker
    pub async fn pending(&self) -> usize {
        self.queue.len().await
    }

    /// No key is queued or being reconciled
    pub async fn is_idle(&self) -> bool {
        self.queue.is_idle().await
    }

    /// Enqueue the monitor a watch event concerns
    pub async fn handle(&self, event: WatchEvent) {
        let key = match event {
            WatchEvent::Monitor(key) => key,
            WatchEvent::Workload { key, owner } => match owning_monitor(&key, owner.as_ref()) {
                Some(monitor) => monitor,
                None => {
                    debug!(workload = %key, "Ignoring unowned workload");
                    return;
                }
            },
        };

        debug!(monitor = %key, "Enqueueing monitor");
        self.queue.add(key).await;
    }

    /// Enqueue every monitor in every namespace
    pub async fn resync(&self) -> Result<usize> {
        let monitors = bounded(
            "list monitors",
            self.config.store_timeout(),
            self.monitors.list_monitors(None),
        )
        .await?;

        let count = monitors.len();
        for monitor in monitors {
            self.queue.add(monitor.key()).await;
        }

        debug!(count = count, "Resync enqueued monitors");
        Ok(count)
    }

    /// Process watch events until [`Controller::stop`] is called or the
    /// watch stream closes, then drain the queue and wait for the workers
    pub async fn run(self: Arc<Self>, mut watch: broadcast::Receiver<WatchEvent>) {
        self.running.store(true, Ordering::SeqCst);

        let worker_count = self.config.max_concurrent_reconciles.max(1);
        info!(workers = worker_count, "Controller started");

        let workers: Vec<_> = (0..worker_count)
            .map(|id| tokio::spawn(self.clone().worker(id)))
            .collect();

        let mut resync = interval(self.config.resync_interval().max(MIN_RESYNC_INTERVAL));
        resync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => break,

                event = watch.recv() => match event {
                    Ok(event) => self.handle(event).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed = missed, "Watch stream lagged, resyncing");
                        self.resync_logged().await;
                    }
                    Err(RecvError::Closed) => {
                        warn!("Watch stream closed");
                        break;
                    }
                },

                _ = resync.tick() => self.resync_logged().await,
            }
        }

        self.queue.shut_down().await;
        for result in join_all(workers).await {
            if let Err(e) = result {
                error!(error = %e, "Worker task failed");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Controller stopped");
    }

    /// Ask [`Controller::run`] to shut down
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    async fn resync_logged(&self) {
        if let Err(e) = self.resync().await {
            error!(error = %e, "Resync failed");
        }
    }

    async fn worker(self: Arc<Self>, id: usize) {
        while let Some(key) = self.queue.get().await {
            self.process(&key).await;
            self.queue.done(&key).await;
        }
        debug!(worker = id, "Worker exiting");
    }

    async fn process(&self, key: &ObjectKey) {
        match self.reconciler.reconcile(key).await {
            Ok(outcome) => {
                self.backoff.forget(key);
                debug!(monitor = %key, outcome = ?outcome, "Reconciled");
            }
            Err(e) => {
                self.reconciler.emit(
                    key,
                    MonitorEvent::ReconcileFailed {
                        reason: e.to_string(),
                    },
                );

                if e.is_retryable() && !self.queue.is_shutting_down().await {
                    let delay = self.backoff.next_delay(key);
                    warn!(
                        monitor = %key,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Reconcile failed, requeueing"
                    );
                    self.queue.add_after(key.clone(), delay);
                } else {
                    self.backoff.forget(key);
                    error!(monitor = %key, error = %e, "Reconcile failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::StaticImageSource;
    use crate::store::{InMemoryStore, StoreError, StoreResult, WorkloadStore};
    use crate::sync::WorkloadSynchronizer;
    use async_trait::async_trait;
    use relay_types::{LacpMonitor, MonitorEventEnvelope};
    use std::sync::atomic::AtomicUsize;
    use uuid::Uuid;

    fn controller_with(monitors: Arc<dyn MonitorStore>, store: Arc<InMemoryStore>) -> Arc<Controller> {
        let config = ControllerConfig::default();
        let synchronizer = WorkloadSynchronizer::new(
            store,
            Arc::new(StaticImageSource::new("relay:v1")),
            config.store_timeout(),
        );
        let (events, _) = broadcast::channel::<MonitorEventEnvelope>(64);
        let reconciler = Reconciler::new(monitors.clone(), synchronizer, events, config.store_timeout());
        Arc::new(Controller::new(reconciler, monitors, config))
    }

    fn owner(kind: &str, name: &str, controller: bool) -> OwnerReference {
        OwnerReference {
            kind: kind.into(),
            name: name.into(),
            uid: Uuid::new_v4(),
            controller,
        }
    }

    #[test]
    fn test_owning_monitor() {
        let workload = ObjectKey::new("relay", "pf-status-relay-daemonset-a");

        assert_eq!(
            owning_monitor(&workload, Some(&owner(MONITOR_KIND, "a", true))),
            Some(ObjectKey::new("relay", "a"))
        );
        assert_eq!(owning_monitor(&workload, None), None);
        assert_eq!(
            owning_monitor(&workload, Some(&owner("ReplicaSet", "a", true))),
            None
        );
        assert_eq!(
            owning_monitor(&workload, Some(&owner(MONITOR_KIND, "a", false))),
            None
        );
    }

    #[tokio::test]
    async fn test_handle_enqueues_owner() {
        let store = Arc::new(InMemoryStore::new());
        let controller = controller_with(store.clone(), store);

        controller
            .handle(WatchEvent::Monitor(ObjectKey::new("relay", "a")))
            .await;
        controller
            .handle(WatchEvent::Workload {
                key: ObjectKey::new("relay", "pf-status-relay-daemonset-a"),
                owner: Some(owner(MONITOR_KIND, "a", true)),
            })
            .await;
        controller
            .handle(WatchEvent::Workload {
                key: ObjectKey::new("relay", "unrelated"),
                owner: None,
            })
            .await;

        assert_eq!(controller.pending().await, 1);
    }

    #[tokio::test]
    async fn test_resync_enqueues_every_monitor() {
        let store = Arc::new(InMemoryStore::new());
        store.create_monitor(LacpMonitor::new("ns-1", "a", ["eth0"])).await.unwrap();
        store.create_monitor(LacpMonitor::new("ns-2", "b", ["eth0"])).await.unwrap();
        let controller = controller_with(store.clone(), store);

        assert_eq!(controller.resync().await.unwrap(), 2);
        assert_eq!(controller.pending().await, 2);
    }

    #[tokio::test]
    async fn test_stop_before_run_returns() {
        let store = Arc::new(InMemoryStore::new());
        let controller = controller_with(store.clone(), store.clone());

        controller.stop();
        controller.clone().run(store.subscribe()).await;
        assert!(!controller.is_running());
    }

    /// Fails the first `failures` reads, then delegates
    struct FlakyStore {
        inner: Arc<InMemoryStore>,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl MonitorStore for FlakyStore {
        async fn get_monitor(&self, key: &ObjectKey) -> StoreResult<Option<LacpMonitor>> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Transport("connection refused".into()));
            }
            self.inner.get_monitor(key).await
        }

        async fn list_monitors(&self, namespace: Option<&str>) -> StoreResult<Vec<LacpMonitor>> {
            self.inner.list_monitors(namespace).await
        }

        async fn create_monitor(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor> {
            self.inner.create_monitor(monitor).await
        }

        async fn update_monitor(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor> {
            self.inner.update_monitor(monitor).await
        }

        async fn update_monitor_status(&self, monitor: LacpMonitor) -> StoreResult<LacpMonitor> {
            self.inner.update_monitor_status(monitor).await
        }

        async fn delete_monitor(&self, key: &ObjectKey) -> StoreResult<bool> {
            self.inner.delete_monitor(key).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_are_retried() {
        let store = Arc::new(InMemoryStore::new());
        let monitor = store
            .create_monitor(LacpMonitor::new("relay", "a", ["eth0"]))
            .await
            .unwrap();
        let flaky = Arc::new(FlakyStore {
            inner: store.clone(),
            failures: AtomicUsize::new(3),
        });
        let controller = controller_with(flaky, store.clone());

        let handle = tokio::spawn(controller.clone().run(store.subscribe()));

        let mut converged = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if !store.list_workloads(None).await.unwrap().is_empty() {
                converged = true;
                break;
            }
        }
        assert!(converged, "workload was never created");
        assert_eq!(controller.backoff.failures(&monitor.key()), 0);

        controller.stop();
        handle.await.unwrap();
    }
}
