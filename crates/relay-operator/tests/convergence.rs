//! End-to-end convergence of monitors and relay workloads under the controller

use relay_operator::{
    workload_key, ControllerConfig, ImageSource, InMemoryStore, MonitorStore, Operator,
    OperatorConfig, OperatorError, StaticImageSource, WorkloadStore,
};
use relay_types::{LacpMonitor, MonitorEvent, ObjectKey};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const NAMESPACE: &str = "pf-status-relay";

struct Harness {
    store: Arc<InMemoryStore>,
    operator: Operator,
    runner: JoinHandle<()>,
}

impl Harness {
    fn start(images: StaticImageSource) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let images: Arc<dyn ImageSource> = Arc::new(images);
        let config = OperatorConfig {
            controller: ControllerConfig {
                requeue_base_delay_ms: 10,
                requeue_max_delay_ms: 100,
                ..Default::default()
            },
            ..Default::default()
        };
        let operator = Operator::with_image_source(config, store.clone(), store.clone(), images);
        let runner = tokio::spawn(operator.controller().run(store.subscribe()));
        Self {
            store,
            operator,
            runner,
        }
    }

    /// Wait until the controller has had nothing to do for a while
    async fn settle(&self) {
        let controller = self.operator.controller();
        let mut quiet = 0;
        for _ in 0..500 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if controller.is_idle().await {
                quiet += 1;
                if quiet == 5 {
                    return;
                }
            } else {
                quiet = 0;
            }
        }
        panic!("controller never settled");
    }

    async fn monitor(&self, name: &str) -> LacpMonitor {
        self.store
            .get_monitor(&ObjectKey::new(NAMESPACE, name))
            .await
            .unwrap()
            .expect("monitor exists")
    }

    async fn stop(self) {
        self.operator.controller().stop();
        self.runner.await.unwrap();
    }
}

async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

fn zone_a(name: &str, interfaces: &[&str]) -> LacpMonitor {
    LacpMonitor::new(NAMESPACE, name, interfaces.iter().copied())
        .with_node_selector([("topology.kubernetes.io/zone", "a")])
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_conflicting_monitors_converge() {
    let h = Harness::start(StaticImageSource::new("quay.io/relay:v1"));
    let mut events = h.operator.subscribe();

    // A healthy monitor gets its workload
    let a = zone_a("a", &["eth0", "eth1"]);
    h.operator.admission().validate_create(&a).await.unwrap();
    let a = h.store.create_monitor(a).await.unwrap();
    let a_workload = workload_key(&a);
    let (hr, wk) = (&h, &a_workload);

    eventually("workload of a", move || async move {
        hr.store.get_workload(wk).await.unwrap().is_some()
    })
    .await;
    h.settle().await;

    // Admission rejects the overlapping claim
    let b = zone_a("b", &["eth1"]);
    let err = h.operator.admission().validate_create(&b).await.unwrap_err();
    assert!(matches!(err, OperatorError::Conflict(_)));
    let message = err.to_string();
    assert!(message.contains("eth1"), "{}", message);
    assert!(message.contains("pf-status-relay/a"), "{}", message);

    // Written anyway, as a racing admission would; the reconciler degrades it
    let b = h.store.create_monitor(b).await.unwrap();
    eventually("b degraded", move || async move { hr.monitor("b").await.status.degraded }).await;
    h.settle().await;

    let b = h.monitor("b").await;
    assert!(b.status.error_message.contains("eth1"));
    assert!(h.store.get_workload(&workload_key(&b)).await.unwrap().is_none());
    assert!(!h.monitor("a").await.status.degraded);
    assert!(h.store.get_workload(&a_workload).await.unwrap().is_some());

    // Out-of-band drift is reverted
    let mut drifted = h.store.get_workload(&a_workload).await.unwrap().unwrap();
    drifted.spec.template.containers[0].image = "quay.io/relay:rogue".into();
    h.store.update_workload(drifted).await.unwrap();

    eventually("drift reverted", move || async move {
        let workload = hr.store.get_workload(wk).await.unwrap().unwrap();
        workload.spec.template.containers[0].image == "quay.io/relay:v1"
    })
    .await;
    h.settle().await;

    // Deleting a collects its workload; the next resync lets b recover
    assert!(h.store.delete_monitor(&a.key()).await.unwrap());
    assert!(h.store.get_workload(&a_workload).await.unwrap().is_none());
    h.settle().await;

    h.operator.controller().resync().await.unwrap();
    eventually("b recovered", move || async move {
        let b = hr.monitor("b").await;
        !b.status.degraded && hr.store.get_workload(&workload_key(&b)).await.unwrap().is_some()
    })
    .await;

    let mut seen = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        seen.push((envelope.monitor.name, envelope.event));
    }
    assert!(seen.contains(&(
        "a".to_string(),
        MonitorEvent::WorkloadUpdated {
            workload: a_workload.clone()
        }
    )));
    assert!(seen.contains(&("b".to_string(), MonitorEvent::Recovered)));

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disjoint_selectors_do_not_conflict() {
    let h = Harness::start(StaticImageSource::new("quay.io/relay:v1"));

    let everywhere = LacpMonitor::new(NAMESPACE, "everywhere", ["eth0"]);
    let zone_b = LacpMonitor::new(NAMESPACE, "zone-b", ["eth1"])
        .with_node_selector([("topology.kubernetes.io/zone", "b")]);

    for monitor in [everywhere, zone_b] {
        h.operator.admission().validate_create(&monitor).await.unwrap();
        h.store.create_monitor(monitor).await.unwrap();
    }

    let hr = &h;
    eventually("both workloads", move || async move {
        hr.store.list_workloads(Some(NAMESPACE)).await.unwrap().len() == 2
    })
    .await;
    h.settle().await;

    assert!(!h.monitor("everywhere").await.status.degraded);
    assert!(!h.monitor("zone-b").await.status.degraded);

    h.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_image_is_retried_without_workload() {
    let h = Harness::start(StaticImageSource::unset());
    let mut events = h.operator.subscribe();

    h.store.create_monitor(zone_a("a", &["eth0"])).await.unwrap();

    let mut failures = 0;
    while failures < 2 {
        let envelope = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("reconcile failure event")
            .unwrap();
        if matches!(envelope.event, MonitorEvent::ReconcileFailed { .. }) {
            failures += 1;
        }
    }

    assert!(h.store.list_workloads(None).await.unwrap().is_empty());
    assert!(!h.monitor("a").await.status.degraded);

    h.stop().await;
}
