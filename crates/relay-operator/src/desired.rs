//! Desired relay workload for a monitor
//!
//! Everything here is a pure function of the monitor and the image, so two
//! calls with the same inputs always produce equal descriptors. Drift
//! detection relies on that.

use crate::error::{OperatorError, Result};
use relay_types::{
    ContainerSpec, EnvVar, LacpMonitor, ManagedWorkload, ObjectKey, ObjectMeta, OwnerReference,
    PodTemplate, WorkloadSpec, MONITOR_KIND,
};
use std::collections::BTreeMap;

/// Prefix of every managed workload name
pub const WORKLOAD_NAME_PREFIX: &str = "pf-status-relay-daemonset-";

/// Name of the relay container
pub const RELAY_CONTAINER_NAME: &str = "pf-status-relay";

/// Comma-separated interface list handed to the relay agent
pub const INTERFACES_ENV: &str = "PF_STATUS_RELAY_INTERFACES";

/// Polling interval handed to the relay agent
pub const POLLING_INTERVAL_ENV: &str = "PF_STATUS_RELAY_POLLING_INTERVAL";

/// Pod label tying pods to their workload
pub const APP_LABEL: &str = "app";

pub fn workload_name(monitor_name: &str) -> String {
    format!("{}{}", WORKLOAD_NAME_PREFIX, monitor_name)
}

/// Key of the workload managed for a monitor
pub fn workload_key(monitor: &LacpMonitor) -> ObjectKey {
    ObjectKey::new(monitor.namespace(), workload_name(monitor.name()))
}

/// Canonical workload for a monitor
pub fn desired_workload(monitor: &LacpMonitor, image: &str) -> ManagedWorkload {
    let name = workload_name(monitor.name());
    let labels: BTreeMap<String, String> = [(APP_LABEL.to_string(), name.clone())].into();

    ManagedWorkload {
        metadata: ObjectMeta::new(monitor.namespace(), &name),
        spec: WorkloadSpec {
            selector: labels.clone(),
            template: PodTemplate {
                labels,
                host_network: true,
                host_pid: true,
                node_selector: monitor.spec.node_selector.clone(),
                containers: vec![ContainerSpec {
                    name: RELAY_CONTAINER_NAME.to_string(),
                    image: image.to_string(),
                    privileged: true,
                    env: vec![
                        EnvVar::new(INTERFACES_ENV, monitor.spec.interfaces.join(",")),
                        EnvVar::new(
                            POLLING_INTERVAL_ENV,
                            monitor.spec.polling_interval.to_string(),
                        ),
                    ],
                }],
            },
        },
    }
}

/// Controller owner reference binding a workload's lifecycle to the monitor
///
/// Fails for monitors that were never persisted, since they have no uid.
pub fn controller_reference(monitor: &LacpMonitor) -> Result<OwnerReference> {
    let uid = monitor.metadata.uid.ok_or_else(|| {
        OperatorError::Ownership(format!("{} {} has no uid", MONITOR_KIND, monitor.key()))
    })?;

    Ok(OwnerReference {
        kind: MONITOR_KIND.to_string(),
        name: monitor.name().to_string(),
        uid,
        controller: true,
    })
}
