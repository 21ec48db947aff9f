//! Relay Types - Resource model for the pf-status-relay operator
//!
//! The operator manages exclusive claims on physical function (PF) network
//! interfaces. Each claim is declared by a [`LacpMonitor`] and materialized as a
//! [`ManagedWorkload`] that runs the relay agent on the selected nodes.
//!
//! ## Key Concepts
//!
//! - **LacpMonitor**: namespaced declaration of interfaces to watch on a set of nodes
//! - **NodeSelector**: label constraints choosing the nodes; absent means every node
//! - **ManagedWorkload**: per-monitor daemon-set style descriptor owned by the monitor
//! - **ObjectKey**: namespace + name identity shared by all resources
//! - **Events**: lifecycle notifications published by the reconciler

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod events;
pub mod ids;
pub mod meta;
pub mod monitor;
pub mod workload;

// Re-export main types
pub use events::{EventSeverity, MonitorEvent, MonitorEventEnvelope};
pub use ids::ObjectKey;
pub use meta::{ObjectMeta, OwnerReference};
pub use monitor::{LacpMonitor, MonitorSpec, MonitorStatus, NodeSelector, MONITOR_KIND};
pub use workload::{ContainerSpec, EnvVar, ManagedWorkload, PodTemplate, WorkloadSpec};
