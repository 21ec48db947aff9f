//! LACP monitor resources
//!
//! A monitor declares which PF interfaces the relay agent should watch and on
//! which nodes. Two healthy monitors may never claim the same interface on a
//! node both of them can be scheduled onto.

use crate::{ObjectKey, ObjectMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource kind used in owner references
pub const MONITOR_KIND: &str = "PFLACPMonitor";

/// Node label constraints; every pair must match for a node to be selected
pub type NodeSelector = BTreeMap<String, String>;

/// A PF LACP monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LacpMonitor {
    pub metadata: ObjectMeta,

    pub spec: MonitorSpec,

    #[serde(default)]
    pub status: MonitorStatus,
}

impl LacpMonitor {
    /// Create an unpersisted monitor claiming the given interfaces on every node
    pub fn new<I, S>(namespace: impl Into<String>, name: impl Into<String>, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: MonitorSpec {
                interfaces: interfaces.into_iter().map(Into::into).collect(),
                ..Default::default()
            },
            status: MonitorStatus::default(),
        }
    }

    /// Restrict the monitor to nodes carrying all of the given labels
    pub fn with_node_selector<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.spec.node_selector = Some(
            labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_polling_interval(mut self, polling_interval: u64) -> Self {
        self.spec.polling_interval = polling_interval;
        self
    }

    pub fn with_status(mut self, status: MonitorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn key(&self) -> ObjectKey {
        self.metadata.key()
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn is_degraded(&self) -> bool {
        self.status.degraded
    }
}

/// Desired state of a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSpec {
    /// PF interface names, in declaration order
    pub interfaces: Vec<String>,

    /// `None` selects every node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<NodeSelector>,

    /// Polling interval handed to the relay agent
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u64,
}

impl Default for MonitorSpec {
    fn default() -> Self {
        Self {
            interfaces: Vec::new(),
            node_selector: None,
            polling_interval: default_polling_interval(),
        }
    }
}

fn default_polling_interval() -> u64 {
    1000
}

/// Observed state of a monitor
///
/// `error_message` is non-empty exactly when `degraded` is set; use
/// [`MonitorStatus::degraded`] and [`MonitorStatus::healthy`] to keep the pair
/// consistent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    #[serde(default)]
    pub degraded: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl MonitorStatus {
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            degraded: true,
            error_message: message.into(),
        }
    }

    pub fn healthy() -> Self {
        Self::default()
    }
}
