//! Managed relay workloads
//!
//! One workload per healthy monitor runs the relay agent with host networking
//! on every node the monitor selects.

use crate::{NodeSelector, ObjectKey, ObjectMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daemon-set style workload owned by a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedWorkload {
    pub metadata: ObjectMeta,
    pub spec: WorkloadSpec,
}

impl ManagedWorkload {
    pub fn key(&self) -> ObjectKey {
        self.metadata.key()
    }
}

/// Mutable part of a workload, compared field-for-field for drift detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Labels identifying the pods of this workload
    pub selector: BTreeMap<String, String>,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplate {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub host_network: bool,

    #[serde(default, rename = "hostPID")]
    pub host_pid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<NodeSelector>,

    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

impl ContainerSpec {
    /// Value of an environment variable, if set
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_lookup() {
        let container = ContainerSpec {
            name: "relay".into(),
            image: "relay:latest".into(),
            privileged: true,
            env: vec![EnvVar::new("A", "1"), EnvVar::new("B", "2")],
        };
        assert_eq!(container.env_value("B"), Some("2"));
        assert_eq!(container.env_value("C"), None);
    }

    #[test]
    fn test_pod_template_field_names() {
        let template = PodTemplate {
            host_network: true,
            host_pid: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(value["hostNetwork"], true);
        assert_eq!(value["hostPID"], true);
    }
}
