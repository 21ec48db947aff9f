//! Interface claim conflict detection

use crate::selectors_overlap;
use relay_types::{LacpMonitor, ObjectKey, MONITOR_KIND};
use std::collections::HashSet;
use thiserror::Error;

/// Interface claim that collides with another healthy monitor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "interfaces [{}] conflict with the ones from {} {}",
    .interfaces.join(" "),
    MONITOR_KIND,
    .other
)]
pub struct InterfaceConflict {
    /// Interfaces claimed by both monitors, in the subject's declaration order
    pub interfaces: Vec<String>,

    /// The monitor already holding the claim
    pub other: ObjectKey,
}

/// Find the first healthy monitor in `collection` whose claim collides with `subject`
///
/// The subject itself and degraded monitors are never conflict sources. Scanning
/// stops at the first collision; the collection order decides which one is
/// reported.
pub fn find_conflict<'a, I>(subject: &LacpMonitor, collection: I) -> Result<(), InterfaceConflict>
where
    I: IntoIterator<Item = &'a LacpMonitor>,
{
    let subject_key = subject.key();

    for other in collection {
        if other.key() == subject_key {
            continue;
        }

        if other.is_degraded() {
            continue;
        }

        if !selectors_overlap(
            subject.spec.node_selector.as_ref(),
            other.spec.node_selector.as_ref(),
        ) {
            continue;
        }

        let shared = shared_interfaces(&subject.spec.interfaces, &other.spec.interfaces);
        if !shared.is_empty() {
            return Err(InterfaceConflict {
                interfaces: shared,
                other: other.key(),
            });
        }
    }

    Ok(())
}

/// Interfaces present in both lists, compared exactly after trimming
pub fn shared_interfaces(a: &[String], b: &[String]) -> Vec<String> {
    let claimed: HashSet<&str> = b.iter().map(|i| i.trim()).collect();
    let mut reported = HashSet::new();

    a.iter()
        .map(|i| i.trim())
        .filter(|i| claimed.contains(i) && reported.insert(*i))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::MonitorStatus;

    #[test]
    fn test_empty_and_self_collections() {
        let a = LacpMonitor::new("ns", "a", ["eth0"]);
        assert!(find_conflict(&a, []).is_ok());
        assert!(find_conflict(&a, [&a]).is_ok());
    }

    #[test]
    fn test_shared_interface_same_zone_conflicts() {
        let a = LacpMonitor::new("ns", "A", ["eth0", "eth1"]).with_node_selector([("zone", "a")]);
        let b = LacpMonitor::new("ns", "B", ["eth1"]).with_node_selector([("zone", "a")]);

        let err = find_conflict(&a, [&b]).unwrap_err();
        assert_eq!(err.interfaces, vec!["eth1"]);
        assert_eq!(err.other, ObjectKey::new("ns", "B"));

        let message = err.to_string();
        assert!(message.contains("eth1"));
        assert!(message.contains("ns/B"));
    }

    #[test]
    fn test_disjoint_interfaces_with_wildcard() {
        let a = LacpMonitor::new("ns", "A", ["eth0"]);
        let b = LacpMonitor::new("ns", "B", ["eth1"]).with_node_selector([("zone", "a")]);
        assert!(find_conflict(&a, [&b]).is_ok());
    }

    #[test]
    fn test_wildcard_with_shared_interface_conflicts() {
        let a = LacpMonitor::new("ns", "A", ["eth0"]);
        let b = LacpMonitor::new("ns", "B", ["eth0"]).with_node_selector([("zone", "a")]);
        assert!(find_conflict(&a, [&b]).is_err());
        assert!(find_conflict(&b, [&a]).is_err());
    }

    #[test]
    fn test_disjoint_selectors_allow_shared_interface() {
        let a = LacpMonitor::new("ns", "A", ["eth0"]).with_node_selector([("zone", "a")]);
        let b = LacpMonitor::new("ns", "B", ["eth0"]).with_node_selector([("zone", "b")]);
        assert!(find_conflict(&a, [&b]).is_ok());
    }

    #[test]
    fn test_degraded_monitor_is_not_a_source() {
        let a = LacpMonitor::new("ns", "A", ["eth0"]);
        let b = LacpMonitor::new("ns", "B", ["eth0"])
            .with_status(MonitorStatus::degraded("conflict with A"));
        assert!(find_conflict(&a, [&b]).is_ok());
    }

    #[test]
    fn test_same_name_other_namespace_is_checked() {
        let a = LacpMonitor::new("ns-1", "A", ["eth0"]);
        let b = LacpMonitor::new("ns-2", "A", ["eth0"]);
        assert!(find_conflict(&a, [&b]).is_err());
    }

    #[test]
    fn test_first_violation_wins() {
        let a = LacpMonitor::new("ns", "A", ["eth0", "eth1"]);
        let b = LacpMonitor::new("ns", "B", ["eth1"]);
        let c = LacpMonitor::new("ns", "C", ["eth0"]);

        let err = find_conflict(&a, [&b, &c]).unwrap_err();
        assert_eq!(err.other.name, "B");

        let err = find_conflict(&a, [&c, &b]).unwrap_err();
        assert_eq!(err.other.name, "C");
    }

    #[test]
    fn test_shared_interfaces_trims_and_dedups() {
        let a: Vec<String> = vec![" eth0".into(), "eth1".into(), "eth0".into()];
        let b: Vec<String> = vec!["eth0 ".into(), "ETH1".into()];
        assert_eq!(shared_interfaces(&a, &b), vec!["eth0"]);
    }
}
