//! Node selector overlap

use relay_types::NodeSelector;

/// Whether two monitors may be scheduled onto a common node
///
/// An absent selector matches every node and overlaps with everything. Two
/// concrete selectors overlap when they share at least one key with an
/// identical value; selectors without such a pair are treated as disjoint even
/// though an unlabeled cluster could still place both on one node.
pub fn selectors_overlap(a: Option<&NodeSelector>, b: Option<&NodeSelector>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.iter().any(|(key, value)| b.get(key) == Some(value)),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(pairs: &[(&str, &str)]) -> NodeSelector {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_wildcard_overlaps_everything() {
        let zone_a = selector(&[("zone", "a")]);
        assert!(selectors_overlap(None, None));
        assert!(selectors_overlap(None, Some(&zone_a)));
        assert!(selectors_overlap(Some(&zone_a), None));
    }

    #[test]
    fn test_shared_pair_overlaps() {
        let a = selector(&[("zone", "a"), ("rack", "1")]);
        let b = selector(&[("zone", "a"), ("rack", "2")]);
        assert!(selectors_overlap(Some(&a), Some(&b)));
    }

    #[test]
    fn test_same_key_different_value_is_disjoint() {
        let a = selector(&[("zone", "a")]);
        let b = selector(&[("zone", "b")]);
        assert!(!selectors_overlap(Some(&a), Some(&b)));
    }

    #[test]
    fn test_unrelated_keys_are_disjoint() {
        let a = selector(&[("zone", "a")]);
        let b = selector(&[("rack", "1")]);
        assert!(!selectors_overlap(Some(&a), Some(&b)));
    }

    #[test]
    fn test_empty_concrete_selector_overlaps_nothing() {
        let empty = NodeSelector::new();
        let a = selector(&[("zone", "a")]);
        assert!(!selectors_overlap(Some(&empty), Some(&a)));
        assert!(selectors_overlap(Some(&empty), None));
    }
}
