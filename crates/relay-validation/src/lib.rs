//! # Relay Validation
//!
//! Pure checks over monitor declarations, shared by the admission gate and the
//! reconciler.
//!
//! - [`validate_interfaces`]: structural check of a single monitor's interface list
//! - [`selectors_overlap`]: conservative test of whether two monitors may share a node
//! - [`find_conflict`]: first healthy monitor whose claim collides with the subject
//!
//! ## Example
//!
//! ```rust
//! use relay_types::LacpMonitor;
//! use relay_validation::find_conflict;
//!
//! let a = LacpMonitor::new("ns", "a", ["eth0", "eth1"]).with_node_selector([("zone", "a")]);
//! let b = LacpMonitor::new("ns", "b", ["eth1"]).with_node_selector([("zone", "a")]);
//!
//! let conflict = find_conflict(&a, [&b]).unwrap_err();
//! assert_eq!(conflict.interfaces, vec!["eth1"]);
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod conflict;
pub mod interfaces;
pub mod selector;

pub use conflict::{find_conflict, shared_interfaces, InterfaceConflict};
pub use interfaces::{validate_interfaces, ValidationError, INTERFACES_FIELD};
pub use selector::selectors_overlap;
