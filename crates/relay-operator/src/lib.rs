//! Relay Operator - Admission, reconciliation and controller runtime
//!
//! Keeps the `PFLACPMonitor` resources of a cluster consistent: at most one
//! healthy monitor claims an interface on any node, and every healthy monitor
//! has exactly one relay workload matching its declaration.
//!
//! ## Architecture
//!
//! ```text
//! write request -> AdmissionGate -> MonitorStore
//!                                       |
//!                               WatchEvent stream
//!                                       v
//!             Controller (WorkQueue, workers, backoff, resync)
//!                                       v
//!                 Reconciler -> WorkloadSynchronizer -> WorkloadStore
//! ```
//!
//! Stores are reached only through the [`MonitorStore`] and
//! [`WorkloadStore`] traits; [`InMemoryStore`] implements both for
//! development and tests.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod admission;
pub mod config;
pub mod controller;
pub mod desired;
pub mod error;
pub mod image;
pub mod operator;
pub mod queue;
pub mod reconciler;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use admission::{admit, AdmissionGate, Warnings};
pub use config::{AdmissionConfig, ControllerConfig, LoggingConfig, OperatorConfig};
pub use controller::{owning_monitor, Controller};
pub use desired::{desired_workload, workload_key, workload_name};
pub use error::{OperatorError, Result};
pub use image::{EnvImageSource, ImageSource, StaticImageSource, IMAGE_ENV};
pub use operator::Operator;
pub use queue::{RequeueBackoff, WorkQueue};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use store::{
    InMemoryStore, MonitorStore, StoreError, StoreResult, WatchEvent, WorkloadStore, WriteStats,
};
pub use sync::{SyncOutcome, WorkloadSynchronizer};
